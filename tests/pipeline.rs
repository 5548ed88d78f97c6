//! End-to-end runs of the fetch → interpolate → render pipeline against an
//! in-memory provider. Nothing here opens a browser.

use std::cell::Cell;
use std::collections::HashMap;

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use optiviz::api::{fetch_options_data_at, MarketDataProvider};
use optiviz::app::visualize_symbol;
use optiviz::config::RenderConfig;
use optiviz::error::{OptivizError, Result};
use optiviz::models::{ChainRow, OptionChain, OptionType};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
}

fn now() -> NaiveDateTime {
    today().and_time(NaiveTime::MIN)
}

fn headless() -> RenderConfig {
    RenderConfig {
        show_plot: false,
        html_output: None,
        snapshot_output: None,
    }
}

#[derive(Default)]
struct MemoryProvider {
    chains: HashMap<String, Vec<OptionChain>>,
    chain_calls: Cell<usize>,
}

impl MemoryProvider {
    fn with_symbol(mut self, symbol: &str, chains: Vec<OptionChain>) -> Self {
        self.chains.insert(symbol.to_string(), chains);
        self
    }
}

impl MarketDataProvider for MemoryProvider {
    async fn expiration_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>> {
        Ok(self
            .chains
            .get(symbol)
            .map(|chains| chains.iter().map(|c| c.expiration).collect())
            .unwrap_or_default())
    }

    async fn option_chain(&self, symbol: &str, expiration: NaiveDate) -> Result<OptionChain> {
        self.chain_calls.set(self.chain_calls.get() + 1);
        self.chains
            .get(symbol)
            .and_then(|chains| chains.iter().find(|c| c.expiration == expiration))
            .cloned()
            .ok_or_else(|| OptivizError::Provider(format!("no chain for {}", expiration)))
    }
}

/// 3 valid calls + 2 valid puts, plus rows the filter must drop
fn spy_chain(expiration: NaiveDate, base_vol: f64) -> OptionChain {
    let mut chain = OptionChain::new(expiration);
    for (i, strike) in [480.0, 560.0, 640.0].into_iter().enumerate() {
        chain.add(OptionType::Call, ChainRow::new(strike, Some(base_vol + 0.02 * i as f64)));
    }
    chain.add(OptionType::Call, ChainRow::new(700.0, Some(2.4)));
    chain.add(OptionType::Call, ChainRow::new(710.0, None));
    for (i, strike) in [520.0, 720.0].into_iter().enumerate() {
        chain.add(OptionType::Put, ChainRow::new(strike, Some(base_vol + 0.05 * i as f64)));
    }
    chain.add(OptionType::Put, ChainRow::new(730.0, Some(f64::NAN)));
    chain
}

fn spy_provider() -> MemoryProvider {
    MemoryProvider::default().with_symbol(
        "SPY",
        vec![
            spy_chain(today() + Duration::days(30), 0.18),
            spy_chain(today() + Duration::days(120), 0.22),
        ],
    )
}

#[tokio::test]
async fn spy_two_expirations_yield_ten_triples() {
    let provider = spy_provider();

    let quotes = fetch_options_data_at(&provider, "SPY", now(), &mut std::io::sink()).await;

    assert_eq!(quotes.len(), 10);
    assert_eq!(quotes.months(), &[1, 1, 1, 1, 1, 4, 4, 4, 4, 4]);
    assert_eq!(
        &quotes.strikes()[..5],
        &[480.0, 560.0, 640.0, 520.0, 720.0]
    );
    assert!(quotes.volatilities().iter().all(|&v| (0.0..=100.0).contains(&v)));
    assert_relative_eq!(quotes.volatilities()[0], 18.0, epsilon = 1e-9);
    assert_relative_eq!(quotes.volatilities()[9], 27.0, epsilon = 1e-9);
}

#[tokio::test]
async fn spy_renders_a_thirty_by_ten_grid() {
    let provider = spy_provider();

    let mut out = Vec::new();
    let surface = visualize_symbol(&provider, "SPY", now(), &headless(), &mut out)
        .await
        .unwrap()
        .expect("SPY has data");

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Found 2 expiration dates for SPY.\n\
         The chart goes out to approximately 4.0 months (16.0 weeks) in the future.\n"
    );
    assert_eq!(surface.volatilities.dim(), (30, 10));
    assert_eq!(surface.strike_axis.len(), 30);
    assert_relative_eq!(surface.strike_axis[0], 450.0);
    assert_relative_eq!(surface.strike_axis[29], 750.0);
    assert_eq!(
        surface.time_axis.to_vec(),
        vec![1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0]
    );

    // observed strikes span 480..720, so the extreme strike rows have no support
    assert!(surface.volatilities.row(0).iter().all(|v| v.is_nan()));
    assert!(surface.volatilities.row(29).iter().all(|v| v.is_nan()));
    assert!(surface.supported_cells() > 0);
    for v in surface.volatilities.iter().filter(|v| v.is_finite()) {
        assert!(
            *v >= 18.0 - 1e-9 && *v <= 27.0 + 1e-9,
            "interpolated value {} out of observed range",
            v
        );
    }
}

#[tokio::test]
async fn unknown_symbol_never_reaches_the_renderer() {
    let provider = spy_provider();

    let quotes = fetch_options_data_at(&provider, "ZZZZ", now(), &mut std::io::sink()).await;
    assert!(quotes.is_empty());

    // the renderer would fail on empty input; Ok(None) proves it was skipped
    let mut out = Vec::new();
    let outcome = visualize_symbol(&provider, "ZZZZ", now(), &headless(), &mut out)
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Found 0 expiration dates for ZZZZ.\n\
         No data found. Please check the symbol and try again.\n"
    );
    assert_eq!(provider.chain_calls.get(), 0);
}

#[tokio::test]
async fn all_rows_filtered_out_means_no_data() {
    let mut chain = OptionChain::new(today() + Duration::days(45));
    chain.add(OptionType::Call, ChainRow::new(500.0, Some(1.01)));
    chain.add(OptionType::Put, ChainRow::new(500.0, None));
    let provider = MemoryProvider::default().with_symbol("JUNK", vec![chain]);

    let mut out = Vec::new();
    let outcome = visualize_symbol(&provider, "JUNK", now(), &headless(), &mut out)
        .await
        .unwrap();

    assert!(outcome.is_none());
    assert_eq!(provider.chain_calls.get(), 1);
    assert!(String::from_utf8(out).unwrap().ends_with("No data found. Please check the symbol and try again.\n"));
}

#[tokio::test]
async fn html_output_is_written() {
    let provider = spy_provider();
    let path = std::env::temp_dir().join(format!("optiviz_pipeline_{}.html", std::process::id()));
    let render = RenderConfig {
        html_output: Some(path.clone()),
        ..headless()
    };

    visualize_symbol(&provider, "SPY", now(), &render, &mut std::io::sink())
        .await
        .unwrap();

    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("Implied Volatility Surface for SPY Options"));
    let _ = std::fs::remove_file(&path);
}
