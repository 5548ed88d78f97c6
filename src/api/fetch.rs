use super::MarketDataProvider;
use crate::models::{OptionChain, OptionQuotes};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::io::Write;
use tracing::{info, trace, warn};

/// Only the nearest expirations are requested
pub const MAX_EXPIRATIONS: usize = 15;

const SECONDS_PER_DAY: i64 = 86_400;
const DAYS_PER_MONTH: f64 = 30.0;

/// Implied volatility as a percentage, or `None` if the value is undefined or above 100%.
pub fn scaled_volatility(implied_volatility: Option<f64>) -> Option<f64> {
    match implied_volatility {
        Some(iv) if !iv.is_nan() && iv <= 1.0 => Some(iv * 100.0),
        _ => None,
    }
}

/// Whole months between `now` and the start of the expiration date.
///
/// Days are floored, then `days / 30` is rounded half-to-even.
pub fn months_to_expiration(expiration: NaiveDate, now: NaiveDateTime) -> i64 {
    let expires_at = expiration.and_time(NaiveTime::MIN);
    let days = (expires_at - now).num_seconds().div_euclid(SECONDS_PER_DAY);
    (days as f64 / DAYS_PER_MONTH).round_ties_even() as i64
}

/// Fetch and filter quotes for `symbol` using the local wall clock, reporting to stdout
pub async fn fetch_options_data<P: MarketDataProvider>(provider: &P, symbol: &str) -> OptionQuotes {
    let mut stdout = std::io::stdout();
    fetch_options_data_at(provider, symbol, Local::now().naive_local(), &mut stdout).await
}

/// Fetch and filter quotes for `symbol` as of `now`.
///
/// Provider failures never escape: a failed expiration list yields no quotes,
/// a failed chain skips that date only. Progress and failures are reported to `out`.
pub async fn fetch_options_data_at<P: MarketDataProvider, W: Write>(
    provider: &P,
    symbol: &str,
    now: NaiveDateTime,
    out: &mut W,
) -> OptionQuotes {
    let mut quotes = OptionQuotes::new();

    let expirations = match provider.expiration_dates(symbol).await {
        Ok(dates) => {
            report(out, format_args!("Found {} expiration dates for {}.", dates.len(), symbol));
            dates
        }
        Err(e) => {
            report(out, format_args!("Error fetching data for {}: {}", symbol, e));
            return quotes;
        }
    };

    for &expiration in expirations.iter().take(MAX_EXPIRATIONS) {
        let chain = match provider.option_chain(symbol, expiration).await {
            Ok(chain) => chain,
            Err(e) => {
                report(out, format_args!("Error fetching options for {}: {}", expiration, e));
                continue;
            }
        };

        let months = months_to_expiration(expiration, now);
        let kept = collect_chain(&chain, months, &mut quotes);
        info!(
            "{} {}: kept {} of {} rows ({} months out)",
            symbol,
            expiration,
            kept,
            chain.len(),
            months
        );
    }

    quotes
}

fn report<W: Write>(out: &mut W, line: fmt::Arguments<'_>) {
    if let Err(e) = writeln!(out, "{}", line) {
        warn!("Failed to write progress message: {}", e);
    }
}

fn collect_chain(chain: &OptionChain, months: i64, quotes: &mut OptionQuotes) -> usize {
    let mut kept = 0;
    for (option_type, row) in chain.rows() {
        match scaled_volatility(row.implied_volatility) {
            Some(volatility) => {
                quotes.push(row.strike, months, volatility);
                kept += 1;
            }
            None => trace!(
                "Dropping {} {} strike {}: implied volatility {:?}",
                chain.expiration,
                option_type,
                row.strike,
                row.implied_volatility
            ),
        }
    }
    kept
}
