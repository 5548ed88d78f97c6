//! Interactive implied volatility surface for a single ticker
//!
//! 1. Ask for a ticker symbol
//! 2. Fetch its option chains from Yahoo Finance
//! 3. Interpolate implied volatility onto a (time × strike) grid
//! 4. Show the surface

use chrono::Local;
use optiviz::api::YahooClient;
use optiviz::app::visualize_symbol;
use optiviz::config::Config;
use optiviz::error::Result;
use optiviz::utils::read_symbol;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    config.init_logging()?;

    let stdin = std::io::stdin();
    let symbol = read_symbol(stdin.lock(), std::io::stdout())?;
    info!("Using ticker symbol: {}", symbol);

    let client = YahooClient::new(config.yahoo.clone())?;
    let mut stdout = std::io::stdout();
    visualize_symbol(
        &client,
        &symbol,
        Local::now().naive_local(),
        &config.render,
        &mut stdout,
    )
    .await?;

    Ok(())
}
