//! Fetch → interpolate → render for one symbol

use crate::api::{fetch_options_data_at, MarketDataProvider};
use crate::config::RenderConfig;
use crate::error::Result;
use crate::models::VolatilitySurface;
use crate::utils::render_volatility_surface;
use chrono::NaiveDateTime;
use std::io::Write;
use tracing::info;

pub const NO_DATA_MESSAGE: &str = "No data found. Please check the symbol and try again.";

/// Run the whole pipeline for `symbol` as of `now`.
///
/// User-facing messages go to `out`. Returns `Ok(None)` without touching the
/// renderer when no quote survived filtering.
pub async fn visualize_symbol<P: MarketDataProvider, W: Write>(
    provider: &P,
    symbol: &str,
    now: NaiveDateTime,
    render: &RenderConfig,
    out: &mut W,
) -> Result<Option<VolatilitySurface>> {
    let quotes = fetch_options_data_at(provider, symbol, now, out).await;

    if quotes.is_empty() {
        writeln!(out, "{}", NO_DATA_MESSAGE)?;
        return Ok(None);
    }

    info!("Collected {} implied volatility points for {}", quotes.len(), symbol);
    render_volatility_surface(symbol, &quotes, render, out).map(Some)
}
