//! # optiviz
//!
//! Fetches option chains for a ticker, keeps the implied volatilities that look
//! sane, interpolates them onto a regular (time × strike) grid and renders the
//! result as an interactive 3D surface.
//!
//! ## Features
//!
//! - Yahoo Finance options client behind a small `MarketDataProvider` trait
//! - Filtering of undefined and >100% implied volatilities
//! - Delaunay-based linear interpolation onto a fixed 30 × 10 grid
//! - Plotly surface with contour overlay, optional HTML and PNG output
//! - Environment-based configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use optiviz::api::{fetch_options_data, YahooClient};
//! use optiviz::config::Config;
//! use optiviz::utils::render_volatility_surface;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> optiviz::error::Result<()> {
//!     let config = Config::from_env()?;
//!     config.init_logging()?;
//!
//!     let client = YahooClient::new(config.yahoo.clone())?;
//!     let quotes = fetch_options_data(&client, "SPY").await;
//!
//!     if !quotes.is_empty() {
//!         render_volatility_surface("SPY", &quotes, &config.render, &mut std::io::stdout())?;
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use api::{MarketDataProvider, YahooClient};
pub use config::Config;
pub use error::{OptivizError, Result};
