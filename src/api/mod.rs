//! Market data access
//!
//! The pipeline only needs two calls from a provider: the list of expiration
//! dates for a symbol and the option chain for one of those dates.
//! `YahooClient` is the production implementation.

mod fetch;
mod yahoo;

pub use fetch::{
    fetch_options_data, fetch_options_data_at, months_to_expiration, scaled_volatility,
    MAX_EXPIRATIONS,
};
pub use yahoo::YahooClient;

use crate::error::Result;
use crate::models::OptionChain;
use chrono::NaiveDate;

/// Source of option chains.
///
/// Calls are awaited one at a time; implementations do not need to be `Send`.
#[allow(async_fn_in_trait)]
pub trait MarketDataProvider {
    /// Available expiration dates for `symbol`, in provider order
    async fn expiration_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>>;

    /// Calls and puts for `symbol` expiring on `expiration`
    async fn option_chain(&self, symbol: &str, expiration: NaiveDate) -> Result<OptionChain>;
}
