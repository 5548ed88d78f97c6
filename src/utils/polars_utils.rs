use crate::error::{OptivizError, Result};
use crate::models::OptionQuotes;
use polars::prelude::*;

pub const STRIKE_COLUMN: &str = "strike";
pub const MONTHS_COLUMN: &str = "months";
pub const VOLATILITY_COLUMN: &str = "implied_volatility";

/// Convert collected quotes to a Polars DataFrame, one row per quote
pub fn quotes_to_dataframe(quotes: &OptionQuotes) -> Result<DataFrame> {
    if quotes.is_empty() {
        return Err(OptivizError::Other("Cannot create DataFrame from empty quotes".to_string()));
    }

    let df = DataFrame::new(vec![
        Series::new(STRIKE_COLUMN, quotes.strikes()),
        Series::new(MONTHS_COLUMN, quotes.months()),
        Series::new(VOLATILITY_COLUMN, quotes.volatilities()),
    ])?;

    Ok(df)
}

/// Convert a quote DataFrame back into parallel columns
pub fn dataframe_to_quotes(df: &DataFrame) -> Result<OptionQuotes> {
    let strikes = df.column(STRIKE_COLUMN)?.f64()?;
    let months = df.column(MONTHS_COLUMN)?.i64()?;
    let vols = df.column(VOLATILITY_COLUMN)?.f64()?;

    let mut quotes = OptionQuotes::new();
    for ((strike, month), vol) in strikes.into_iter().zip(months).zip(vols) {
        // nulls never come out of quotes_to_dataframe; skip them if a caller built one by hand
        if let (Some(strike), Some(month), Some(vol)) = (strike, month, vol) {
            quotes.push(strike, month, vol);
        }
    }

    Ok(quotes)
}

/// Smallest and largest months-to-expiration in the table
pub fn months_range(df: &DataFrame) -> Result<(i64, i64)> {
    let months = df.column(MONTHS_COLUMN)?.i64()?;
    match (months.min(), months.max()) {
        (Some(lo), Some(hi)) => Ok((lo, hi)),
        _ => Err(OptivizError::Other("No months-to-expiration values in DataFrame".to_string())),
    }
}
