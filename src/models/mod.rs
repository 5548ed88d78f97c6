//! Data models for option chains and volatility surfaces
//!
//! This module contains data structures for provider option chains, the
//! filtered quote columns, and the interpolated volatility surface.

mod option;
pub mod volatility;

pub use option::*;
pub use volatility::VolatilitySurface;
