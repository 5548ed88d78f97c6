mod plotting;
pub mod polars_utils;
mod prompt;

pub use plotting::*;
pub use prompt::*;
