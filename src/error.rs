use thiserror::Error;

/// Custom error types for the optiviz library
#[derive(Error, Debug)]
pub enum OptivizError {

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Interpolation error: {0}")]
    Interpolation(String),

    #[error("Plot error: {0}")]
    Plot(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("DataFrame error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, OptivizError>;
