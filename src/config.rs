use crate::error::{OptivizError, Result};
use dotenv::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Configuration for the Yahoo Finance options API
#[derive(Debug, Clone, Deserialize)]
pub struct YahooConfig {
    /// Host serving the options and crumb endpoints
    pub base_url: String,
    /// Page visited once to obtain the session cookie
    pub cookie_url: String,
    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Where the rendered surface goes
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Open the interactive figure in the browser
    pub show_plot: bool,
    /// Standalone HTML copy of the figure
    pub html_output: Option<PathBuf>,
    /// Static PNG heat map of the interpolated grid
    pub snapshot_output: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            show_plot: true,
            html_output: None,
            snapshot_output: None,
        }
    }
}

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Market data provider configuration
    pub yahoo: YahooConfig,
    /// Output configuration
    pub render: RenderConfig,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            yahoo: YahooConfig::default(),
            render: RenderConfig::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let base_url = lookup("YAHOO_BASE_URL").unwrap_or(defaults.yahoo.base_url);
        let cookie_url = lookup("YAHOO_COOKIE_URL").unwrap_or(defaults.yahoo.cookie_url);
        let user_agent = lookup("YAHOO_USER_AGENT").unwrap_or(defaults.yahoo.user_agent);
        let log_level = lookup("LOG_LEVEL").unwrap_or(defaults.log_level);

        for (key, url) in [("YAHOO_BASE_URL", &base_url), ("YAHOO_COOKIE_URL", &cookie_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(OptivizError::ConfigError(format!(
                    "{} must be an http(s) URL, got '{}'",
                    key, url
                )));
            }
        }

        let show_plot = lookup("OPTIVIZ_SHOW")
            .map(|v| parse_flag(&v))
            .unwrap_or(defaults.render.show_plot);
        let html_output = lookup("OPTIVIZ_HTML_OUTPUT")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let snapshot_output = lookup("OPTIVIZ_SNAPSHOT_OUTPUT")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Config {
            yahoo: YahooConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                cookie_url,
                user_agent,
            },
            render: RenderConfig {
                show_plot,
                html_output,
                snapshot_output,
            },
            log_level,
        })
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        // stdout carries the user-facing text
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| OptivizError::ConfigError(format!("Failed to init logging: {}", e)))?;

        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
