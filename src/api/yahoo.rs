//! Yahoo Finance options client
//!
//! Uses the unofficial v7 options endpoint. Yahoo wants a session cookie and
//! a matching "crumb" token on API calls; the handshake runs once, lazily, and
//! a failed handshake just means requests go out without a crumb.

use super::MarketDataProvider;
use crate::config::YahooConfig;
use crate::error::{OptivizError, Result};
use crate::models::{ChainRow, OptionChain, OptionType};
use chrono::{DateTime, NaiveDate, NaiveTime};
use once_cell::sync::{Lazy, OnceCell};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

static YAHOO_HEADERS: Lazy<HeaderMap> = Lazy::new(|| {
    let mut h = HeaderMap::new();
    h.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    h.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    h
});

pub struct YahooClient {
    client: reqwest::Client,
    config: YahooConfig,
    crumb: OnceCell<Option<String>>,
}

impl YahooClient {
    pub fn new(config: YahooConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(YAHOO_HEADERS.clone())
            .cookie_store(true)
            .build()
            .map_err(|e| OptivizError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            crumb: OnceCell::new(),
        })
    }

    /// Crumb token for this session, fetched on first use
    async fn crumb(&self) -> Option<String> {
        if let Some(crumb) = self.crumb.get() {
            return crumb.clone();
        }

        let crumb = match self.fetch_crumb().await {
            Ok(crumb) => Some(crumb),
            Err(e) => {
                warn!("Yahoo crumb handshake failed, continuing without it: {}", e);
                None
            }
        };
        let _ = self.crumb.set(crumb.clone());
        crumb
    }

    async fn fetch_crumb(&self) -> Result<String> {
        debug!("Collecting session cookie from {}", self.config.cookie_url);
        // fc.yahoo.com answers 404 but still sets the cookie
        self.client
            .get(&self.config.cookie_url)
            .send()
            .await
            .map_err(|e| OptivizError::Network(format!("Cookie request failed: {}", e)))?;

        let url = format!("{}/v1/test/getcrumb", self.config.base_url);
        debug!("Requesting crumb from {}", url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OptivizError::Network(format!("Crumb request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(OptivizError::Provider(format!(
                "Crumb request failed with status {}",
                resp.status()
            )));
        }

        let crumb = resp
            .text()
            .await
            .map_err(|e| OptivizError::Network(format!("Failed to read crumb: {}", e)))?;
        let crumb = crumb.trim();
        if crumb.is_empty() || crumb.contains(char::is_whitespace) {
            return Err(OptivizError::ParseError(format!("Unexpected crumb '{}'", crumb)));
        }

        Ok(crumb.to_string())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let mut req = self.client.get(url).query(query);
        if let Some(crumb) = self.crumb().await {
            req = req.query(&[("crumb", crumb)]);
        }
        debug!("GET {} {:?}", url, query);

        let resp = req
            .send()
            .await
            .map_err(|e| OptivizError::Network(format!("Request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(OptivizError::Provider(format!(
                "Request failed with status {}: {}",
                status, error_text
            )));
        }

        let resp_text = resp
            .text()
            .await
            .map_err(|e| OptivizError::Network(format!("Failed to get response text: {}", e)))?;

        decode(&resp_text)
    }

    fn options_url(&self, symbol: &str) -> String {
        format!("{}/v7/finance/options/{}", self.config.base_url, symbol)
    }
}

impl MarketDataProvider for YahooClient {
    async fn expiration_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>> {
        let resp: OptionsResponse = self.get_json(&self.options_url(symbol), &[]).await?;
        parse_expirations(resp)
    }

    async fn option_chain(&self, symbol: &str, expiration: NaiveDate) -> Result<OptionChain> {
        let query = [("date", expiration_timestamp(expiration).to_string())];
        let resp: OptionsResponse = self.get_json(&self.options_url(symbol), &query).await?;
        parse_chain(resp, expiration)
    }
}

/// Yahoo keys expirations by unix seconds at 00:00 UTC
fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    Ok(serde_json::from_str(body)?)
}

fn expiration_timestamp(expiration: NaiveDate) -> i64 {
    expiration.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn parse_expirations(resp: OptionsResponse) -> Result<Vec<NaiveDate>> {
    let envelope = resp.option_chain.into_checked()?;

    // an unknown symbol comes back as an empty result list
    let Some(data) = envelope.result.into_iter().next() else {
        return Ok(Vec::new());
    };

    data.expiration_dates
        .into_iter()
        .map(|ts| {
            DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| OptivizError::ParseError(format!("Invalid expiration timestamp {}", ts)))
        })
        .collect()
}

fn parse_chain(resp: OptionsResponse, expiration: NaiveDate) -> Result<OptionChain> {
    let envelope = resp.option_chain.into_checked()?;
    let data = envelope.result.into_iter().next().ok_or_else(|| {
        OptivizError::Provider(format!("No option chain returned for {}", expiration))
    })?;

    let mut chain = OptionChain::new(expiration);
    if let Some(block) = data.options.into_iter().next() {
        for (option_type, rows) in [(OptionType::Call, block.calls), (OptionType::Put, block.puts)] {
            for row in rows {
                // a row without a strike has no place on the surface
                if let Some(strike) = row.strike {
                    chain.add(option_type, ChainRow::new(strike, row.implied_volatility));
                }
            }
        }
    }

    Ok(chain)
}

#[derive(Debug, Deserialize)]
struct OptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: OptionChainEnvelope,
}

#[derive(Debug, Deserialize)]
struct OptionChainEnvelope {
    #[serde(default)]
    result: Vec<OptionChainData>,
    error: Option<serde_json::Value>,
}

impl OptionChainEnvelope {
    fn into_checked(self) -> Result<Self> {
        match &self.error {
            Some(err) if !err.is_null() => {
                let description = err
                    .get("description")
                    .and_then(|d| d.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| err.to_string());
                Err(OptivizError::Provider(description))
            }
            _ => Ok(self),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OptionChainData {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<OptionsBlock>,
}

#[derive(Debug, Deserialize)]
struct OptionsBlock {
    #[serde(default)]
    calls: Vec<ContractData>,
    #[serde(default)]
    puts: Vec<ContractData>,
}

#[derive(Debug, Deserialize)]
struct ContractData {
    strike: Option<f64>,
    #[serde(rename = "impliedVolatility")]
    implied_volatility: Option<f64>,
}
