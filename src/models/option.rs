use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// One row of a provider option chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainRow {
    pub strike: f64,
    /// Implied volatility as a fraction; `None` when the provider left it out
    pub implied_volatility: Option<f64>,
}

impl ChainRow {
    pub fn new(strike: f64, implied_volatility: Option<f64>) -> Self {
        Self {
            strike,
            implied_volatility,
        }
    }
}

/// Calls and puts for a single expiration date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChain {
    pub expiration: NaiveDate,
    pub calls: Vec<ChainRow>,
    pub puts: Vec<ChainRow>,
}

impl OptionChain {
    pub fn new(expiration: NaiveDate) -> Self {
        Self {
            expiration,
            calls: Vec::new(),
            puts: Vec::new(),
        }
    }

    pub fn add(&mut self, option_type: OptionType, row: ChainRow) {
        match option_type {
            OptionType::Call => self.calls.push(row),
            OptionType::Put => self.puts.push(row),
        }
    }

    /// Calls first, then puts, each in provider order
    pub fn rows(&self) -> impl Iterator<Item = (OptionType, &ChainRow)> {
        self.calls
            .iter()
            .map(|r| (OptionType::Call, r))
            .chain(self.puts.iter().map(|r| (OptionType::Put, r)))
    }

    pub fn len(&self) -> usize {
        self.calls.len() + self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Observed (strike, months, implied volatility %) triples as three parallel columns.
///
/// The columns always have the same length; `push` is the only way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionQuotes {
    strikes: Vec<f64>,
    months: Vec<i64>,
    volatilities: Vec<f64>,
}

impl OptionQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, strike: f64, months: i64, volatility_pct: f64) {
        self.strikes.push(strike);
        self.months.push(months);
        self.volatilities.push(volatility_pct);
    }

    pub fn strikes(&self) -> &[f64] {
        &self.strikes
    }

    pub fn months(&self) -> &[i64] {
        &self.months
    }

    /// Implied volatilities in percent
    pub fn volatilities(&self) -> &[f64] {
        &self.volatilities
    }

    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, i64, f64)> + '_ {
        self.strikes
            .iter()
            .zip(&self.months)
            .zip(&self.volatilities)
            .map(|((&s, &m), &v)| (s, m, v))
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<i64>, Vec<f64>) {
        (self.strikes, self.months, self.volatilities)
    }
}
