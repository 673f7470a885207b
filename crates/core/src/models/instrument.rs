use serde::{Deserialize, Serialize};

/// The category of a market-data series.
/// Determines which provider is asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    /// Fiat currencies (USD, GBP, ...): uses Frankfurter
    Currency,
    /// Individual stocks: uses Yahoo Finance
    Stock,
    /// Exchange traded funds: uses Yahoo Finance
    Etf,
}

impl InstrumentKind {
    pub fn for_security(is_etf: bool) -> Self {
        if is_etf {
            InstrumentKind::Etf
        } else {
            InstrumentKind::Stock
        }
    }
}

impl std::fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstrumentKind::Currency => write!(f, "Currency"),
            InstrumentKind::Stock => write!(f, "Stock"),
            InstrumentKind::Etf => write!(f, "ETF"),
        }
    }
}

/// A tradeable listing resolved from an identifier such as an ISIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Provider-specific symbol used for history queries (e.g. "IWDA.AS")
    pub symbol: String,
    /// Human-readable name (e.g. "iShares Core MSCI World UCITS")
    pub name: String,
    /// Currency the listing trades in, when the provider reports one
    /// (e.g. "USD", or "GBp" for pence-quoted London listings).
    #[serde(default)]
    pub currency: Option<String>,
}

/// A daily EUR price series aligned to a `DateGrid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Which market-data series a cache entry holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketKey {
    /// Prices of an instrument identified by ISIN.
    Instrument { isin: String, is_etf: bool },
    /// Currency-to-EUR multipliers for a currency code.
    Currency(String),
}

impl MarketKey {
    pub fn instrument(isin: impl Into<String>, is_etf: bool) -> Self {
        MarketKey::Instrument {
            isin: isin.into(),
            is_etf,
        }
    }

    pub fn currency(code: impl Into<String>) -> Self {
        MarketKey::Currency(code.into().to_uppercase())
    }
}
