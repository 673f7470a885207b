use crate::models::date_grid::DateGrid;
use crate::models::instrument::{InstrumentSeries, MarketKey};
use crate::models::price::MarketDataCache;

/// Synchronous price lookup used while rebuilding the ledger.
///
/// Absence is a normal outcome: the ledger falls back to cost basis.
pub trait PriceSeriesProvider {
    fn lookup(&self, isin: &str, grid: &DateGrid, is_etf: bool) -> Option<InstrumentSeries>;
}

/// Synchronous currency → EUR multipliers, one per grid day.
///
/// Never asked for an empty currency code or "EUR".
pub trait CurrencyConverter {
    fn modifier(&self, currency: &str, grid: &DateGrid) -> Option<Vec<f64>>;
}

impl PriceSeriesProvider for MarketDataCache {
    fn lookup(&self, isin: &str, grid: &DateGrid, is_etf: bool) -> Option<InstrumentSeries> {
        self.get(&MarketKey::instrument(isin, is_etf), grid).cloned()
    }
}

impl CurrencyConverter for MarketDataCache {
    fn modifier(&self, currency: &str, grid: &DateGrid) -> Option<Vec<f64>> {
        self.get(&MarketKey::currency(currency), grid)
            .map(|series| series.values.clone())
    }
}

/// Lookup that never has data; every trade is valued at cost basis.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMarketData;

impl PriceSeriesProvider for NoMarketData {
    fn lookup(&self, _isin: &str, _grid: &DateGrid, _is_etf: bool) -> Option<InstrumentSeries> {
        None
    }
}

impl CurrencyConverter for NoMarketData {
    fn modifier(&self, _currency: &str, _grid: &DateGrid) -> Option<Vec<f64>> {
        None
    }
}
