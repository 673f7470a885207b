use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use time::OffsetDateTime;
use yahoo_finance_api::YQuoteItem;

use crate::errors::CoreError;
use crate::models::instrument::{InstrumentKind, Listing};
use crate::models::price::PricePoint;
use super::traits::MarketDataProvider;

/// Exchange codes to query, in order of preference: Amsterdam, then the US
/// venues, then London.
pub const PREFERRED_EXCHANGES: &[&[&str]] = &[
    &["AMS"],
    &["NMS", "NYQ", "NGM", "NCM", "ASE", "PCX", "BTS"],
    &["LSE", "IOB"],
];

/// Yahoo Finance API provider for stock and ETF prices.
///
/// - **Free**: No API key required.
/// - **Coverage**: Global equities and ETFs, searchable by ISIN.
/// - **Data**: Full daily historical closes.
///
/// Prices come back in the listing's trading currency, which
/// `resolve_listing` reports; conversion to EUR is done by `MarketDataService`.
///
/// **Note**: Not WASM-compatible (uses native reqwest/tokio).
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| CoreError::Api {
                provider: "Yahoo Finance".into(),
                message: format!("Failed to create connector: {e}"),
            })?;
        Ok(Self { connector })
    }

    /// Convert a `chrono::NaiveDate` to `time::OffsetDateTime` (midnight UTC).
    fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, CoreError> {
        let invalid = |e: String| CoreError::Api {
            provider: "Yahoo Finance".into(),
            message: format!("Invalid date {date}: {e}"),
        };
        let month = time::Month::try_from(date.month() as u8).map_err(|e| invalid(e.to_string()))?;
        let odt = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
            .map_err(|e| invalid(e.to_string()))?
            .with_hms(0, 0, 0)
            .map_err(|e| invalid(e.to_string()))?
            .assume_utc();
        Ok(odt)
    }

    /// Convert a unix timestamp (seconds) to `chrono::NaiveDate`.
    fn timestamp_to_naive_date(ts: i64) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }

    /// Pick the listing to query among the search results for one ISIN.
    ///
    /// Only quotes of the expected type are considered (all quotes when none
    /// match). Among those, exchanges are tried in `PREFERRED_EXCHANGES`
    /// order, falling back to the first candidate.
    pub fn preferred_quote(quotes: &[YQuoteItem], kind: InstrumentKind) -> Option<&YQuoteItem> {
        let wanted = Self::quote_type(kind);
        let mut candidates: Vec<&YQuoteItem> =
            quotes.iter().filter(|q| q.quote_type == wanted).collect();
        if candidates.is_empty() {
            candidates = quotes.iter().collect();
        }

        PREFERRED_EXCHANGES
            .iter()
            .find_map(|exchanges| {
                candidates
                    .iter()
                    .find(|q| exchanges.contains(&q.exchange.as_str()))
                    .copied()
            })
            .or_else(|| candidates.first().copied())
    }

    /// Yahoo's `quoteType` for a kind of instrument.
    fn quote_type(kind: InstrumentKind) -> &'static str {
        match kind {
            InstrumentKind::Etf => "ETF",
            InstrumentKind::Stock => "EQUITY",
            InstrumentKind::Currency => "CURRENCY",
        }
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn supported_kinds(&self) -> Vec<InstrumentKind> {
        vec![InstrumentKind::Stock, InstrumentKind::Etf]
    }

    async fn resolve_listing(
        &self,
        identifier: &str,
        kind: InstrumentKind,
    ) -> Result<Listing, CoreError> {
        let result = self
            .connector
            .search_ticker(identifier)
            .await
            .map_err(|e| CoreError::Api {
                provider: "Yahoo Finance".into(),
                message: format!("Failed to search for {identifier}: {e}"),
            })?;

        let item = Self::preferred_quote(&result.quotes, kind).ok_or_else(|| CoreError::Api {
            provider: "Yahoo Finance".into(),
            message: format!("No {kind} listing found for {identifier}"),
        })?;

        let name = if item.long_name.is_empty() {
            item.short_name.clone()
        } else {
            item.long_name.clone()
        };

        // Search results carry no currency; the chart metadata does
        let currency = match self.connector.get_latest_quotes(&item.symbol, "1d").await {
            Ok(resp) => resp.metadata().ok().and_then(|meta| meta.currency),
            Err(e) => {
                log::warn!("No trading currency for {}: {e}", item.symbol);
                None
            }
        };

        Ok(Listing {
            symbol: item.symbol.clone(),
            name,
            currency,
        })
    }

    async fn get_price_range(
        &self,
        symbol: &str,
        _currency: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let start = Self::to_offset_datetime(from)?;
        let end = Self::to_offset_datetime(to + chrono::Duration::days(1))?; // inclusive end

        let resp = self
            .connector
            .get_quote_history(symbol, start, end)
            .await
            .map_err(|e| CoreError::Api {
                provider: "Yahoo Finance".into(),
                message: format!("Failed to fetch history range for {symbol}: {e}"),
            })?;

        let quotes = resp.quotes().map_err(|e| CoreError::Api {
            provider: "Yahoo Finance".into(),
            message: format!("Failed to parse quotes for {symbol}: {e}"),
        })?;

        let points: Vec<PricePoint> = quotes
            .iter()
            .filter_map(|q| {
                let date = Self::timestamp_to_naive_date(q.timestamp)?;
                (date >= from && date <= to).then_some(PricePoint {
                    date,
                    price: q.close,
                })
            })
            .collect();

        Ok(points)
    }
}
