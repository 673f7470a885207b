use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::instrument::{InstrumentKind, Listing};
use crate::models::price::PricePoint;

/// Trait abstraction for all market data providers.
///
/// Each API (Frankfurter, Yahoo Finance) implements this trait. If an API
/// stops working or changes, only that one implementation is replaced.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Which instrument kinds this provider can handle.
    fn supported_kinds(&self) -> Vec<InstrumentKind>;

    /// Resolve an identifier (ISIN, currency code) to a queryable listing.
    ///
    /// The default treats the identifier as the symbol itself and leaves the
    /// trading currency unknown.
    async fn resolve_listing(
        &self,
        identifier: &str,
        _kind: InstrumentKind,
    ) -> Result<Listing, CoreError> {
        Ok(Listing {
            symbol: identifier.to_string(),
            name: identifier.to_string(),
            currency: None,
        })
    }

    /// Get daily prices of `symbol` expressed in `currency` for a date range.
    /// Returns points sorted by date; days without trading may be missing.
    async fn get_price_range(
        &self,
        symbol: &str,
        currency: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError>;
}
