use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use log::{debug, info, warn};

use crate::errors::CoreError;
use crate::models::date_grid::DateGrid;
use crate::models::instrument::{InstrumentKind, InstrumentSeries, Listing, MarketKey};
use crate::models::price::{densify, MarketDataCache, PricePoint};
use crate::models::settings::matches_etf_name;
use crate::models::transaction::TransactionEntry;
use crate::providers::registry::ProviderRegistry;
use crate::services::classifier_service::ClassifierService;

/// Provider queries reach this many days past the grid end, so the last
/// grid days still find a quote after a holiday.
const QUERY_MARGIN_DAYS: i64 = 7;

/// Fetches price and exchange-rate history from the providers and prepares
/// a `MarketDataCache` for one report run.
///
/// Each (series, grid range) key is fetched at most once. Failures are
/// logged and remembered as misses, never propagated: the ledger degrades
/// to cost basis or face value instead.
pub struct MarketDataService {
    registry: ProviderRegistry,
}

impl MarketDataService {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Check if at least one provider is available for a given kind.
    pub fn has_provider_for(&self, kind: InstrumentKind) -> bool {
        self.registry.get_provider_for(kind).is_some()
    }

    /// Fetch every series the ledger will ask for while processing `entries`:
    /// exchange rates for each non-EUR currency and prices for each traded ISIN.
    pub async fn prefetch(
        &self,
        entries: &[TransactionEntry],
        grid: &DateGrid,
        etf_name_fragments: &[String],
        cache: &mut MarketDataCache,
    ) {
        let classifier = ClassifierService::new();
        let mut currencies = BTreeSet::new();
        let mut instruments = BTreeSet::new();

        for entry in entries.iter().filter(|e| e.date.is_some()) {
            if !entry.is_euro() {
                currencies.insert(entry.currency.to_uppercase());
            }
            if classifier.classify(&entry.description).kind.is_trade() && !entry.isin.is_empty() {
                let is_etf = matches_etf_name(etf_name_fragments, &entry.product_name);
                instruments.insert((entry.isin.clone(), is_etf, entry.currency.clone()));
            }
        }

        info!(
            "Retrieving market data for {} currencies and {} instruments",
            currencies.len(),
            instruments.len()
        );
        if self.has_provider_for(InstrumentKind::Currency) {
            for code in &currencies {
                self.ensure_currency(code, grid, cache).await;
            }
        } else if !currencies.is_empty() {
            warn!("No exchange rate provider registered, amounts stay at face value");
        }
        for (isin, is_etf, currency) in &instruments {
            let kind = InstrumentKind::for_security(*is_etf);
            if !self.has_provider_for(kind) {
                warn!("No {kind} provider registered, skipping ISIN {isin}");
                continue;
            }
            self.ensure_instrument(isin, *is_etf, currency, grid, cache).await;
        }
    }

    /// Cached currency → EUR modifiers for `code`, fetching on first use.
    pub async fn ensure_currency(
        &self,
        code: &str,
        grid: &DateGrid,
        cache: &mut MarketDataCache,
    ) -> Option<Vec<f64>> {
        let key = MarketKey::currency(code);
        if !cache.contains(&key, grid) {
            match self.fetch_currency_modifier(code, grid).await {
                Ok(values) => {
                    let series = InstrumentSeries {
                        name: key_name(&key),
                        values,
                    };
                    cache.insert(key.clone(), grid, series);
                }
                Err(e) => {
                    warn!("Could not retrieve exchange rates for {code}: {e}");
                    cache.insert_miss(key.clone(), grid, e.to_string());
                }
            }
        }
        cache.get(&key, grid).map(|s| s.values.clone())
    }

    /// Cached EUR prices for `isin`, fetching on first use. `quote_currency`
    /// is used when the provider does not report the listing's currency.
    pub async fn ensure_instrument(
        &self,
        isin: &str,
        is_etf: bool,
        quote_currency: &str,
        grid: &DateGrid,
        cache: &mut MarketDataCache,
    ) -> Option<InstrumentSeries> {
        let key = MarketKey::instrument(isin, is_etf);
        if !cache.contains(&key, grid) {
            match self
                .fetch_instrument_series(isin, is_etf, quote_currency, grid, cache)
                .await
            {
                Ok(series) => {
                    cache.insert(key.clone(), grid, series);
                }
                Err(e) => {
                    let kind = InstrumentKind::for_security(is_etf);
                    warn!("Could not retrieve {kind} data for ISIN {isin}: {e}");
                    cache.insert_miss(key.clone(), grid, e.to_string());
                }
            }
        }
        cache.get(&key, grid).cloned()
    }

    /// Multipliers turning one unit of `code` into EUR, one per grid day.
    pub async fn fetch_currency_modifier(
        &self,
        code: &str,
        grid: &DateGrid,
    ) -> Result<Vec<f64>, CoreError> {
        let code = code.to_uppercase();
        let (_, points) = self
            .fetch_points(InstrumentKind::Currency, "EUR", &code, grid)
            .await?;
        let rates = densify(&points, grid).ok_or_else(|| not_available(&code, "EUR", grid))?;
        if rates.iter().any(|r| *r <= 0.0) {
            return Err(CoreError::Api {
                provider: "market data".into(),
                message: format!("Non-positive EUR/{code} rate returned"),
            });
        }
        Ok(rates.iter().map(|rate| 1.0 / rate).collect())
    }

    /// EUR prices of `isin` over the grid plus its display name.
    ///
    /// Prices are converted from the currency of the listing the provider
    /// resolved; `quote_currency` only stands in when it reports none.
    pub async fn fetch_instrument_series(
        &self,
        isin: &str,
        is_etf: bool,
        quote_currency: &str,
        grid: &DateGrid,
        cache: &mut MarketDataCache,
    ) -> Result<InstrumentSeries, CoreError> {
        let kind = InstrumentKind::for_security(is_etf);
        let (listing, points) = self.fetch_points(kind, isin, quote_currency, grid).await?;
        let listed_in = listing.currency.as_deref().unwrap_or(quote_currency);
        let mut values = densify(&points, grid)
            .ok_or_else(|| not_available(&listing.symbol, listed_in, grid))?;

        let (currency, unit) = currency_unit(listed_in);
        if unit != 1.0 {
            values.iter_mut().for_each(|value| *value *= unit);
        }
        if !currency.is_empty() && currency != "EUR" {
            debug!("Converting {} prices from {currency} to EUR", listing.symbol);
            let modifier = self
                .ensure_currency(&currency, grid, cache)
                .await
                .ok_or_else(|| not_available(&currency, "EUR", grid))?;
            values
                .iter_mut()
                .zip(&modifier)
                .for_each(|(value, m)| *value *= m);
        }

        Ok(InstrumentSeries {
            name: listing.name,
            values,
        })
    }

    /// Resolve the listing and fetch its points, trying each provider for
    /// `kind` in registration order.
    async fn fetch_points(
        &self,
        kind: InstrumentKind,
        identifier: &str,
        currency: &str,
        grid: &DateGrid,
    ) -> Result<(Listing, Vec<PricePoint>), CoreError> {
        let (from, to) = query_range(grid)?;
        let providers = self.registry.get_providers_for(kind);
        if providers.is_empty() {
            return Err(CoreError::NoProvider(kind.to_string()));
        }

        let mut last_error = None;
        for provider in &providers {
            let listing = match provider.resolve_listing(identifier, kind).await {
                Ok(listing) => listing,
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            };
            let currency = listing.currency.as_deref().unwrap_or(currency);
            match provider.get_price_range(&listing.symbol, currency, from, to).await {
                Ok(points) if !points.is_empty() => return Ok((listing, points)),
                Ok(_) => {
                    last_error = Some(not_available(&listing.symbol, currency, grid));
                }
                Err(e) => {
                    last_error = Some(e);
                    // Try next provider
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider(kind.to_string())))
    }
}

/// ISO code and unit multiplier for a quote currency. London and
/// Johannesburg listings are quoted in minor units ("GBp", "ZAc").
pub fn currency_unit(code: &str) -> (String, f64) {
    match code {
        "GBp" | "GBX" => ("GBP".to_string(), 0.01),
        "ZAc" | "ZAC" => ("ZAR".to_string(), 0.01),
        "ILA" => ("ILS".to_string(), 0.01),
        other => (other.to_uppercase(), 1.0),
    }
}

fn query_range(grid: &DateGrid) -> Result<(NaiveDate, NaiveDate), CoreError> {
    match (grid.first(), grid.last()) {
        (Some(first), Some(last)) => Ok((first, last + Duration::days(QUERY_MARGIN_DAYS))),
        _ => Err(CoreError::ValidationError("empty date range".into())),
    }
}

fn not_available(symbol: &str, currency: &str, grid: &DateGrid) -> CoreError {
    let range = match (grid.first(), grid.last()) {
        (Some(first), Some(last)) => format!("{first}..{last}"),
        _ => "empty range".to_string(),
    };
    CoreError::PriceNotAvailable {
        symbol: symbol.to_string(),
        currency: currency.to_string(),
        date: range,
    }
}

fn key_name(key: &MarketKey) -> String {
    match key {
        MarketKey::Instrument { isin, .. } => isin.clone(),
        MarketKey::Currency(code) => format!("{code}/EUR"),
    }
}
