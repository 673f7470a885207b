use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::instrument::InstrumentKind;
use crate::models::price::PricePoint;
use super::traits::MarketDataProvider;

const BASE_URL: &str = "https://api.frankfurter.dev/v1";

/// Frankfurter API provider for fiat currency exchange rates.
///
/// - **Free**: No API key, no rate limits, open-source.
/// - **Source**: European Central Bank (ECB) data, published on working days.
/// - **Endpoint used**: `/{start}..{end}?base=&symbols=`
///
/// The symbol is the base currency, the currency the quote currency:
/// `get_price_range("EUR", "USD", ..)` yields how many USD one EUR buys.
pub struct FrankfurterProvider {
    client: Client,
}

impl FrankfurterProvider {
    pub fn new() -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
        }
    }

    /// Parse a time-series response body into sorted points for `target`.
    pub fn parse_time_series(body: &str, target: &str) -> Result<Vec<PricePoint>, CoreError> {
        let resp: TimeSeriesResponse = serde_json::from_str(body).map_err(|e| CoreError::Api {
            provider: "Frankfurter".into(),
            message: format!("Failed to parse time series for {target}: {e}"),
        })?;
        Ok(Self::points_for(resp, target))
    }

    fn points_for(resp: TimeSeriesResponse, target: &str) -> Vec<PricePoint> {
        let mut points: Vec<PricePoint> = resp
            .rates
            .iter()
            .filter_map(|(date_str, rates)| {
                let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
                let price = rates.get(target)?;
                Some(PricePoint { date, price: *price })
            })
            .collect();

        points.sort_by_key(|p| p.date);
        points
    }
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── Frankfurter API response types ──────────────────────────────────

#[derive(Deserialize)]
struct TimeSeriesResponse {
    rates: HashMap<String, HashMap<String, f64>>,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl MarketDataProvider for FrankfurterProvider {
    fn name(&self) -> &str {
        "Frankfurter"
    }

    fn supported_kinds(&self) -> Vec<InstrumentKind> {
        vec![InstrumentKind::Currency]
    }

    async fn get_price_range(
        &self,
        symbol: &str,
        currency: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let base = symbol.to_uppercase();
        let target = currency.to_uppercase();

        if base == target {
            let points = from
                .iter_days()
                .take_while(|d| *d <= to)
                .map(|date| PricePoint { date, price: 1.0 })
                .collect();
            return Ok(points);
        }

        let from_str = from.format("%Y-%m-%d");
        let to_str = to.format("%Y-%m-%d");
        let url = format!("{BASE_URL}/{from_str}..{to_str}?base={base}&symbols={target}");

        let resp: TimeSeriesResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "Frankfurter".into(),
                message: format!("Failed to parse time series for {base}/{target}: {e}"),
            })?;

        let points = Self::points_for(resp, &target);
        if points.is_empty() {
            return Err(CoreError::PriceNotAvailable {
                symbol: base,
                currency: target,
                date: format!("{from}..{to}"),
            });
        }
        Ok(points)
    }
}
