use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::date_grid::DateGrid;
use super::instrument::{InstrumentSeries, MarketKey};

/// A single price data point (date → price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Expand sparse price points onto every day of the grid.
///
/// Days without a quote (weekends, holidays) carry the previous quote
/// forward. Days before the first quote take the first quote's value.
/// Returns `None` when there are no points at all.
pub fn densify(points: &[PricePoint], grid: &DateGrid) -> Option<Vec<f64>> {
    let mut sorted: Vec<&PricePoint> = points.iter().filter(|p| p.price.is_finite()).collect();
    sorted.sort_by_key(|p| p.date);
    let mut previous = sorted.first()?.price;

    let mut values = Vec::with_capacity(grid.len());
    let mut next = 0;
    for &date in grid.dates() {
        while next < sorted.len() && sorted[next].date <= date {
            previous = sorted[next].price;
            next += 1;
        }
        values.push(previous);
    }
    Some(values)
}

/// Cache key: which series, over which grid range (first, last).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarketCacheKey {
    pub key: MarketKey,
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl MarketCacheKey {
    /// `None` for an empty grid, which can hold no series.
    pub fn for_grid(key: MarketKey, grid: &DateGrid) -> Option<Self> {
        Some(Self {
            key,
            first: grid.first()?,
            last: grid.last()?,
        })
    }
}

/// Market data prepared for a single report run.
///
/// Filled once before accumulation (see `MarketDataService::prefetch`)
/// and read-only afterwards, so every lookup of the same key within a run
/// returns the same series. Nothing persists across runs.
#[derive(Debug, Clone, Default)]
pub struct MarketDataCache {
    entries: HashMap<MarketCacheKey, InstrumentSeries>,
    /// Keys that were fetched but had no data. Remembered so they are not
    /// fetched twice.
    misses: HashMap<MarketCacheKey, String>,
}

impl MarketDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a series for `key` over `grid`. Series of the wrong length are rejected.
    pub fn insert(&mut self, key: MarketKey, grid: &DateGrid, series: InstrumentSeries) -> bool {
        if series.values.len() != grid.len() {
            return false;
        }
        match MarketCacheKey::for_grid(key, grid) {
            Some(cache_key) => {
                self.misses.remove(&cache_key);
                self.entries.insert(cache_key, series);
                true
            }
            None => false,
        }
    }

    /// Record that `key` has no data, with the reason.
    pub fn insert_miss(&mut self, key: MarketKey, grid: &DateGrid, reason: impl Into<String>) {
        if let Some(cache_key) = MarketCacheKey::for_grid(key, grid) {
            self.misses.insert(cache_key, reason.into());
        }
    }

    pub fn get(&self, key: &MarketKey, grid: &DateGrid) -> Option<&InstrumentSeries> {
        let cache_key = MarketCacheKey::for_grid(key.clone(), grid)?;
        self.entries.get(&cache_key)
    }

    /// Whether `key` was already resolved, with or without data.
    pub fn contains(&self, key: &MarketKey, grid: &DateGrid) -> bool {
        MarketCacheKey::for_grid(key.clone(), grid)
            .is_some_and(|k| self.entries.contains_key(&k) || self.misses.contains_key(&k))
    }

    pub fn miss_reason(&self, key: &MarketKey, grid: &DateGrid) -> Option<&str> {
        let cache_key = MarketCacheKey::for_grid(key.clone(), grid)?;
        self.misses.get(&cache_key).map(String::as_str)
    }

    /// Number of series with data.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.misses.clear();
    }
}
