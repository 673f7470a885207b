use serde::{Deserialize, Serialize};

use super::date_grid::DateGrid;
use super::diagnostic::Diagnostic;

/// Name of the net-invested-capital series.
pub const INVESTED: &str = "invested";
/// Name of the cash balance series.
pub const CASH: &str = "cash";
/// Name of the shares + cash series.
pub const TOTAL_ACCOUNT: &str = "total account value";
/// Name of the total minus invested series.
pub const PROFIT_LOSS: &str = "profit/loss";
/// Name of the total / invested ratio series.
pub const ACCOUNT_PERFORMANCE: &str = "account performance";

/// A named daily series aligned to a report's grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Ordered collection of named series. Insertion order is kept so that
/// exports and charts list series the way they were produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSet {
    series: Vec<NamedSeries>,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the series called `name`.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        match self.series.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.values = values,
            None => self.series.push(NamedSeries { name, values }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.as_slice())
    }

    pub fn names(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedSeries> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Drop the first `index` values of every series.
    pub fn truncate_front(&mut self, index: usize) {
        for s in &mut self.series {
            s.values = s.values.get(index..).map(<[_]>::to_vec).unwrap_or_default();
        }
    }
}

/// The finished report: absolute EUR series and relative (ratio) series,
/// both aligned 1:1 with `grid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub grid: DateGrid,
    pub absolutes: SeriesSet,
    pub relatives: SeriesSet,
    pub diagnostics: Vec<Diagnostic>,
}
