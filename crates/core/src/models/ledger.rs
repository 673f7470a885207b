use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::diagnostic::Diagnostic;

/// The four running daily arrays rebuilt from the account log.
///
/// Each array is a forward-filled step function: a write at index `i`
/// applies to every index `>= i` until a later write changes a later suffix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Net new capital put into the account
    pub invested: Vec<f64>,
    /// Cash balance in EUR (including money parked at the bank)
    pub cash: Vec<f64>,
    /// Market value of all held shares in EUR
    pub shares_value: Vec<f64>,
    /// Money withdrawn and assumed parked outside the broker; never negative
    pub bank_cash: Vec<f64>,
}

impl LedgerState {
    /// Zero-filled arrays of length `len`.
    pub fn zeroed(len: usize) -> Self {
        Self {
            invested: vec![0.0; len],
            cash: vec![0.0; len],
            shares_value: vec![0.0; len],
            bank_cash: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.invested.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invested.is_empty()
    }
}

/// Add `amount` to `series[from..]`.
pub fn add_suffix(series: &mut [f64], from: usize, amount: f64) {
    if let Some(tail) = series.get_mut(from..) {
        tail.iter_mut().for_each(|v| *v += amount);
    }
}

/// Overwrite `series[from..]` with `value`.
pub fn set_suffix(series: &mut [f64], from: usize, value: f64) {
    if let Some(tail) = series.get_mut(from..) {
        tail.iter_mut().for_each(|v| *v = value);
    }
}

/// Add `scale * values[j]` to `series[j]` for every `j >= from`.
pub fn add_scaled_suffix(series: &mut [f64], from: usize, values: &[f64], scale: f64) {
    for (target, value) in series.iter_mut().zip(values).skip(from) {
        *target += scale * value;
    }
}

/// Final ledger arrays plus everything noteworthy seen while building them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerOutcome {
    pub state: LedgerState,
    /// Entries that were applied to the ledger (including no-ops)
    pub processed: usize,
    /// Set when processing stopped at an entry dated outside the grid
    pub halted_at: Option<NaiveDate>,
    pub diagnostics: Vec<Diagnostic>,
}
