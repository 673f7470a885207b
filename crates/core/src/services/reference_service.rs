use crate::models::ledger::add_scaled_suffix;

/// Simulates putting every change in invested capital into a reference
/// instrument on the day it happened, and holding it.
///
/// Fractional shares are allowed. A drop in invested capital is treated as
/// a (partial) sale of the reference holding at that day's price.
pub struct ReferenceService;

impl ReferenceService {
    pub fn new() -> Self {
        Self
    }

    /// Daily value of the simulated reference holding.
    ///
    /// `reference` and `invested` must be aligned to the same grid; the
    /// result has the length of the shorter one. Days whose reference price
    /// is 0 cannot buy anything and are skipped.
    pub fn simulate(&self, reference: &[f64], invested: &[f64]) -> Vec<f64> {
        let len = reference.len().min(invested.len());
        let mut result = vec![0.0; len];
        if len == 0 {
            return result;
        }

        let shares = if reference[0] != 0.0 {
            invested[0] / reference[0]
        } else {
            0.0
        };
        add_scaled_suffix(&mut result, 0, reference, shares);

        for day in 1..len {
            let investment = invested[day] - invested[day - 1];
            if investment != 0.0 && reference[day] != 0.0 {
                add_scaled_suffix(&mut result, day, reference, investment / reference[day]);
            }
        }
        result
    }

    /// Reference price relative to its first day ("all-in on day one").
    pub fn all_in_day_one(&self, reference: &[f64]) -> Vec<f64> {
        match reference.first() {
            Some(&first) if first != 0.0 => reference.iter().map(|r| r / first).collect(),
            _ => vec![0.0; reference.len()],
        }
    }
}

impl Default for ReferenceService {
    fn default() -> Self {
        Self::new()
    }
}
