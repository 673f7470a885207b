use crate::models::ledger::LedgerState;

/// Totals, profit/loss and performance derived from the ledger arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountMetrics {
    /// shares value + cash
    pub total: Vec<f64>,
    /// total - invested
    pub profit_loss: Vec<f64>,
    /// total / invested, 0 where nothing is invested
    pub performance: Vec<f64>,
}

/// Pure derivations on finished ledger arrays. No state, no I/O.
pub struct MetricsService;

impl MetricsService {
    pub fn new() -> Self {
        Self
    }

    pub fn derive(&self, state: &LedgerState) -> AccountMetrics {
        let total: Vec<f64> = state
            .shares_value
            .iter()
            .zip(&state.cash)
            .map(|(shares, cash)| shares + cash)
            .collect();
        let profit_loss = total
            .iter()
            .zip(&state.invested)
            .map(|(total, invested)| total - invested)
            .collect();
        let performance = ratio(&total, &state.invested);

        AccountMetrics {
            total,
            profit_loss,
            performance,
        }
    }
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new()
    }
}

/// Elementwise `numerator / denominator`, 0 wherever the denominator is 0.
pub fn ratio(numerator: &[f64], denominator: &[f64]) -> Vec<f64> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(n, d)| if *d != 0.0 { n / d } else { 0.0 })
        .collect()
}
