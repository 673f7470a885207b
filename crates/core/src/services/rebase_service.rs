use chrono::NaiveDate;
use log::info;

use crate::models::date_grid::DateGrid;
use crate::models::report::{SeriesSet, ACCOUNT_PERFORMANCE, INVESTED, TOTAL_ACCOUNT};
use crate::services::metrics_service::ratio;

/// Moves a report's start to a later date.
///
/// All series are cut to start at the chosen day and the account
/// performance is recomputed against a shifted denominator,
/// `invested + (total[start] - invested[start])`, so that it reads exactly
/// break-even on the start day while later cash flows still move it.
pub struct RebaseService;

impl RebaseService {
    pub fn new() -> Self {
        Self
    }

    /// Returns whether the report was rebased. A start date outside the
    /// grid leaves everything untouched.
    pub fn rebase(
        &self,
        start: NaiveDate,
        grid: &mut DateGrid,
        absolutes: &mut SeriesSet,
        relatives: &mut SeriesSet,
    ) -> bool {
        let Some(index) = grid.index_of(start) else {
            return false;
        };
        info!("Filtering out all data from before {start}");

        *grid = grid.suffix(index);
        absolutes.truncate_front(index);
        relatives.truncate_front(index);

        if let (Some(invested), Some(total)) = (absolutes.get(INVESTED), absolutes.get(TOTAL_ACCOUNT)) {
            let performance = rebased_performance(invested, total);
            relatives.insert(ACCOUNT_PERFORMANCE, performance);
        }
        true
    }
}

impl Default for RebaseService {
    fn default() -> Self {
        Self::new()
    }
}

/// `total / (invested + total[0] - invested[0])`, 0 where that denominator is 0.
pub fn rebased_performance(invested: &[f64], total: &[f64]) -> Vec<f64> {
    let offset = match (total.first(), invested.first()) {
        (Some(t), Some(i)) => t - i,
        _ => return Vec::new(),
    };
    let restart: Vec<f64> = invested.iter().map(|i| i + offset).collect();
    ratio(total, &restart)
}
