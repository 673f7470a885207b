use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An ordered, gap-free run of calendar days covering a report.
///
/// Index 0 is the first transaction date, the last index is the report end
/// date. Every time series in a report is a `Vec<f64>` of the same length,
/// aligned to the grid by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "GridDates")]
pub struct DateGrid {
    dates: Vec<NaiveDate>,
}

/// Wire form of a grid; checked for gaps before it becomes a `DateGrid`.
#[derive(Deserialize)]
struct GridDates {
    dates: Vec<NaiveDate>,
}

impl TryFrom<GridDates> for DateGrid {
    type Error = String;

    fn try_from(raw: GridDates) -> Result<Self, Self::Error> {
        if let Some(pair) = raw.dates.windows(2).find(|w| w[0].succ_opt() != Some(w[1])) {
            return Err(format!(
                "dates must be consecutive days, found {} followed by {}",
                pair[0], pair[1]
            ));
        }
        Ok(Self { dates: raw.dates })
    }
}

impl DateGrid {
    /// Build the grid `first..=last`. An inverted range yields an empty grid.
    pub fn new(first: NaiveDate, last: NaiveDate) -> Self {
        let mut dates = Vec::new();
        let mut d = first;
        while d <= last {
            dates.push(d);
            match d.succ_opt() {
                Some(next) => d = next,
                None => break,
            }
        }
        Self { dates }
    }

    /// Build a grid of `days` consecutive days starting at `first`.
    pub fn with_len(first: NaiveDate, days: usize) -> Self {
        let dates = first.iter_days().take(days).collect();
        Self { dates }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn get(&self, index: usize) -> Option<NaiveDate> {
        self.dates.get(index).copied()
    }

    /// Position of `date` in the grid. O(1): the grid has no gaps.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let first = self.first()?;
        let offset = (date - first).num_days();
        if offset < 0 {
            return None;
        }
        let idx = offset as usize;
        (idx < self.dates.len()).then_some(idx)
    }

    /// Index of `date` searching forward only from `cursor`.
    /// Returns `None` when the date lies before the cursor or past the end.
    pub fn advance_to(&self, cursor: usize, date: NaiveDate) -> Option<usize> {
        self.index_of(date).filter(|&idx| idx >= cursor)
    }

    /// The sub-grid starting at `index` (empty if out of range).
    pub fn suffix(&self, index: usize) -> DateGrid {
        Self {
            dates: self.dates.get(index..).map(<[_]>::to_vec).unwrap_or_default(),
        }
    }
}
