use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A non-fatal problem met while rebuilding the ledger.
///
/// Every diagnostic is also logged at `warn` level when it is raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// An entry fell outside the grid; accumulation stopped there.
    DateBeyondGrid {
        date: NaiveDate,
        grid_end: Option<NaiveDate>,
    },
    /// No market prices for a traded instrument; cost basis used instead.
    MissingPriceData {
        date: NaiveDate,
        isin: String,
        product_name: String,
        cost_basis: f64,
    },
    /// No exchange rates for a currency; amounts taken at face value.
    MissingExchangeRate { date: NaiveDate, currency: String },
    /// The description matched no known transaction kind.
    UnknownTransaction {
        date: NaiveDate,
        description: String,
        row: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::DateBeyondGrid { date, grid_end } => match grid_end {
                Some(end) => write!(f, "{date}: date outside of range (up to {end}), skipping remaining data"),
                None => write!(f, "{date}: empty date range, skipping all data"),
            },
            Diagnostic::MissingPriceData {
                date,
                isin,
                product_name,
                cost_basis,
            } => write!(
                f,
                "{date}: no historical prices for {product_name} ({isin}), using cost basis {cost_basis:.4} EUR"
            ),
            Diagnostic::MissingExchangeRate { date, currency } => {
                write!(f, "{date}: no exchange rates for {currency}, amount taken as EUR")
            }
            Diagnostic::UnknownTransaction {
                date,
                description,
                row,
            } => write!(f, "{date}: unsupported type of entry '{description}', contents: {row}"),
        }
    }
}
