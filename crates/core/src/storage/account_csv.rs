use chrono::NaiveDate;
use log::info;

use crate::errors::CoreError;
use crate::models::transaction::TransactionEntry;
use crate::services::classifier_service::{parse_decimal_comma, ClassifierService};

/// Exact header of a DeGiro `Account.csv` export.
pub const CSV_HEADER: &str = "Datum,Tijd,Valutadatum,Product,ISIN,Omschrijving,FX,Mutatie,,Saldo,,Order Id";

/// Date format used in the export (`DD-MM-YYYY`).
pub const DATE_FORMAT: &str = "%d-%m-%Y";

// Column positions
const COL_DATE: usize = 0;
const COL_PRODUCT: usize = 3;
const COL_ISIN: usize = 4;
const COL_DESCRIPTION: usize = 5;
const COL_CURRENCY: usize = 7;
const COL_MUTATION: usize = 8;

/// A parsed account export, rows kept in file order (newest first).
#[derive(Debug, Clone)]
pub struct AccountLog {
    pub entries: Vec<TransactionEntry>,
}

impl AccountLog {
    /// Date of the oldest dated row.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.iter().rev().find_map(|e| e.date)
    }

    /// Date of the newest dated row.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.iter().find_map(|e| e.date)
    }

    /// Entries in processing order (oldest first).
    pub fn oldest_first(&self) -> impl Iterator<Item = &TransactionEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads DeGiro account exports.
///
/// All numeric validation happens here: an unparseable amount, date or
/// share count rejects the whole file, so the ledger never sees one.
pub struct AccountReader;

impl AccountReader {
    /// Parse the text of an `Account.csv` export.
    pub fn read_str(text: &str) -> Result<AccountLog, CoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let mut records = reader.records();

        let header = records
            .next()
            .ok_or_else(|| CoreError::InvalidFileFormat("empty account file".into()))??;
        let expected: Vec<&str> = CSV_HEADER.split(',').collect();
        let found: Vec<&str> = header.iter().collect();
        if found != expected {
            return Err(CoreError::InvalidFileFormat(format!(
                "unexpected header\nFound: {found:?}\nExpected: {expected:?}"
            )));
        }

        let classifier = ClassifierService::new();
        let mut entries = Vec::new();
        for record in records {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line() as usize);
            entries.push(Self::parse_row(&classifier, &record, line)?);
        }

        if entries.iter().all(|e| e.date.is_none()) {
            return Err(CoreError::InvalidFileFormat(
                "account file contains no dated rows".into(),
            ));
        }

        info!("Read {} account rows", entries.len());
        Ok(AccountLog { entries })
    }

    /// Read an export from disk (native only, not WASM).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn read_file(path: impl AsRef<std::path::Path>) -> Result<AccountLog, CoreError> {
        let path = path.as_ref();
        info!("Reading DeGiro data from '{}'", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::read_str(&text)
    }

    fn parse_row(
        classifier: &ClassifierService,
        record: &csv::StringRecord,
        line: usize,
    ) -> Result<TransactionEntry, CoreError> {
        if record.len() <= COL_MUTATION {
            return Err(CoreError::InvalidFileFormat(format!(
                "line {line}: expected at least {} fields, found {}",
                COL_MUTATION + 1,
                record.len()
            )));
        }
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();

        let raw_date = field(COL_DATE);
        let date = if raw_date.is_empty() {
            None
        } else {
            let parsed = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
                .map_err(|_| CoreError::InvalidDate { line, value: raw_date.clone() })?;
            Some(parsed)
        };

        let raw_mutation = field(COL_MUTATION);
        let mutation = if raw_mutation.trim().is_empty() {
            None
        } else {
            let amount = parse_decimal_comma(&raw_mutation).ok_or_else(|| CoreError::InvalidAmount {
                line,
                value: raw_mutation.clone(),
            })?;
            Some(amount)
        };

        let description = field(COL_DESCRIPTION);
        classifier
            .parse_trade(&description)
            .map_err(|_| CoreError::InvalidShareCount {
                line,
                description: description.clone(),
            })?;

        Ok(TransactionEntry {
            date,
            product_name: field(COL_PRODUCT),
            isin: field(COL_ISIN),
            description,
            currency: field(COL_CURRENCY),
            mutation,
        })
    }
}
