use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// iShares Core MSCI World (IWDA).
pub const DEFAULT_REFERENCE_ISIN: &str = "IE00B4L5Y983";

/// Product-name fragments that mark an instrument as an ETF (case-insensitive).
/// Not exhaustive.
pub const DEFAULT_ETF_NAME_FRAGMENTS: [&str; 7] =
    ["Amundi", "X-TR", "ETFS", "ISHARES", "LYXOR", "Vanguard", "WISDOMTR"];

/// How deposits and withdrawals move `invested`, `cash` and `bank_cash`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowPolicyKind {
    /// Withdrawn money is assumed parked at the bank; re-deposits use it up
    /// before counting as new investment.
    #[default]
    BankBuffer,
    /// Every deposit is new investment, every withdrawal a divestment.
    Direct,
}

/// User-configurable report settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSettings {
    /// Last day of the report. `None` means today.
    pub end_date: Option<NaiveDate>,

    /// First day to show; performance is rebased to this day.
    pub start_date: Option<NaiveDate>,

    /// ISIN of the reference instrument. `None` disables the comparison.
    pub reference_isin: Option<String>,

    /// Currency the reference instrument is assumed to be quoted in when the
    /// provider does not report the listing's currency.
    pub reference_currency: String,

    /// Product-name fragments identifying ETFs.
    pub etf_name_fragments: Vec<String>,

    pub cash_flow_policy: CashFlowPolicyKind,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            end_date: None,
            start_date: None,
            reference_isin: Some(DEFAULT_REFERENCE_ISIN.to_string()),
            reference_currency: "EUR".to_string(),
            etf_name_fragments: DEFAULT_ETF_NAME_FRAGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cash_flow_policy: CashFlowPolicyKind::BankBuffer,
        }
    }
}

impl ReportSettings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: ReportSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file (native only, not WASM).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize settings: {e}")))
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(CoreError::ValidationError(format!(
                    "start date ({start}) must not be after end date ({end})"
                )));
            }
        }
        let currency = &self.reference_currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::ValidationError(format!(
                "Invalid reference currency '{currency}': must be exactly 3 ASCII letters"
            )));
        }
        Ok(())
    }

    /// Report end date, defaulting to today.
    pub fn resolved_end_date(&self) -> NaiveDate {
        self.end_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    /// Whether `product_name` contains one of the ETF fragments.
    pub fn is_etf(&self, product_name: &str) -> bool {
        matches_etf_name(&self.etf_name_fragments, product_name)
    }
}

/// Case-insensitive substring match of `product_name` against `fragments`.
pub fn matches_etf_name(fragments: &[String], product_name: &str) -> bool {
    let name = product_name.to_lowercase();
    fragments
        .iter()
        .any(|fragment| name.contains(&fragment.to_lowercase()))
}
