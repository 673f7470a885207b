use crate::errors::CoreError;
use crate::models::transaction::{Classification, TradeDetails, TransactionKind};

/// Maps DeGiro account descriptions (Dutch) to transaction kinds.
///
/// Matching is exact or substring based and case-sensitive, except the
/// dividend-tax rule which ignores case. Anything unmatched is `Unknown`;
/// classification never fails.
pub struct ClassifierService;

impl ClassifierService {
    pub fn new() -> Self {
        Self
    }

    /// Classify a description. A `Koop`/`Verkoop` description whose share
    /// count cannot be parsed classifies as `Unknown`; importers reject such
    /// rows earlier through `parse_trade`.
    pub fn classify(&self, description: &str) -> Classification {
        match self.parse_trade(description) {
            Ok(Some((kind, trade))) => {
                return Classification {
                    kind,
                    trade: Some(trade),
                }
            }
            Ok(None) => {}
            Err(_) => return Classification::of(TransactionKind::Unknown),
        }
        Classification::of(Self::classify_cash(description))
    }

    /// Parse `"<Koop|Verkoop> <count> @ <price> <currency>"`.
    ///
    /// Returns `Ok(None)` when the description is not a trade and an error
    /// when it is one with a malformed share count.
    pub fn parse_trade(
        &self,
        description: &str,
    ) -> Result<Option<(TransactionKind, TradeDetails)>, CoreError> {
        let mut tokens = description.split(' ');
        let kind = match tokens.next() {
            Some("Koop") => TransactionKind::Buy,
            Some("Verkoop") => TransactionKind::Sell,
            _ => return Ok(None),
        };

        let invalid = || CoreError::InvalidShareCount {
            line: 0,
            description: description.to_string(),
        };
        let count = tokens
            .next()
            .map(|t| t.replace('.', ""))
            .and_then(|t| t.parse::<u64>().ok())
            .filter(|&c| c > 0)
            .ok_or_else(invalid)?;

        // "@ 13,93 USD" is informational only, tolerate anything
        let price = match (tokens.next(), tokens.next()) {
            (Some("@"), Some(quoted)) => parse_decimal_comma(quoted),
            _ => None,
        };

        Ok(Some((kind, TradeDetails { count, price })))
    }

    fn classify_cash(description: &str) -> TransactionKind {
        match description {
            // ── Cash in and out ──
            "iDEAL storting" | "Storting" => TransactionKind::CashDeposit,
            "Terugstorting" => TransactionKind::CashWithdrawal,
            "Contante Verrekening Aandelen" => TransactionKind::CashSettlement,
            // ── Broker costs ──
            "DEGIRO transactiekosten" => TransactionKind::TransactionFee,
            d if d.contains("DEGIRO Aansluitingskosten") => TransactionKind::ConnectionFee,
            d if d.contains("Externe Kosten") => TransactionKind::ExternalFee,
            d if d.contains("Stamp Duty") => TransactionKind::StampDuty,
            // ── Dividend ──
            "Dividend" => TransactionKind::Dividend,
            d if d.to_lowercase().contains("dividendbelasting") => TransactionKind::DividendTax,
            // ── Cash held in money market funds ──
            d if d.contains("Koersverandering geldmarktfonds") => {
                TransactionKind::MoneyMarketRevaluation
            }
            "DEGIRO Geldmarktfondsen Compensatie" => TransactionKind::MoneyMarketCompensation,
            "Fondsuitkering" => TransactionKind::FundDistribution,
            "Rente" => TransactionKind::Interest,
            d if d.contains("Conversie geldmarktfonds") => TransactionKind::MoneyMarketConversion,
            // ── Others ──
            "Valuta Creditering" | "Valuta Debitering" => TransactionKind::CurrencyCreditDebit,
            _ => TransactionKind::Unknown,
        }
    }
}

impl Default for ClassifierService {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a decimal written with a comma separator and dotted thousands,
/// e.g. `"1.234,56"` or `"-111,44"`.
pub fn parse_decimal_comma(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
