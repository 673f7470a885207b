use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the brokerage account log.
///
/// `mutation` is signed and denominated in `currency`: negative is money
/// leaving the brokerage cash balance, positive is money coming in.
/// Continuation rows of a multi-leg transaction carry no date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub date: Option<NaiveDate>,
    pub product_name: String,
    pub isin: String,
    pub description: String,
    pub currency: String,
    pub mutation: Option<f64>,
}

impl TransactionEntry {
    pub fn new(
        date: NaiveDate,
        product_name: impl Into<String>,
        isin: impl Into<String>,
        description: impl Into<String>,
        currency: impl Into<String>,
        mutation: f64,
    ) -> Self {
        Self {
            date: Some(date),
            product_name: product_name.into(),
            isin: isin.into(),
            description: description.into(),
            currency: currency.into(),
            mutation: Some(mutation),
        }
    }

    /// A cash row without product (deposits, fees, interest).
    pub fn cash(
        date: NaiveDate,
        description: impl Into<String>,
        currency: impl Into<String>,
        mutation: f64,
    ) -> Self {
        Self::new(date, "", "", description, currency, mutation)
    }

    /// Signed amount, absent amounts count as zero.
    pub fn amount(&self) -> f64 {
        self.mutation.unwrap_or(0.0)
    }

    /// True when amounts are already in EUR and need no conversion.
    pub fn is_euro(&self) -> bool {
        self.currency.is_empty() || self.currency == "EUR"
    }
}

/// The closed set of transaction kinds found in the account log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    CashDeposit,
    CashWithdrawal,
    Buy,
    Sell,
    CashSettlement,
    TransactionFee,
    ConnectionFee,
    ExternalFee,
    StampDuty,
    Dividend,
    DividendTax,
    MoneyMarketRevaluation,
    MoneyMarketCompensation,
    FundDistribution,
    Interest,
    MoneyMarketConversion,
    CurrencyCreditDebit,
    Unknown,
}

/// How a transaction kind mutates the ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LedgerRule {
    /// Cash flows into the account (subject to the cash-flow policy).
    Deposit,
    /// Cash flows out of the account (subject to the cash-flow policy).
    Withdrawal,
    /// Shares change hands; `sign` is +1 for buys and -1 for sells.
    Trade { sign: f64 },
    /// Plain cash adjustment, optionally converted to EUR.
    Cash { convert: bool },
    /// Already reflected by a paired entry.
    NoOp,
    /// Not understood; reported, never applied.
    Unrecognized,
}

impl TransactionKind {
    /// Dispatch table from kind to ledger rule.
    pub fn rule(&self) -> LedgerRule {
        match self {
            TransactionKind::CashDeposit => LedgerRule::Deposit,
            TransactionKind::CashWithdrawal => LedgerRule::Withdrawal,
            TransactionKind::Buy => LedgerRule::Trade { sign: 1.0 },
            TransactionKind::Sell => LedgerRule::Trade { sign: -1.0 },
            // Settlements and domestic fees are booked in EUR already
            TransactionKind::CashSettlement
            | TransactionKind::TransactionFee
            | TransactionKind::ConnectionFee => LedgerRule::Cash { convert: false },
            TransactionKind::ExternalFee
            | TransactionKind::StampDuty
            | TransactionKind::Dividend
            | TransactionKind::DividendTax
            | TransactionKind::MoneyMarketRevaluation
            | TransactionKind::MoneyMarketCompensation
            | TransactionKind::FundDistribution
            | TransactionKind::Interest => LedgerRule::Cash { convert: true },
            TransactionKind::MoneyMarketConversion | TransactionKind::CurrencyCreditDebit => {
                LedgerRule::NoOp
            }
            TransactionKind::Unknown => LedgerRule::Unrecognized,
        }
    }

    pub fn is_trade(&self) -> bool {
        matches!(self, TransactionKind::Buy | TransactionKind::Sell)
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TransactionKind::CashDeposit => "Cash deposit",
            TransactionKind::CashWithdrawal => "Cash withdrawal",
            TransactionKind::Buy => "Buy",
            TransactionKind::Sell => "Sell",
            TransactionKind::CashSettlement => "Cash settlement",
            TransactionKind::TransactionFee => "Transaction fee",
            TransactionKind::ConnectionFee => "Connection fee",
            TransactionKind::ExternalFee => "External fee",
            TransactionKind::StampDuty => "Stamp duty",
            TransactionKind::Dividend => "Dividend",
            TransactionKind::DividendTax => "Dividend tax",
            TransactionKind::MoneyMarketRevaluation => "Money market revaluation",
            TransactionKind::MoneyMarketCompensation => "Money market compensation",
            TransactionKind::FundDistribution => "Fund distribution",
            TransactionKind::Interest => "Interest",
            TransactionKind::MoneyMarketConversion => "Money market conversion",
            TransactionKind::CurrencyCreditDebit => "Currency credit/debit",
            TransactionKind::Unknown => "Unknown",
        };
        write!(f, "{label}")
    }
}

/// Quantity and quoted price parsed from a `Koop`/`Verkoop` description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeDetails {
    /// Whole number of shares (thousands separators stripped).
    pub count: u64,
    /// Quoted price per share, informational only.
    pub price: Option<f64>,
}

/// Result of classifying a description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub kind: TransactionKind,
    /// Present for `Buy` and `Sell` only.
    pub trade: Option<TradeDetails>,
}

impl Classification {
    pub fn of(kind: TransactionKind) -> Self {
        Self { kind, trade: None }
    }
}
