// ═══════════════════════════════════════════════════════════════════
// Classifier Tests: description matching, trade parsing, rule table
// ═══════════════════════════════════════════════════════════════════

use degiro_performance_core::errors::CoreError;
use degiro_performance_core::models::transaction::{LedgerRule, TransactionKind};
use degiro_performance_core::services::classifier_service::{parse_decimal_comma, ClassifierService};

fn kind_of(description: &str) -> TransactionKind {
    ClassifierService::new().classify(description).kind
}

// ── Cash movements ──────────────────────────────────────────────────

mod cash {
    use super::*;

    #[test]
    fn ideal_deposit() {
        assert_eq!(kind_of("iDEAL storting"), TransactionKind::CashDeposit);
    }

    #[test]
    fn plain_deposit() {
        assert_eq!(kind_of("Storting"), TransactionKind::CashDeposit);
    }

    #[test]
    fn withdrawal() {
        assert_eq!(kind_of("Terugstorting"), TransactionKind::CashWithdrawal);
    }

    #[test]
    fn cash_settlement_is_exact_match() {
        assert_eq!(
            kind_of("Contante Verrekening Aandelen"),
            TransactionKind::CashSettlement
        );
        assert_eq!(
            kind_of("Contante Verrekening Aandelen XYZ"),
            TransactionKind::Unknown
        );
    }
}

// ── Broker costs ────────────────────────────────────────────────────

mod costs {
    use super::*;

    #[test]
    fn transaction_fee() {
        assert_eq!(kind_of("DEGIRO transactiekosten"), TransactionKind::TransactionFee);
    }

    #[test]
    fn connection_fee_by_substring() {
        assert_eq!(
            kind_of("DEGIRO Aansluitingskosten 2020 (Euronext Amsterdam - EAM)"),
            TransactionKind::ConnectionFee
        );
    }

    #[test]
    fn external_fee_by_substring() {
        assert_eq!(
            kind_of("Externe Kosten Nasdaq"),
            TransactionKind::ExternalFee
        );
    }

    #[test]
    fn stamp_duty_by_substring() {
        assert_eq!(
            kind_of("London/Dublin Stamp Duty"),
            TransactionKind::StampDuty
        );
    }
}

// ── Dividend and money market ───────────────────────────────────────

mod income {
    use super::*;

    #[test]
    fn dividend_is_exact_match() {
        assert_eq!(kind_of("Dividend"), TransactionKind::Dividend);
        assert_eq!(kind_of("Dividend extra"), TransactionKind::Unknown);
    }

    #[test]
    fn dividend_tax_ignores_case() {
        assert_eq!(kind_of("Dividendbelasting"), TransactionKind::DividendTax);
        assert_eq!(kind_of("DIVIDENDBELASTING"), TransactionKind::DividendTax);
    }

    #[test]
    fn money_market_revaluation() {
        assert_eq!(
            kind_of("Koersverandering geldmarktfonds (EUR)"),
            TransactionKind::MoneyMarketRevaluation
        );
    }

    #[test]
    fn money_market_compensation() {
        assert_eq!(
            kind_of("DEGIRO Geldmarktfondsen Compensatie"),
            TransactionKind::MoneyMarketCompensation
        );
    }

    #[test]
    fn fund_distribution_and_interest() {
        assert_eq!(kind_of("Fondsuitkering"), TransactionKind::FundDistribution);
        assert_eq!(kind_of("Rente"), TransactionKind::Interest);
    }

    #[test]
    fn money_market_conversion_is_not_a_trade() {
        let classification =
            ClassifierService::new().classify("Conversie geldmarktfonds: Koop 0,02 @ 9.985 EUR");
        assert_eq!(classification.kind, TransactionKind::MoneyMarketConversion);
        assert!(classification.trade.is_none());
    }

    #[test]
    fn currency_credit_and_debit() {
        assert_eq!(kind_of("Valuta Creditering"), TransactionKind::CurrencyCreditDebit);
        assert_eq!(kind_of("Valuta Debitering"), TransactionKind::CurrencyCreditDebit);
    }
}

// ── Trades ──────────────────────────────────────────────────────────

mod trades {
    use super::*;

    #[test]
    fn buy_with_count_and_price() {
        let c = ClassifierService::new().classify("Koop 8 @ 13,93 USD");
        assert_eq!(c.kind, TransactionKind::Buy);
        let trade = c.trade.unwrap();
        assert_eq!(trade.count, 8);
        assert!((trade.price.unwrap() - 13.93).abs() < 1e-9);
    }

    #[test]
    fn sell_with_count_and_price() {
        let c = ClassifierService::new().classify("Verkoop 8 @ 32,75 USD");
        assert_eq!(c.kind, TransactionKind::Sell);
        assert_eq!(c.trade.unwrap().count, 8);
    }

    #[test]
    fn thousands_separator_is_stripped() {
        let c = ClassifierService::new().classify("Koop 1.250 @ 4,01 EUR");
        assert_eq!(c.kind, TransactionKind::Buy);
        assert_eq!(c.trade.unwrap().count, 1250);
    }

    #[test]
    fn missing_price_is_tolerated() {
        let c = ClassifierService::new().classify("Koop 3");
        assert_eq!(c.kind, TransactionKind::Buy);
        let trade = c.trade.unwrap();
        assert_eq!(trade.count, 3);
        assert!(trade.price.is_none());
    }

    #[test]
    fn malformed_count_classifies_as_unknown() {
        assert_eq!(kind_of("Koop acht @ 13,93 USD"), TransactionKind::Unknown);
        assert_eq!(kind_of("Verkoop"), TransactionKind::Unknown);
        assert_eq!(kind_of("Koop 0 @ 1,00 EUR"), TransactionKind::Unknown);
    }

    #[test]
    fn malformed_count_is_an_error_for_parse_trade() {
        let err = ClassifierService::new()
            .parse_trade("Koop acht @ 13,93 USD")
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidShareCount { .. }));
    }

    #[test]
    fn parse_trade_ignores_non_trades() {
        let parsed = ClassifierService::new().parse_trade("iDEAL storting").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn keyword_is_case_sensitive() {
        assert_eq!(kind_of("koop 8 @ 13,93 USD"), TransactionKind::Unknown);
    }
}

// ── Fallback ────────────────────────────────────────────────────────

mod unknown {
    use super::*;

    #[test]
    fn unmatched_description_is_unknown() {
        assert_eq!(kind_of("Iets heel anders"), TransactionKind::Unknown);
    }

    #[test]
    fn empty_description_is_unknown() {
        assert_eq!(kind_of(""), TransactionKind::Unknown);
    }
}

// ── Rule dispatch table ─────────────────────────────────────────────

mod rules {
    use super::*;

    #[test]
    fn deposits_and_withdrawals() {
        assert_eq!(TransactionKind::CashDeposit.rule(), LedgerRule::Deposit);
        assert_eq!(TransactionKind::CashWithdrawal.rule(), LedgerRule::Withdrawal);
    }

    #[test]
    fn trades_carry_their_sign() {
        assert_eq!(TransactionKind::Buy.rule(), LedgerRule::Trade { sign: 1.0 });
        assert_eq!(TransactionKind::Sell.rule(), LedgerRule::Trade { sign: -1.0 });
    }

    #[test]
    fn domestic_costs_are_not_converted() {
        for kind in [
            TransactionKind::CashSettlement,
            TransactionKind::TransactionFee,
            TransactionKind::ConnectionFee,
        ] {
            assert_eq!(kind.rule(), LedgerRule::Cash { convert: false }, "{kind}");
        }
    }

    #[test]
    fn foreign_cash_flows_are_converted() {
        for kind in [
            TransactionKind::ExternalFee,
            TransactionKind::StampDuty,
            TransactionKind::Dividend,
            TransactionKind::DividendTax,
            TransactionKind::MoneyMarketRevaluation,
            TransactionKind::MoneyMarketCompensation,
            TransactionKind::FundDistribution,
            TransactionKind::Interest,
        ] {
            assert_eq!(kind.rule(), LedgerRule::Cash { convert: true }, "{kind}");
        }
    }

    #[test]
    fn paired_entries_are_no_ops() {
        assert_eq!(TransactionKind::MoneyMarketConversion.rule(), LedgerRule::NoOp);
        assert_eq!(TransactionKind::CurrencyCreditDebit.rule(), LedgerRule::NoOp);
        assert_eq!(TransactionKind::Unknown.rule(), LedgerRule::Unrecognized);
    }
}

// ── Decimal parsing ─────────────────────────────────────────────────

mod decimals {
    use super::*;

    #[test]
    fn comma_decimal() {
        assert_eq!(parse_decimal_comma("-111,44"), Some(-111.44));
        assert_eq!(parse_decimal_comma("262,00"), Some(262.0));
    }

    #[test]
    fn dotted_thousands() {
        assert_eq!(parse_decimal_comma("1.234,56"), Some(1234.56));
    }

    #[test]
    fn plain_integer() {
        assert_eq!(parse_decimal_comma("500"), Some(500.0));
    }

    #[test]
    fn empty_and_garbage() {
        assert_eq!(parse_decimal_comma(""), None);
        assert_eq!(parse_decimal_comma("   "), None);
        assert_eq!(parse_decimal_comma("12,3x"), None);
    }
}
