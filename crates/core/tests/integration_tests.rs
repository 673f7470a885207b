use async_trait::async_trait;
use chrono::NaiveDate;

use degiro_performance_core::errors::CoreError;
use degiro_performance_core::models::diagnostic::Diagnostic;
use degiro_performance_core::models::instrument::{InstrumentKind, InstrumentSeries, MarketKey};
use degiro_performance_core::models::price::{MarketDataCache, PricePoint};
use degiro_performance_core::models::report::{
    ACCOUNT_PERFORMANCE, CASH, INVESTED, PROFIT_LOSS, TOTAL_ACCOUNT,
};
use degiro_performance_core::models::settings::{ReportSettings, DEFAULT_REFERENCE_ISIN};
use degiro_performance_core::providers::registry::ProviderRegistry;
use degiro_performance_core::providers::traits::MarketDataProvider;
use degiro_performance_core::services::ledger_service::DirectCashFlowPolicy;
use degiro_performance_core::storage::account_csv::CSV_HEADER;
use degiro_performance_core::storage::export::report_to_csv;
use degiro_performance_core::PerformanceTracker;

// ═══════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

const REFERENCE_NAME: &str = "iShares Core MSCI World";

/// Two deposits of 100 EUR, on the first and third day.
fn deposits_csv() -> String {
    format!(
        "{CSV_HEADER}\n\
         03-01-2021,09:00,03-01-2021,,,iDEAL storting,,EUR,\"100,00\",EUR,\"200,00\",\n\
         01-01-2021,09:00,01-01-2021,,,iDEAL storting,,EUR,\"100,00\",EUR,\"100,00\",\n"
    )
}

fn settings_until(end: NaiveDate) -> ReportSettings {
    ReportSettings {
        end_date: Some(end),
        ..ReportSettings::default()
    }
}

fn offline_tracker(settings: ReportSettings) -> PerformanceTracker {
    PerformanceTracker::with_registry(settings, ProviderRegistry::new()).unwrap()
}

fn with_reference(tracker: &PerformanceTracker, csv: &str, prices: Vec<f64>) -> MarketDataCache {
    let log = tracker.read_account(csv).unwrap();
    let grid = tracker.build_grid(&log).unwrap();
    let mut cache = MarketDataCache::new();
    cache.insert(
        MarketKey::instrument(DEFAULT_REFERENCE_ISIN, true),
        &grid,
        InstrumentSeries {
            name: REFERENCE_NAME.into(),
            values: prices,
        },
    );
    cache
}

fn named(suffix: &str) -> String {
    format!("{REFERENCE_NAME}: {suffix}")
}

/// Serves the same price points for every stock and ETF.
struct MockQuotes {
    points: Vec<PricePoint>,
}

#[async_trait]
impl MarketDataProvider for MockQuotes {
    fn name(&self) -> &str {
        "Mock Quotes"
    }

    fn supported_kinds(&self) -> Vec<InstrumentKind> {
        vec![InstrumentKind::Stock, InstrumentKind::Etf]
    }

    async fn get_price_range(
        &self,
        _symbol: &str,
        _currency: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        Ok(self.points.clone())
    }
}

// ═══════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════

#[test]
fn invalid_settings_are_rejected() {
    let settings = ReportSettings {
        reference_currency: "euro".into(),
        ..ReportSettings::default()
    };
    let result = PerformanceTracker::with_registry(settings, ProviderRegistry::new());
    assert!(matches!(result, Err(CoreError::ValidationError(_))));
}

#[test]
fn grid_runs_from_oldest_row_through_end_date() {
    let tracker = offline_tracker(settings_until(d(2021, 1, 4)));
    let log = tracker.read_account(&deposits_csv()).unwrap();
    let grid = tracker.build_grid(&log).unwrap();

    assert_eq!(grid.first(), Some(d(2021, 1, 1)));
    assert_eq!(grid.last(), Some(d(2021, 1, 4)));
    assert_eq!(grid.len(), 4);
}

#[test]
fn end_date_before_first_row_is_an_error() {
    let tracker = offline_tracker(settings_until(d(2020, 12, 31)));
    let log = tracker.read_account(&deposits_csv()).unwrap();
    assert!(matches!(
        tracker.build_grid(&log),
        Err(CoreError::ValidationError(_))
    ));
}

// ═══════════════════════════════════════════════════════════════════
// Reports from prepared market data
// ═══════════════════════════════════════════════════════════════════

#[test]
fn report_contains_account_and_reference_series() {
    let tracker = offline_tracker(settings_until(d(2021, 1, 4)));
    let csv = deposits_csv();
    let cache = with_reference(&tracker, &csv, vec![10.0, 20.0, 25.0, 50.0]);
    let log = tracker.read_account(&csv).unwrap();
    let grid = tracker.build_grid(&log).unwrap();

    let report = tracker.compute_report(&log.entries, grid, &cache);

    let given = named("given investment");
    let all_in = named("all-in day one");
    assert_eq!(
        report.absolutes.names(),
        vec![INVESTED, CASH, TOTAL_ACCOUNT, PROFIT_LOSS, given.as_str()]
    );
    assert_eq!(
        report.relatives.names(),
        vec![ACCOUNT_PERFORMANCE, all_in.as_str(), given.as_str()]
    );

    assert_eq!(report.absolutes.get(INVESTED), Some(&[100.0, 100.0, 200.0, 200.0][..]));
    assert_eq!(report.absolutes.get(CASH), Some(&[100.0, 100.0, 200.0, 200.0][..]));
    assert_eq!(report.absolutes.get(PROFIT_LOSS), Some(&[0.0; 4][..]));
    assert_eq!(report.relatives.get(ACCOUNT_PERFORMANCE), Some(&[1.0; 4][..]));

    assert_eq!(
        report.absolutes.get(&given),
        Some(&[100.0, 200.0, 350.0, 700.0][..])
    );
    assert_eq!(report.relatives.get(&all_in), Some(&[1.0, 2.0, 2.5, 5.0][..]));
    assert_eq!(report.relatives.get(&given), Some(&[1.0, 2.0, 1.75, 3.5][..]));
    assert!(report.diagnostics.is_empty());
}

#[test]
fn start_date_rebases_every_series() {
    let settings = ReportSettings {
        start_date: Some(d(2021, 1, 3)),
        ..settings_until(d(2021, 1, 4))
    };
    let tracker = offline_tracker(settings);
    let csv = deposits_csv();
    let cache = with_reference(&tracker, &csv, vec![10.0, 20.0, 25.0, 50.0]);
    let log = tracker.read_account(&csv).unwrap();
    let grid = tracker.build_grid(&log).unwrap();

    let report = tracker.compute_report(&log.entries, grid, &cache);

    assert_eq!(report.grid.first(), Some(d(2021, 1, 3)));
    assert_eq!(report.grid.len(), 2);
    for series in report.absolutes.iter().chain(report.relatives.iter()) {
        assert_eq!(series.values.len(), 2, "{}", series.name);
    }
    assert_eq!(report.absolutes.get(INVESTED), Some(&[200.0, 200.0][..]));
    assert_eq!(report.relatives.get(ACCOUNT_PERFORMANCE), Some(&[1.0, 1.0][..]));
    assert_eq!(
        report.absolutes.get(&named("given investment")),
        Some(&[200.0, 400.0][..])
    );
    assert_eq!(
        report.relatives.get(&named("all-in day one")),
        Some(&[1.0, 2.0][..])
    );
}

#[test]
fn start_date_outside_grid_keeps_full_report() {
    let settings = ReportSettings {
        start_date: Some(d(2020, 6, 1)),
        ..settings_until(d(2021, 1, 4))
    };
    let tracker = offline_tracker(settings);
    let log = tracker.read_account(&deposits_csv()).unwrap();
    let grid = tracker.build_grid(&log).unwrap();

    let report = tracker.compute_report(&log.entries, grid, &MarketDataCache::new());

    assert_eq!(report.grid.len(), 4);
}

#[test]
fn missing_reference_data_is_skipped() {
    let tracker = offline_tracker(settings_until(d(2021, 1, 4)));
    let log = tracker.read_account(&deposits_csv()).unwrap();
    let grid = tracker.build_grid(&log).unwrap();

    let report = tracker.compute_report(&log.entries, grid, &MarketDataCache::new());

    assert_eq!(report.absolutes.len(), 4);
    assert_eq!(report.relatives.names(), vec![ACCOUNT_PERFORMANCE]);
}

#[test]
fn disabled_reference_adds_nothing() {
    let settings = ReportSettings {
        reference_isin: None,
        ..settings_until(d(2021, 1, 4))
    };
    let tracker = offline_tracker(settings);
    let csv = deposits_csv();
    let cache = with_reference(&tracker, &csv, vec![10.0, 20.0, 25.0, 50.0]);
    let log = tracker.read_account(&csv).unwrap();
    let grid = tracker.build_grid(&log).unwrap();

    let report = tracker.compute_report(&log.entries, grid, &cache);

    assert_eq!(report.relatives.len(), 1);
}

#[test]
fn ledger_problems_surface_as_diagnostics() {
    let tracker = offline_tracker(settings_until(d(2021, 1, 2)));
    let csv = format!(
        "{CSV_HEADER}\n\
         02-01-2021,09:00,02-01-2021,APPLE INC,US0378331005,Dividend,,USD,\"1,00\",USD,\"1,00\",\n\
         01-01-2021,09:00,01-01-2021,,,iDEAL storting,,EUR,\"100,00\",EUR,\"100,00\",\n"
    );
    let log = tracker.read_account(&csv).unwrap();
    let grid = tracker.build_grid(&log).unwrap();

    let report = tracker.compute_report(&log.entries, grid, &MarketDataCache::new());

    assert_eq!(report.absolutes.get(CASH), Some(&[100.0, 101.0][..]));
    assert!(matches!(
        report.diagnostics.as_slice(),
        [Diagnostic::MissingExchangeRate { .. }]
    ));
}

#[test]
fn cash_flow_policy_can_be_replaced() {
    let csv = format!(
        "{CSV_HEADER}\n\
         02-01-2021,09:00,02-01-2021,,,Terugstorting,,EUR,\"-40,00\",EUR,\"60,00\",\n\
         01-01-2021,09:00,01-01-2021,,,iDEAL storting,,EUR,\"100,00\",EUR,\"100,00\",\n"
    );
    let settings = ReportSettings {
        reference_isin: None,
        ..settings_until(d(2021, 1, 2))
    };

    let buffered = offline_tracker(settings.clone());
    let log = buffered.read_account(&csv).unwrap();
    let grid = buffered.build_grid(&log).unwrap();
    let report = buffered.compute_report(&log.entries, grid.clone(), &MarketDataCache::new());
    assert_eq!(report.absolutes.get(INVESTED), Some(&[100.0, 100.0][..]));

    let direct = offline_tracker(settings).with_cash_flow_policy(Box::new(DirectCashFlowPolicy));
    let report = direct.compute_report(&log.entries, grid, &MarketDataCache::new());
    assert_eq!(report.absolutes.get(INVESTED), Some(&[100.0, 60.0][..]));
}

#[test]
fn report_exports_reference_columns() {
    let tracker = offline_tracker(settings_until(d(2021, 1, 4)));
    let csv = deposits_csv();
    let cache = with_reference(&tracker, &csv, vec![10.0, 20.0, 25.0, 50.0]);
    let log = tracker.read_account(&csv).unwrap();
    let grid = tracker.build_grid(&log).unwrap();

    let report = tracker.compute_report(&log.entries, grid, &cache);
    let exported = report_to_csv(&report).unwrap();

    let header = exported.lines().next().unwrap();
    assert!(header.starts_with("date,invested,cash,total_account_value,profit/loss"));
    assert!(header.contains("iShares_Core_MSCI_World:_all-in_day_one"));
    assert_eq!(exported.lines().count(), 5);
}

// ═══════════════════════════════════════════════════════════════════
// Full pipeline with providers
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn generate_report_fetches_what_it_needs() {
    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(MockQuotes {
        points: vec![
            PricePoint {
                date: d(2021, 1, 1),
                price: 10.0,
            },
            PricePoint {
                date: d(2021, 1, 3),
                price: 12.0,
            },
        ],
    }));
    let tracker =
        PerformanceTracker::with_registry(settings_until(d(2021, 1, 4)), registry).unwrap();
    let csv = format!(
        "{CSV_HEADER}\n\
         02-01-2021,09:00,02-01-2021,SOME CORP,NL0000000001,\"Koop 2 @ 10,00 EUR\",,EUR,\"-20,00\",EUR,\"80,00\",abc\n\
         01-01-2021,09:00,01-01-2021,,,iDEAL storting,,EUR,\"100,00\",EUR,\"100,00\",\n"
    );
    let log = tracker.read_account(&csv).unwrap();

    let report = tracker.generate_report(&log).await.unwrap();

    assert_eq!(report.grid.len(), 4);
    assert_eq!(report.absolutes.get(CASH), Some(&[100.0, 80.0, 80.0, 80.0][..]));
    assert_eq!(
        report.absolutes.get(TOTAL_ACCOUNT),
        Some(&[100.0, 100.0, 104.0, 104.0][..])
    );
    // the default listing is named after the identifier
    assert_eq!(
        report
            .absolutes
            .get(&format!("{DEFAULT_REFERENCE_ISIN}: given investment")),
        Some(&[100.0, 100.0, 120.0, 120.0][..])
    );
    assert!(report.diagnostics.is_empty());
}

#[tokio::test]
async fn generate_report_without_providers_degrades() {
    let tracker = offline_tracker(settings_until(d(2021, 1, 4)));
    let csv = format!(
        "{CSV_HEADER}\n\
         02-01-2021,09:00,02-01-2021,SOME CORP,NL0000000001,\"Koop 2 @ 10,00 EUR\",,EUR,\"-20,00\",EUR,\"80,00\",abc\n\
         01-01-2021,09:00,01-01-2021,,,iDEAL storting,,EUR,\"100,00\",EUR,\"100,00\",\n"
    );
    let log = tracker.read_account(&csv).unwrap();

    let report = tracker.generate_report(&log).await.unwrap();

    assert_eq!(
        report.absolutes.get(TOTAL_ACCOUNT),
        Some(&[100.0, 100.0, 100.0, 100.0][..])
    );
    assert!(matches!(
        report.diagnostics.as_slice(),
        [Diagnostic::MissingPriceData { .. }]
    ));
    assert_eq!(report.relatives.len(), 1);
}
