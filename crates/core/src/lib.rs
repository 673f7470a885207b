pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use log::{info, warn};

use errors::CoreError;
use models::{
    date_grid::DateGrid,
    price::MarketDataCache,
    report::{
        PerformanceReport, SeriesSet, ACCOUNT_PERFORMANCE, CASH, INVESTED, PROFIT_LOSS,
        TOTAL_ACCOUNT,
    },
    settings::ReportSettings,
    transaction::TransactionEntry,
};
use providers::{lookup::PriceSeriesProvider, registry::ProviderRegistry};
use services::{
    ledger_service::{CashFlowPolicy, LedgerService},
    market_service::MarketDataService,
    metrics_service::{ratio, MetricsService},
    rebase_service::RebaseService,
    reference_service::ReferenceService,
};
use storage::account_csv::{AccountLog, AccountReader};

/// Main entry point for the degiro-performance-core library.
///
/// Turns an account export into daily invested / cash / total value series,
/// derived performance, and a comparison against a reference instrument.
#[must_use]
pub struct PerformanceTracker {
    settings: ReportSettings,
    ledger_service: LedgerService,
    metrics_service: MetricsService,
    rebase_service: RebaseService,
    reference_service: ReferenceService,
    market_service: MarketDataService,
}

impl std::fmt::Debug for PerformanceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceTracker")
            .field("settings", &self.settings)
            .finish()
    }
}

impl PerformanceTracker {
    /// Create a tracker using the default market data providers.
    pub fn new(settings: ReportSettings) -> Result<Self, CoreError> {
        Self::with_registry(settings, ProviderRegistry::new_with_defaults())
    }

    /// Create a tracker with a custom provider registry (offline use, tests).
    pub fn with_registry(
        settings: ReportSettings,
        registry: ProviderRegistry,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        Ok(Self {
            ledger_service: LedgerService::new(&settings),
            metrics_service: MetricsService::new(),
            rebase_service: RebaseService::new(),
            reference_service: ReferenceService::new(),
            market_service: MarketDataService::new(registry),
            settings,
        })
    }

    /// Replace the deposit/withdrawal rule chosen in the settings.
    pub fn with_cash_flow_policy(mut self, policy: Box<dyn CashFlowPolicy>) -> Self {
        self.ledger_service = self.ledger_service.with_policy(policy);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    // ── Input ───────────────────────────────────────────────────────

    /// Parse the text of a DeGiro `Account.csv` export.
    pub fn read_account(&self, text: &str) -> Result<AccountLog, CoreError> {
        AccountReader::read_str(text)
    }

    /// The report grid: oldest transaction date through the end date.
    pub fn build_grid(&self, log: &AccountLog) -> Result<DateGrid, CoreError> {
        let first = log.first_date().ok_or_else(|| {
            CoreError::ValidationError("account log contains no dated rows".into())
        })?;
        let end = self.settings.resolved_end_date();
        if first > end {
            return Err(CoreError::ValidationError(format!(
                "first transaction ({first}) is after the end date ({end})"
            )));
        }
        Ok(DateGrid::new(first, end))
    }

    // ── Report ──────────────────────────────────────────────────────

    /// Build the full report, fetching market data from the providers.
    pub async fn generate_report(&self, log: &AccountLog) -> Result<PerformanceReport, CoreError> {
        let grid = self.build_grid(log)?;
        let mut cache = MarketDataCache::new();
        self.prefetch(log, &grid, &mut cache).await;
        Ok(self.compute_report(&log.entries, grid, &cache))
    }

    /// Fill `cache` with everything a report over `grid` needs.
    pub async fn prefetch(&self, log: &AccountLog, grid: &DateGrid, cache: &mut MarketDataCache) {
        self.market_service
            .prefetch(&log.entries, grid, &self.settings.etf_name_fragments, cache)
            .await;

        if let Some(isin) = &self.settings.reference_isin {
            info!("Retrieving reference data for {isin}");
            self.market_service
                .ensure_instrument(isin, true, &self.settings.reference_currency, grid, cache)
                .await;
        }
    }

    /// Build the report from already prepared market data. Never fails:
    /// problems end up in `PerformanceReport::diagnostics`.
    ///
    /// `entries` are in file order (newest first).
    pub fn compute_report(
        &self,
        entries: &[TransactionEntry],
        grid: DateGrid,
        cache: &MarketDataCache,
    ) -> PerformanceReport {
        if let (Some(first), Some(last)) = (grid.first(), grid.last()) {
            info!(
                "Parsing DeGiro data with {} rows from {first} till {last}",
                entries.len()
            );
        }

        let outcome = self
            .ledger_service
            .accumulate(entries.iter().rev(), &grid, cache, cache);
        let metrics = self.metrics_service.derive(&outcome.state);

        let mut absolutes = SeriesSet::new();
        absolutes.insert(INVESTED, outcome.state.invested);
        absolutes.insert(CASH, outcome.state.cash);
        absolutes.insert(TOTAL_ACCOUNT, metrics.total);
        absolutes.insert(PROFIT_LOSS, metrics.profit_loss);

        let mut relatives = SeriesSet::new();
        relatives.insert(ACCOUNT_PERFORMANCE, metrics.performance);

        let full_grid = grid.clone();
        let mut grid = grid;
        let mut offset = 0;
        if let Some(start) = self.settings.start_date {
            if self
                .rebase_service
                .rebase(start, &mut grid, &mut absolutes, &mut relatives)
            {
                offset = full_grid.len() - grid.len();
            }
        }

        if let Some(isin) = &self.settings.reference_isin {
            self.add_reference(isin, cache, &full_grid, offset, &mut absolutes, &mut relatives);
        }

        PerformanceReport {
            grid,
            absolutes,
            relatives,
            diagnostics: outcome.diagnostics,
        }
    }

    /// Add the reference-instrument series, if prices are available.
    fn add_reference(
        &self,
        isin: &str,
        cache: &MarketDataCache,
        full_grid: &DateGrid,
        offset: usize,
        absolutes: &mut SeriesSet,
        relatives: &mut SeriesSet,
    ) {
        let Some(series) = cache.lookup(isin, full_grid, true) else {
            warn!("Could not find data for reference {isin}, skipping");
            return;
        };
        let Some(invested) = absolutes.get(INVESTED).map(<[f64]>::to_vec) else {
            return;
        };

        let reference = series.values.get(offset..).unwrap_or_default();
        let given_investment = self.reference_service.simulate(reference, &invested);
        let all_in = self.reference_service.all_in_day_one(reference);
        let given_ratio = ratio(&given_investment, &invested);

        absolutes.insert(format!("{}: given investment", series.name), given_investment);
        relatives.insert(format!("{}: all-in day one", series.name), all_in);
        relatives.insert(format!("{}: given investment", series.name), given_ratio);
    }
}
