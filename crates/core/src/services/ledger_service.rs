use chrono::NaiveDate;
use log::{debug, warn};

use crate::models::date_grid::DateGrid;
use crate::models::diagnostic::Diagnostic;
use crate::models::ledger::{add_scaled_suffix, add_suffix, set_suffix, LedgerOutcome, LedgerState};
use crate::models::settings::{matches_etf_name, CashFlowPolicyKind, ReportSettings};
use crate::models::transaction::{LedgerRule, TransactionEntry};
use crate::providers::lookup::{CurrencyConverter, PriceSeriesProvider};
use crate::services::classifier_service::ClassifierService;

/// Decides how deposits and withdrawals move the ledger.
///
/// `amount` is the entry's signed mutation: positive for deposits,
/// negative for withdrawals.
pub trait CashFlowPolicy: Send + Sync {
    fn deposit(&self, state: &mut LedgerState, index: usize, amount: f64);
    fn withdrawal(&self, state: &mut LedgerState, index: usize, amount: f64);
}

/// Money withdrawn from the broker is assumed to sit on a bank account and
/// still counts as cash. A later deposit first uses up that parked money;
/// only the remainder is new investment.
#[derive(Debug, Clone, Copy, Default)]
pub struct BankBufferPolicy;

impl CashFlowPolicy for BankBufferPolicy {
    fn deposit(&self, state: &mut LedgerState, index: usize, amount: f64) {
        let parked = state.bank_cash[index];
        if parked > amount {
            add_suffix(&mut state.bank_cash, index, -amount);
        } else {
            let excess = amount - parked;
            add_suffix(&mut state.invested, index, excess);
            add_suffix(&mut state.cash, index, excess);
            set_suffix(&mut state.bank_cash, index, 0.0);
        }
    }

    fn withdrawal(&self, state: &mut LedgerState, index: usize, amount: f64) {
        // amount is negative: the parked balance grows
        add_suffix(&mut state.bank_cash, index, -amount);
    }
}

/// Deposits are new investment, withdrawals divestment. No bank buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectCashFlowPolicy;

impl CashFlowPolicy for DirectCashFlowPolicy {
    fn deposit(&self, state: &mut LedgerState, index: usize, amount: f64) {
        add_suffix(&mut state.invested, index, amount);
        add_suffix(&mut state.cash, index, amount);
    }

    fn withdrawal(&self, state: &mut LedgerState, index: usize, amount: f64) {
        add_suffix(&mut state.invested, index, amount);
        add_suffix(&mut state.cash, index, amount);
    }
}

/// Rebuilds invested capital, cash and share value from the account log.
///
/// Entries are applied strictly oldest-first: every write is a suffix write
/// that later entries build upon, and the date cursor only moves forward.
pub struct LedgerService {
    classifier: ClassifierService,
    policy: Box<dyn CashFlowPolicy>,
    etf_name_fragments: Vec<String>,
}

impl LedgerService {
    pub fn new(settings: &ReportSettings) -> Self {
        let policy: Box<dyn CashFlowPolicy> = match settings.cash_flow_policy {
            CashFlowPolicyKind::BankBuffer => Box::new(BankBufferPolicy),
            CashFlowPolicyKind::Direct => Box::new(DirectCashFlowPolicy),
        };
        Self {
            classifier: ClassifierService::new(),
            policy,
            etf_name_fragments: settings.etf_name_fragments.clone(),
        }
    }

    /// Swap in a custom cash-flow policy.
    pub fn with_policy(mut self, policy: Box<dyn CashFlowPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Fold `entries` (oldest first) into the four ledger arrays.
    ///
    /// Rows without a date are skipped. The first entry dated outside the
    /// grid (or before an earlier entry) halts processing; everything
    /// applied up to that point is kept.
    pub fn accumulate<'a, P, C>(
        &self,
        entries: impl IntoIterator<Item = &'a TransactionEntry>,
        grid: &DateGrid,
        prices: &P,
        currencies: &C,
    ) -> LedgerOutcome
    where
        P: PriceSeriesProvider + ?Sized,
        C: CurrencyConverter + ?Sized,
    {
        let mut run = Run {
            grid,
            prices,
            currencies,
            state: LedgerState::zeroed(grid.len()),
            diagnostics: Vec::new(),
        };
        let mut processed = 0;
        let mut halted_at = None;
        let mut cursor = 0;

        for entry in entries {
            let Some(date) = entry.date else {
                continue;
            };

            match grid.advance_to(cursor, date) {
                Some(index) => cursor = index,
                None => {
                    run.report(Diagnostic::DateBeyondGrid {
                        date,
                        grid_end: grid.last(),
                    });
                    halted_at = Some(date);
                    break;
                }
            }

            self.apply(&mut run, entry, date, cursor);
            processed += 1;
        }

        LedgerOutcome {
            state: run.state,
            processed,
            halted_at,
            diagnostics: run.diagnostics,
        }
    }

    /// Apply one dated entry at grid position `index`.
    fn apply<P, C>(&self, run: &mut Run<'_, P, C>, entry: &TransactionEntry, date: NaiveDate, index: usize)
    where
        P: PriceSeriesProvider + ?Sized,
        C: CurrencyConverter + ?Sized,
    {
        let classification = self.classifier.classify(&entry.description);
        let mutation = entry.amount();

        match classification.kind.rule() {
            LedgerRule::Deposit => self.policy.deposit(&mut run.state, index, mutation),
            LedgerRule::Withdrawal => self.policy.withdrawal(&mut run.state, index, mutation),
            LedgerRule::Trade { sign } => {
                // classify yields Buy/Sell only together with a share count
                let Some(trade) = classification.trade else {
                    return;
                };
                let count = trade.count as f64;
                let modifier = run.currency_modifier(entry, date, index);
                let is_etf = matches_etf_name(&self.etf_name_fragments, &entry.product_name);

                let values = match run.prices.lookup(&entry.isin, run.grid, is_etf) {
                    Some(series) if series.values.len() == run.grid.len() => series.values,
                    _ => {
                        let cost_basis = -mutation / count;
                        run.report(Diagnostic::MissingPriceData {
                            date,
                            isin: entry.isin.clone(),
                            product_name: entry.product_name.clone(),
                            cost_basis,
                        });
                        vec![cost_basis; run.grid.len()]
                    }
                };

                debug!(
                    "{date}: {} {} @ {:.2} EUR of {}",
                    classification.kind, trade.count, values[index], entry.product_name
                );

                add_scaled_suffix(&mut run.state.shares_value, index, &values, sign * count);
                add_suffix(&mut run.state.cash, index, mutation * modifier);
            }
            LedgerRule::Cash { convert: false } => {
                add_suffix(&mut run.state.cash, index, mutation);
            }
            LedgerRule::Cash { convert: true } => {
                let modifier = run.currency_modifier(entry, date, index);
                add_suffix(&mut run.state.cash, index, mutation * modifier);
            }
            LedgerRule::NoOp => {}
            LedgerRule::Unrecognized => run.report(Diagnostic::UnknownTransaction {
                date,
                description: entry.description.clone(),
                row: format!("{entry:?}"),
            }),
        }
    }
}

/// Per-run working set: collaborators, the arrays being built, and the
/// diagnostics raised so far.
struct Run<'g, P: ?Sized, C: ?Sized> {
    grid: &'g DateGrid,
    prices: &'g P,
    currencies: &'g C,
    state: LedgerState,
    diagnostics: Vec<Diagnostic>,
}

impl<P, C> Run<'_, P, C>
where
    P: PriceSeriesProvider + ?Sized,
    C: CurrencyConverter + ?Sized,
{
    fn report(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Currency → EUR multiplier on the entry's day. Unknown currencies are
    /// taken at face value.
    fn currency_modifier(&mut self, entry: &TransactionEntry, date: NaiveDate, index: usize) -> f64 {
        if entry.is_euro() {
            return 1.0;
        }
        let modifier = self
            .currencies
            .modifier(&entry.currency, self.grid)
            .and_then(|values| values.get(index).copied());
        match modifier {
            Some(modifier) => modifier,
            None => {
                self.report(Diagnostic::MissingExchangeRate {
                    date,
                    currency: entry.currency.clone(),
                });
                1.0
            }
        }
    }
}
