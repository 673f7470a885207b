pub mod classifier_service;
pub mod ledger_service;
pub mod market_service;
pub mod metrics_service;
pub mod rebase_service;
pub mod reference_service;
