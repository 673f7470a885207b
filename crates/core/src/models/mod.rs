pub mod date_grid;
pub mod diagnostic;
pub mod instrument;
pub mod ledger;
pub mod price;
pub mod report;
pub mod settings;
pub mod transaction;
