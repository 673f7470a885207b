pub mod account_csv;
pub mod export;
