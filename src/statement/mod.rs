//! Statement Parser: raw uploaded bytes to ordered [`crate::types::BankTransaction`]s

pub mod columns;
pub mod decode;
pub mod import;
pub mod tokenize;

pub use columns::{AmountMapping, AmountStrategy, ColumnMapping};
pub use import::{parse_statement, parse_statement_with_mapping, DEFAULT_CURRENCY};
