//! CSV export of allocated transactions for handoff to an external
//! bookkeeping system.

use csv::{QuoteStyle, WriterBuilder};

use crate::types::{BankTransaction, ReconcileError, ReconcileResult};

const HEADERS: [&str; 14] = [
    "date",
    "posting_date",
    "transaction_date",
    "description",
    "money_in",
    "money_out",
    "fee",
    "balance",
    "net_amount",
    "currency",
    "category",
    "account_code",
    "tax_treatment",
    "notes",
];

fn opt_amount(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

/// Serialize every allocated (and unmatched) transaction as CSV.
///
/// Matched transactions are excluded; their documents carry the detail.
/// Every field is quoted so descriptions with delimiters survive any
/// downstream import.
pub fn export_allocations(txns: &[BankTransaction]) -> ReconcileResult<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());
    writer
        .write_record(HEADERS)
        .map_err(|e| ReconcileError::Storage(e.to_string()))?;

    for txn in txns.iter().filter(|t| t.allocated && !t.is_matched()) {
        let category = txn
            .allocation_category
            .clone()
            .or_else(|| txn.statement_category.clone())
            .unwrap_or_default();
        writer
            .write_record([
                txn.date.as_str(),
                txn.posting_date.as_deref().unwrap_or(""),
                txn.transaction_date.as_deref().unwrap_or(""),
                txn.description.as_str(),
                &opt_amount(txn.money_in),
                &opt_amount(txn.money_out),
                &opt_amount(txn.fee),
                &opt_amount(txn.balance),
                &format!("{:.2}", txn.amount),
                txn.currency.as_str(),
                &category,
                txn.allocation_account_code.as_deref().unwrap_or(""),
                txn.allocation_tax_treatment.as_deref().unwrap_or(""),
                txn.allocation_notes.as_deref().unwrap_or(""),
            ])
            .map_err(|e| ReconcileError::Storage(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ReconcileError::Storage(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReconcileError::Storage(e.to_string()))
}
