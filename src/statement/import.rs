//! Statement import: bytes in, ordered transactions out

use crate::statement::columns::{
    detect_columns, parse_amount_cell, resolve_mapping, AmountStrategy, ColumnLayout,
    ColumnMapping,
};
use crate::statement::decode::decode_statement_bytes;
use crate::statement::tokenize::{detect_delimiter, tokenize};
use crate::types::{BankTransaction, ReconcileError, ReconcileResult};

/// Currency assumed when the statement has no currency column
pub const DEFAULT_CURRENCY: &str = "USD";

/// Parse a raw statement file with column auto-detection.
///
/// Returns the parsed rows in file order, each with a freshly minted id.
/// Failure is always recoverable: the caller may retry with a corrected file
/// or replay the same bytes through [`parse_statement_with_mapping`].
pub fn parse_statement(bytes: &[u8]) -> ReconcileResult<Vec<BankTransaction>> {
    let rows = decode_rows(bytes)?;
    let layout = detect_columns(&rows[0])?;
    build_transactions(&rows[1..], &layout)
}

/// Parse a raw statement file using an explicit caller-supplied mapping.
///
/// Row processing is identical to [`parse_statement`]; only the column
/// resolution differs.
pub fn parse_statement_with_mapping(
    bytes: &[u8],
    mapping: &ColumnMapping,
) -> ReconcileResult<Vec<BankTransaction>> {
    let rows = decode_rows(bytes)?;
    let layout = resolve_mapping(&rows[0], mapping)?;
    build_transactions(&rows[1..], &layout)
}

fn decode_rows(bytes: &[u8]) -> ReconcileResult<Vec<Vec<String>>> {
    let text = decode_statement_bytes(bytes)?;
    let delimiter = detect_delimiter(&text);
    let rows = tokenize(&text, delimiter);
    if rows.len() < 2 {
        return Err(ReconcileError::EmptyFile);
    }
    Ok(rows)
}

fn build_transactions(
    data_rows: &[Vec<String>],
    layout: &ColumnLayout,
) -> ReconcileResult<Vec<BankTransaction>> {
    let mut parsed = Vec::with_capacity(data_rows.len());
    for row in data_rows {
        if let Some(txn) = build_transaction(row, layout) {
            parsed.push(txn);
        }
    }
    if parsed.is_empty() {
        return Err(ReconcileError::NoRowsParsed);
    }
    tracing::debug!(rows = parsed.len(), "statement parsed");
    Ok(parsed)
}

fn cell<'a>(row: &'a [String], index: usize) -> &'a str {
    row.get(index).map(String::as_str).unwrap_or("").trim()
}

fn optional_cell(row: &[String], index: Option<usize>) -> Option<String> {
    let value = cell(row, index?);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn optional_number(row: &[String], index: Option<usize>) -> Option<f64> {
    parse_amount_cell(cell(row, index?))
}

/// Derive one transaction from one data row, or discard the row.
///
/// A row is discarded when the date or description is empty or the derived
/// amount is not a finite number.
fn build_transaction(row: &[String], layout: &ColumnLayout) -> Option<BankTransaction> {
    let date = cell(row, layout.date);
    let description = cell(row, layout.description);
    if date.is_empty() || description.is_empty() {
        return None;
    }

    let (amount, money_in, money_out, fee) = derive_amount(row, &layout.amount)?;

    let currency = match layout.currency.map(|i| cell(row, i)) {
        Some(c) if !c.is_empty() => c.to_uppercase(),
        _ => DEFAULT_CURRENCY.to_string(),
    };

    let mut txn = BankTransaction::new(
        date.to_string(),
        description.to_string(),
        amount,
        currency,
    );
    txn.money_in = money_in;
    txn.money_out = money_out;
    txn.fee = fee.or_else(|| optional_number(row, layout.fee));
    txn.balance = optional_number(row, layout.balance);
    txn.posting_date = optional_cell(row, layout.posting_date);
    txn.transaction_date = optional_cell(row, layout.transaction_date);
    txn.original_description = optional_cell(row, layout.original_description);
    txn.parent_category = optional_cell(row, layout.parent_category);
    txn.statement_category = optional_cell(row, layout.statement_category);
    txn.nr = optional_cell(row, layout.nr);
    txn.account = optional_cell(row, layout.account);
    Some(txn)
}

type DerivedAmount = (f64, Option<f64>, Option<f64>, Option<f64>);

/// Apply the amount strategy to one row.
///
/// Missing values in the two-column strategies are treated as zero; a row
/// with no finite derived amount is discarded by the caller.
fn derive_amount(row: &[String], strategy: &AmountStrategy) -> Option<DerivedAmount> {
    match strategy {
        AmountStrategy::Amount { column } => {
            let amount = parse_amount_cell(cell(row, *column))?;
            Some((amount, None, None, None))
        }
        AmountStrategy::DebitCredit { debit, credit } => {
            let debit_v = parse_amount_cell(cell(row, *debit));
            let credit_v = parse_amount_cell(cell(row, *credit));
            let amount = credit_v.unwrap_or(0.0) - debit_v.unwrap_or(0.0);
            Some((amount, credit_v, debit_v, None))
        }
        AmountStrategy::MoneyInOut {
            money_in,
            money_out,
            fee,
        } => {
            let in_v = parse_amount_cell(cell(row, *money_in));
            let out_v = parse_amount_cell(cell(row, *money_out));
            let fee_v = fee.and_then(|i| parse_amount_cell(cell(row, i)));
            let amount = in_v.unwrap_or(0.0) - out_v.unwrap_or(0.0) - fee_v.unwrap_or(0.0);
            Some((amount, in_v, out_v, fee_v))
        }
    }
}
