//! Header normalization, column auto-detection, and explicit mapping

use serde::{Deserialize, Serialize};

use crate::types::{ReconcileError, ReconcileResult};

/// Synonyms accepted for the primary date column
const DATE_SYNONYMS: &[&str] = &["date", "transaction_date", "posting_date", "value_date"];

/// Synonyms accepted for the description column
const DESCRIPTION_SYNONYMS: &[&str] =
    &["description", "merchant", "narration", "details", "reference"];

/// Synonyms accepted for a single signed amount column
const AMOUNT_SYNONYMS: &[&str] = &["amount", "value", "net_amount"];

const CURRENCY_SYNONYMS: &[&str] = &["currency", "ccy"];

/// Normalize a header cell: trim, lowercase, collapse whitespace to `_`
pub fn normalize_header(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    let mut last_was_sep = false;
    for c in header.trim().chars() {
        if c.is_whitespace() {
            if !last_was_sep {
                out.push('_');
                last_was_sep = true;
            }
        } else {
            out.extend(c.to_lowercase());
            last_was_sep = false;
        }
    }
    out
}

/// How the signed net amount is derived from a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum AmountStrategy {
    /// A single signed column: the value is the amount
    Amount { column: usize },
    /// Separate debit/credit columns: `amount = credit - debit`
    DebitCredit { debit: usize, credit: usize },
    /// Money in/out columns with an optional fee:
    /// `amount = money_in - money_out - fee`
    MoneyInOut {
        money_in: usize,
        money_out: usize,
        fee: Option<usize>,
    },
}

/// Caller-supplied field-to-column mapping, used when auto-detection fails.
///
/// Columns are named by their (raw) header text; the mapping is replayed
/// through the same row-processing logic as auto-detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: String,
    pub description: String,
    pub amount: AmountMapping,
    pub currency: Option<String>,
}

/// The amount strategy of an explicit [`ColumnMapping`], by header name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum AmountMapping {
    Amount { column: String },
    DebitCredit { debit: String, credit: String },
    MoneyInOut {
        money_in: String,
        money_out: String,
        fee: Option<String>,
    },
}

/// Resolved column layout for one statement file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub date: usize,
    pub description: usize,
    pub amount: AmountStrategy,
    pub currency: Option<usize>,
    /// Optional provenance columns, populated when present in the header
    pub posting_date: Option<usize>,
    pub transaction_date: Option<usize>,
    pub original_description: Option<usize>,
    pub parent_category: Option<usize>,
    pub statement_category: Option<usize>,
    pub nr: Option<usize>,
    pub account: Option<usize>,
    pub balance: Option<usize>,
    pub fee: Option<usize>,
}

fn find_any(headers: &[String], synonyms: &[&str]) -> Option<usize> {
    synonyms
        .iter()
        .find_map(|name| headers.iter().position(|h| h == name))
}

fn find(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn optional_columns(headers: &[String], layout: &mut ColumnLayout) {
    layout.posting_date = find(headers, "posting_date");
    layout.transaction_date = find(headers, "transaction_date");
    layout.original_description = find(headers, "original_description");
    layout.parent_category = find(headers, "parent_category");
    layout.statement_category =
        find(headers, "statement_category").or_else(|| find(headers, "category"));
    layout.nr = find(headers, "nr");
    layout.account = find(headers, "account");
    layout.balance = find(headers, "balance");
    layout.fee = find(headers, "fee");
}

fn empty_layout(date: usize, description: usize, amount: AmountStrategy) -> ColumnLayout {
    ColumnLayout {
        date,
        description,
        amount,
        currency: None,
        posting_date: None,
        transaction_date: None,
        original_description: None,
        parent_category: None,
        statement_category: None,
        nr: None,
        account: None,
        balance: None,
        fee: None,
    }
}

/// Auto-detect the column layout from a raw header row.
///
/// Detection succeeds only when a date column, a description column, and one
/// complete amount strategy are all found; otherwise the error names the
/// missing logical fields so the caller can supply an explicit mapping. When
/// several strategies are available, a single `amount` column is preferred
/// over `debit`+`credit`, which is preferred over `money_in`+`money_out`.
pub fn detect_columns(header_row: &[String]) -> ReconcileResult<ColumnLayout> {
    let headers: Vec<String> = header_row.iter().map(|h| normalize_header(h)).collect();

    let date = find_any(&headers, DATE_SYNONYMS);
    let description = find_any(&headers, DESCRIPTION_SYNONYMS);
    let amount = detect_amount_strategy(&headers);

    let mut missing = Vec::new();
    if date.is_none() {
        missing.push("date");
    }
    if description.is_none() {
        missing.push("description");
    }
    if amount.is_none() {
        missing.push("amount");
    }
    let (Some(date), Some(description), Some(amount)) = (date, description, amount) else {
        return Err(ReconcileError::ColumnsNotDetected(missing.join(", ")));
    };

    let mut layout = empty_layout(date, description, amount);
    layout.currency = find_any(&headers, CURRENCY_SYNONYMS);
    optional_columns(&headers, &mut layout);
    tracing::debug!(amount = ?layout.amount, "columns detected");
    Ok(layout)
}

fn detect_amount_strategy(headers: &[String]) -> Option<AmountStrategy> {
    if let Some(column) = find_any(headers, AMOUNT_SYNONYMS) {
        return Some(AmountStrategy::Amount { column });
    }
    if let (Some(debit), Some(credit)) = (find(headers, "debit"), find(headers, "credit")) {
        return Some(AmountStrategy::DebitCredit { debit, credit });
    }
    if let (Some(money_in), Some(money_out)) =
        (find(headers, "money_in"), find(headers, "money_out"))
    {
        return Some(AmountStrategy::MoneyInOut {
            money_in,
            money_out,
            fee: find(headers, "fee"),
        });
    }
    None
}

/// Resolve an explicit [`ColumnMapping`] against a raw header row.
///
/// Every named column must exist (after header normalization on both sides);
/// optional provenance columns are still picked up automatically.
pub fn resolve_mapping(
    header_row: &[String],
    mapping: &ColumnMapping,
) -> ReconcileResult<ColumnLayout> {
    let headers: Vec<String> = header_row.iter().map(|h| normalize_header(h)).collect();

    let require = |name: &str| -> ReconcileResult<usize> {
        find(&headers, &normalize_header(name))
            .ok_or_else(|| ReconcileError::MappedColumnMissing(name.to_string()))
    };

    let amount = match &mapping.amount {
        AmountMapping::Amount { column } => AmountStrategy::Amount {
            column: require(column)?,
        },
        AmountMapping::DebitCredit { debit, credit } => AmountStrategy::DebitCredit {
            debit: require(debit)?,
            credit: require(credit)?,
        },
        AmountMapping::MoneyInOut {
            money_in,
            money_out,
            fee,
        } => AmountStrategy::MoneyInOut {
            money_in: require(money_in)?,
            money_out: require(money_out)?,
            fee: fee.as_deref().map(require).transpose()?,
        },
    };

    let mut layout = empty_layout(require(&mapping.date)?, require(&mapping.description)?, amount);
    layout.currency = mapping.currency.as_deref().map(require).transpose()?;
    if layout.currency.is_none() {
        layout.currency = find_any(&headers, CURRENCY_SYNONYMS);
    }
    optional_columns(&headers, &mut layout);
    Ok(layout)
}

/// Parse a raw cell into a number, stripping everything except digits, sign,
/// and the decimal point. Empty cells parse to `None`.
pub fn parse_amount_cell(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '+' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
