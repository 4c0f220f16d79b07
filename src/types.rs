//! Core types and data structures for the reconciliation system

use serde::{Deserialize, Serialize};

/// Direction of money movement on a bank transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Money received (positive amounts)
    MoneyIn,
    /// Money paid out (negative amounts)
    MoneyOut,
}

impl Direction {
    /// Direction implied by a signed amount: negative means money out
    pub fn from_amount(amount: f64) -> Self {
        if amount < 0.0 {
            Direction::MoneyOut
        } else {
            Direction::MoneyIn
        }
    }

    /// The opposite direction
    pub fn flipped(&self) -> Self {
        match self {
            Direction::MoneyIn => Direction::MoneyOut,
            Direction::MoneyOut => Direction::MoneyIn,
        }
    }
}

/// Kind of external document a transaction can be matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocKind {
    Receipt,
    Invoice,
}

impl std::fmt::Display for DocKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocKind::Receipt => write!(f, "receipt"),
            DocKind::Invoice => write!(f, "invoice"),
        }
    }
}

/// One imported bank-statement line
///
/// A transaction is always in exactly one of three states: unmatched
/// (`matched_id` unset, `allocated` false), matched (`matched_id` set,
/// `allocated` false), or allocated (`allocated` true, `matched_id` unset).
/// The mutation operations in [`crate::workflow`] maintain this invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransaction {
    /// Unique identifier, minted at parse time and never reused
    pub id: String,
    /// Primary date used for matching and filtering (raw statement string)
    pub date: String,
    /// Optional statement reference number
    pub nr: Option<String>,
    /// Optional account reference from the statement
    pub account: Option<String>,
    /// Posting date as exported by the bank (raw string)
    pub posting_date: Option<String>,
    /// Transaction date as exported by the bank (raw string)
    pub transaction_date: Option<String>,
    /// Narrative description (required)
    pub description: String,
    /// Unedited description, preferred for counterparty matching when present
    pub original_description: Option<String>,
    /// Parent category as exported by the bank
    pub parent_category: Option<String>,
    /// Category as exported by the bank
    pub statement_category: Option<String>,
    /// Signed net amount: negative = money out, positive = money in
    pub amount: f64,
    /// ISO currency code, upper-cased
    pub currency: String,
    /// Raw money-in column value, kept for provenance and export
    pub money_in: Option<f64>,
    /// Raw money-out column value, kept for provenance and export
    pub money_out: Option<f64>,
    /// Raw fee column value
    pub fee: Option<f64>,
    /// Running balance, when the statement provides one
    pub balance: Option<f64>,
    /// Set when the user has flipped a misread direction
    pub direction_override: Option<Direction>,
    /// Kind of the matched document, if any
    pub matched_kind: Option<DocKind>,
    /// Id of the matched document, if any
    pub matched_id: Option<String>,
    /// True when the user has manually allocated this transaction
    pub allocated: bool,
    /// Direction recorded with a manual allocation
    pub allocation_direction: Option<Direction>,
    /// Free-text category for a manual allocation
    pub allocation_category: Option<String>,
    /// Ledger account code for a manual allocation
    pub allocation_account_code: Option<String>,
    /// Tax treatment for a manual allocation
    pub allocation_tax_treatment: Option<String>,
    /// Free-text notes for a manual allocation
    pub allocation_notes: Option<String>,
}

impl BankTransaction {
    /// Create a minimal transaction with a fresh id
    pub fn new(date: String, description: String, amount: f64, currency: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            nr: None,
            account: None,
            posting_date: None,
            transaction_date: None,
            description,
            original_description: None,
            parent_category: None,
            statement_category: None,
            amount,
            currency,
            money_in: None,
            money_out: None,
            fee: None,
            balance: None,
            direction_override: None,
            matched_kind: None,
            matched_id: None,
            allocated: false,
            allocation_direction: None,
            allocation_category: None,
            allocation_account_code: None,
            allocation_tax_treatment: None,
            allocation_notes: None,
        }
    }

    /// True when the transaction is matched to a document
    pub fn is_matched(&self) -> bool {
        self.matched_id.is_some()
    }

    /// True when the transaction is neither matched nor allocated
    pub fn is_unmatched(&self) -> bool {
        !self.is_matched() && !self.allocated
    }

    /// The counterparty string used for rule matching and text scoring
    pub fn counterparty_name(&self) -> &str {
        let original = self
            .original_description
            .as_deref()
            .map(str::trim)
            .unwrap_or("");
        if original.is_empty() {
            self.description.trim()
        } else {
            original
        }
    }
}

/// Read-only receipt projection supplied by the document subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptSummary {
    pub id: String,
    pub status: String,
    pub vendor: Option<String>,
    pub receipt_date: Option<String>,
    pub created_at: String,
    pub currency: String,
    pub total_amount: Option<f64>,
}

impl ReceiptSummary {
    /// Vendor name for display and text scoring
    pub fn display_name(&self) -> String {
        self.vendor
            .clone()
            .unwrap_or_else(|| "Unknown vendor".to_string())
    }
}

/// Read-only invoice projection supplied by the document subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub id: String,
    pub workflow_status: String,
    pub client_name: Option<String>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<String>,
    pub created_at: String,
    pub currency: String,
    pub total_amount: Option<f64>,
}

impl InvoiceSummary {
    /// Client name plus invoice number when present
    pub fn display_name(&self) -> String {
        let client = self
            .client_name
            .clone()
            .unwrap_or_else(|| "Unknown client".to_string());
        match &self.invoice_number {
            Some(nr) => format!("{client} • {nr}"),
            None => client,
        }
    }
}

/// A proposed document match for one transaction
///
/// Suggestions are ephemeral: they are recomputed from the current
/// transaction and document state on every matching pass and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSuggestion {
    pub kind: DocKind,
    pub id: String,
    /// Human-readable summary: "{name} • {day key} • {amount}"
    pub label: String,
    /// Composite confidence in `[0, 1]`
    pub score: f64,
}

/// Which screen drove a batch operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchSource {
    Reconciliation,
    CatchUp,
}

/// What a batch operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAction {
    MatchSuggestedBatch,
    PostBatch,
}

/// Append-only audit record of one batch operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStat {
    pub id: String,
    pub company_id: String,
    /// RFC 3339 timestamp assigned when the record is appended
    pub created_at: String,
    pub source: BatchSource,
    pub action: BatchAction,
    pub batch_size: usize,
    pub page_index: usize,
    /// Rows the operation touched
    pub applied: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub notes: Option<String>,
}

/// Which document kind a counterparty rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAppliesTo {
    Receipt,
    Invoice,
    Both,
}

/// How a rule's `match_value` is compared against the counterparty name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMatchType {
    Contains,
    Equals,
    Regex,
}

/// User-defined counterparty rule, consumed as an ordered feed
///
/// The first enabled rule whose `match_value` matches the counterparty name
/// wins. All comparisons are case-insensitive; an invalid `regex` pattern
/// disables that rule only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub enabled: bool,
    pub applies_to: RuleAppliesTo,
    pub match_type: RuleMatchType,
    pub match_value: String,
    pub set_category: String,
    pub set_tax_treatment: String,
    pub set_account_code: String,
    pub set_document_type: String,
    pub set_payment_method: String,
    pub auto_approve_max_total: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

impl Rule {
    /// A blank, enabled rule applying to both document kinds
    pub fn blank() -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            enabled: true,
            applies_to: RuleAppliesTo::Both,
            match_type: RuleMatchType::Contains,
            match_value: String::new(),
            set_category: String::new(),
            set_tax_treatment: String::new(),
            set_account_code: String::new(),
            set_document_type: String::new(),
            set_payment_method: String::new(),
            auto_approve_max_total: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Errors that can occur in the reconciliation core
///
/// Every variant is recoverable: a failed import or batch action leaves prior
/// state untouched and the caller may retry with a corrected file or an
/// explicit column mapping.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("This file looks like a spreadsheet. Export the statement as delimited text (CSV) and retry.")]
    SpreadsheetUpload,
    #[error("The statement file is empty.")]
    EmptyFile,
    #[error("Could not detect required columns ({0}). Supply an explicit column mapping.")]
    ColumnsNotDetected(String),
    #[error("Mapped column '{0}' was not found in the header row.")]
    MappedColumnMissing(String),
    #[error("No rows parsed. Check the statement format or the column mapping.")]
    NoRowsParsed,
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_round_trips_with_snake_case_enums() {
        let mut t = BankTransaction::new(
            "2024-03-01".to_string(),
            "Woolworths".to_string(),
            -45.0,
            "ZAR".to_string(),
        );
        t.matched_kind = Some(DocKind::Receipt);
        t.matched_id = Some("r1".to_string());
        t.allocation_direction = Some(Direction::MoneyOut);

        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["matched_kind"], "receipt");
        assert_eq!(json["allocation_direction"], "money_out");

        let back: BankTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn batch_stat_round_trips_with_snake_case_enums() {
        let stat = BatchStat {
            id: "s1".to_string(),
            company_id: "co".to_string(),
            created_at: "2024-03-01T08:00:00+00:00".to_string(),
            source: BatchSource::CatchUp,
            action: BatchAction::MatchSuggestedBatch,
            batch_size: 50,
            page_index: 0,
            applied: 3,
            succeeded: 3,
            failed: 0,
            notes: None,
        };

        let json = serde_json::to_value(&stat).unwrap();
        assert_eq!(json["source"], "catch_up");
        assert_eq!(json["action"], "match_suggested_batch");

        let back: BatchStat = serde_json::from_value(json).unwrap();
        assert_eq!(back, stat);
    }
}
