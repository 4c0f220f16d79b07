//! Batch Statistics Ledger: append-only audit history of batch actions

use crate::types::{BatchAction, BatchSource, BatchStat};

/// Maximum entries retained per company; oldest are silently dropped
pub const MAX_BATCH_STATS: usize = 200;

/// Counts reported by a batch operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub applied: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchOutcome {
    /// Outcome of an operation with no pass/fail distinction
    pub fn applied(count: usize) -> Self {
        Self {
            applied: count,
            succeeded: count,
            failed: 0,
        }
    }
}

/// Append one record to a newest-first history, enforcing the retention cap.
///
/// The history is a pure sink: nothing in the core reads it back except to
/// list it for operator visibility.
pub fn append_batch_stat(
    history: &mut Vec<BatchStat>,
    company_id: &str,
    source: BatchSource,
    action: BatchAction,
    batch_size: usize,
    page_index: usize,
    outcome: BatchOutcome,
    notes: Option<String>,
) -> BatchStat {
    let stat = BatchStat {
        id: uuid::Uuid::new_v4().to_string(),
        company_id: company_id.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
        source,
        action,
        batch_size,
        page_index,
        applied: outcome.applied,
        succeeded: outcome.succeeded,
        failed: outcome.failed,
        notes,
    };
    history.insert(0, stat.clone());
    history.truncate(MAX_BATCH_STATS);
    stat
}
