//! Traits for storage abstraction

use async_trait::async_trait;

use crate::types::*;

/// Storage abstraction for the reconciliation core
///
/// The core is handed the full current collection on every call and hands the
/// full updated collection back; there is no partial-update surface. Any
/// key-value or relational store satisfies this trait. All methods are keyed
/// by the active company id — the core never holds cross-company state.
#[async_trait]
pub trait ReconcileStore: Send + Sync {
    /// Load the full transaction collection for a company
    async fn load_transactions(&self, company_id: &str) -> ReconcileResult<Vec<BankTransaction>>;

    /// Replace the full transaction collection for a company
    async fn save_transactions(
        &mut self,
        company_id: &str,
        txns: &[BankTransaction],
    ) -> ReconcileResult<()>;

    /// Load the batch-stat ledger for a company, newest first
    async fn load_batch_stats(&self, company_id: &str) -> ReconcileResult<Vec<BatchStat>>;

    /// Replace the batch-stat ledger for a company
    async fn save_batch_stats(
        &mut self,
        company_id: &str,
        stats: &[BatchStat],
    ) -> ReconcileResult<()>;
}
