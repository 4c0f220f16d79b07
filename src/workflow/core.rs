//! Main reconciliation orchestrator coordinating import, matching,
//! allocation, and the batch-stat ledger over a storage backend

use std::collections::HashMap;

use tracing::info;

use crate::matching::{build_suggestions, MatchConfig};
use crate::statement::{parse_statement, parse_statement_with_mapping, ColumnMapping};
use crate::stats::{append_batch_stat, BatchOutcome};
use crate::traits::ReconcileStore;
use crate::types::*;
use crate::workflow::batch::{
    allocate_suggested_on_page, match_suggested_on_page, queue_page, BatchFilter, BatchPage,
    DEFAULT_BATCH_SIZE,
};
use crate::workflow::export::export_allocations;
use crate::workflow::mutations::{self, AllocationUpdate};

/// Progress summary across a company's whole transaction collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileTotals {
    /// Transactions matched to a document
    pub linked: usize,
    /// Unmatched transactions that currently have a suggestion
    pub suggested: usize,
    /// Unmatched money out
    pub missing_out: usize,
    /// Unmatched money in
    pub missing_in: usize,
}

impl ReconcileTotals {
    /// Derive the summary from a collection and its current suggestion map
    pub fn from_collection(
        txns: &[BankTransaction],
        suggestions: &HashMap<String, Option<MatchSuggestion>>,
    ) -> Self {
        let mut totals = Self::default();
        for t in txns {
            if t.is_matched() {
                totals.linked += 1;
                continue;
            }
            if t.amount < 0.0 {
                totals.missing_out += 1;
            } else if t.amount > 0.0 {
                totals.missing_in += 1;
            }
            if matches!(suggestions.get(&t.id), Some(Some(_))) {
                totals.suggested += 1;
            }
        }
        totals
    }
}

/// Reconciliation system that orchestrates all operations for one company
pub struct Reconciler<S: ReconcileStore> {
    storage: S,
    company_id: String,
    batch_size: usize,
    match_config: MatchConfig,
}

impl<S: ReconcileStore> Reconciler<S> {
    /// Create a reconciler with the given storage backend
    pub fn new(storage: S, company_id: impl Into<String>) -> Self {
        Self {
            storage,
            company_id: company_id.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            match_config: MatchConfig::default(),
        }
    }

    /// Create a reconciler with a custom page size and match configuration
    pub fn with_config(
        storage: S,
        company_id: impl Into<String>,
        batch_size: usize,
        match_config: MatchConfig,
    ) -> Self {
        Self {
            storage,
            company_id: company_id.into(),
            batch_size: batch_size.max(1),
            match_config,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    // Statement import

    /// Parse a statement file and append its transactions to the collection
    pub async fn import_statement(&mut self, bytes: &[u8]) -> ReconcileResult<usize> {
        let parsed = parse_statement(bytes)?;
        self.append_imported(parsed).await
    }

    /// Parse a statement file using a caller-supplied column mapping
    pub async fn import_statement_with_mapping(
        &mut self,
        bytes: &[u8],
        mapping: &ColumnMapping,
    ) -> ReconcileResult<usize> {
        let parsed = parse_statement_with_mapping(bytes, mapping)?;
        self.append_imported(parsed).await
    }

    async fn append_imported(&mut self, parsed: Vec<BankTransaction>) -> ReconcileResult<usize> {
        let imported = parsed.len();
        let mut txns = self.storage.load_transactions(&self.company_id).await?;
        txns.extend(parsed);
        self.storage
            .save_transactions(&self.company_id, &txns)
            .await?;
        info!(company_id = %self.company_id, imported, "statement imported");
        Ok(imported)
    }

    /// List the full transaction collection
    pub async fn transactions(&self) -> ReconcileResult<Vec<BankTransaction>> {
        self.storage.load_transactions(&self.company_id).await
    }

    /// Drop every transaction for the company
    pub async fn clear_transactions(&mut self) -> ReconcileResult<()> {
        self.storage.save_transactions(&self.company_id, &[]).await
    }

    /// One page of the filtered queue plus the clamped paging state
    pub async fn page(
        &self,
        filter: BatchFilter,
        page_index: usize,
    ) -> ReconcileResult<(Vec<BankTransaction>, BatchPage)> {
        let txns = self.storage.load_transactions(&self.company_id).await?;
        let (rows, page) = queue_page(&txns, filter, self.batch_size, page_index);
        Ok((rows.into_iter().map(|i| txns[i].clone()).collect(), page))
    }

    // Matching

    /// Best suggestion (or None) per unmatched transaction
    pub async fn suggestions(
        &self,
        receipts: &[ReceiptSummary],
        invoices: &[InvoiceSummary],
    ) -> ReconcileResult<HashMap<String, Option<MatchSuggestion>>> {
        let txns = self.storage.load_transactions(&self.company_id).await?;
        Ok(build_suggestions(
            &txns,
            receipts,
            invoices,
            &self.match_config,
        ))
    }

    // Per-transaction mutations

    /// Match one transaction to one document
    pub async fn link(
        &mut self,
        txn_id: &str,
        kind: DocKind,
        doc_id: &str,
    ) -> ReconcileResult<()> {
        self.mutate(|txns| mutations::link(txns, txn_id, kind, doc_id))
            .await
    }

    /// Clear a transaction's match
    pub async fn unlink(&mut self, txn_id: &str) -> ReconcileResult<()> {
        self.mutate(|txns| mutations::unlink(txns, txn_id)).await
    }

    /// Flip a transaction whose direction the bank feed got wrong
    pub async fn flip_direction(&mut self, txn_id: &str) -> ReconcileResult<()> {
        self.mutate(|txns| mutations::flip_direction(txns, txn_id))
            .await
    }

    /// Record or edit a manual allocation
    pub async fn allocate(
        &mut self,
        txn_id: &str,
        update: AllocationUpdate,
    ) -> ReconcileResult<()> {
        self.mutate(|txns| mutations::allocate(txns, txn_id, update))
            .await
    }

    /// Clear a transaction's allocation sub-record
    pub async fn unallocate(&mut self, txn_id: &str) -> ReconcileResult<()> {
        self.mutate(|txns| mutations::unallocate(txns, txn_id)).await
    }

    async fn mutate<F>(&mut self, f: F) -> ReconcileResult<()>
    where
        F: FnOnce(&mut [BankTransaction]) -> ReconcileResult<()>,
    {
        let mut txns = self.storage.load_transactions(&self.company_id).await?;
        f(&mut txns)?;
        self.storage
            .save_transactions(&self.company_id, &txns)
            .await
    }

    // Bulk page actions

    /// Apply every available suggestion on one page and record the batch
    pub async fn match_all_suggested(
        &mut self,
        receipts: &[ReceiptSummary],
        invoices: &[InvoiceSummary],
        source: BatchSource,
        page_index: usize,
    ) -> ReconcileResult<usize> {
        let mut txns = self.storage.load_transactions(&self.company_id).await?;
        let suggestions = build_suggestions(&txns, receipts, invoices, &self.match_config);
        let applied = match_suggested_on_page(
            &mut txns,
            &suggestions,
            BatchFilter::Pending,
            self.batch_size,
            page_index,
        );
        self.storage
            .save_transactions(&self.company_id, &txns)
            .await?;
        self.record_batch(
            source,
            BatchAction::MatchSuggestedBatch,
            page_index,
            BatchOutcome::applied(applied),
            None,
        )
        .await?;
        info!(company_id = %self.company_id, applied, page_index, "match-suggested batch");
        Ok(applied)
    }

    /// Rule-allocate every pending transaction on one page and record the batch
    pub async fn allocate_suggested(
        &mut self,
        rules: &[Rule],
        source: BatchSource,
        page_index: usize,
    ) -> ReconcileResult<usize> {
        let mut txns = self.storage.load_transactions(&self.company_id).await?;
        let applied = allocate_suggested_on_page(
            &mut txns,
            rules,
            BatchFilter::Pending,
            self.batch_size,
            page_index,
        );
        self.storage
            .save_transactions(&self.company_id, &txns)
            .await?;
        self.record_batch(
            source,
            BatchAction::MatchSuggestedBatch,
            page_index,
            BatchOutcome::applied(applied),
            Some("allocate_suggested".to_string()),
        )
        .await?;
        info!(company_id = %self.company_id, applied, page_index, "allocate-suggested batch");
        Ok(applied)
    }

    /// Record a post-batch outcome reported by the posting layer
    pub async fn record_post_batch(
        &mut self,
        source: BatchSource,
        page_index: usize,
        succeeded: usize,
        failed: usize,
        notes: Option<String>,
    ) -> ReconcileResult<BatchStat> {
        self.record_batch(
            source,
            BatchAction::PostBatch,
            page_index,
            BatchOutcome {
                applied: succeeded + failed,
                succeeded,
                failed,
            },
            notes,
        )
        .await
    }

    async fn record_batch(
        &mut self,
        source: BatchSource,
        action: BatchAction,
        page_index: usize,
        outcome: BatchOutcome,
        notes: Option<String>,
    ) -> ReconcileResult<BatchStat> {
        let mut history = self.storage.load_batch_stats(&self.company_id).await?;
        let stat = append_batch_stat(
            &mut history,
            &self.company_id,
            source,
            action,
            self.batch_size,
            page_index,
            outcome,
            notes,
        );
        self.storage
            .save_batch_stats(&self.company_id, &history)
            .await?;
        Ok(stat)
    }

    /// Batch history, newest first
    pub async fn batch_stats(&self) -> ReconcileResult<Vec<BatchStat>> {
        self.storage.load_batch_stats(&self.company_id).await
    }

    // Reporting

    /// Progress counts over the whole collection, given the document feeds
    pub async fn totals(
        &self,
        receipts: &[ReceiptSummary],
        invoices: &[InvoiceSummary],
    ) -> ReconcileResult<ReconcileTotals> {
        let txns = self.storage.load_transactions(&self.company_id).await?;
        let suggestions = build_suggestions(&txns, receipts, invoices, &self.match_config);
        Ok(ReconcileTotals::from_collection(&txns, &suggestions))
    }

    /// CSV of every allocated, unmatched transaction
    pub async fn export_allocations(&self) -> ReconcileResult<String> {
        let txns = self.storage.load_transactions(&self.company_id).await?;
        export_allocations(&txns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MemoryStore;

    fn txn(description: &str, amount: f64) -> BankTransaction {
        BankTransaction::new(
            "2024-03-01".to_string(),
            description.to_string(),
            amount,
            "ZAR".to_string(),
        )
    }

    fn receipt(id: &str, vendor: &str, date: &str, total: f64) -> ReceiptSummary {
        ReceiptSummary {
            id: id.to_string(),
            status: "processed".to_string(),
            vendor: Some(vendor.to_string()),
            receipt_date: Some(date.to_string()),
            created_at: format!("{date}T08:00:00Z"),
            currency: "ZAR".to_string(),
            total_amount: Some(total),
        }
    }

    async fn seeded(txns: Vec<BankTransaction>) -> Reconciler<MemoryStore> {
        let mut storage = MemoryStore::new();
        storage.save_transactions("co", &txns).await.unwrap();
        Reconciler::new(storage, "co")
    }

    #[tokio::test]
    async fn totals_partition_the_collection() {
        let mut txns = vec![txn("Woolworths", -250.0), txn("b", -20.0), txn("c", 30.0)];
        txns[1].matched_kind = Some(DocKind::Receipt);
        txns[1].matched_id = Some("r9".to_string());
        let reconciler = seeded(txns).await;

        let receipts = vec![receipt("r1", "Woolworths", "2024-03-01", 250.0)];
        let totals = reconciler.totals(&receipts, &[]).await.unwrap();
        assert_eq!(totals.linked, 1);
        assert_eq!(totals.suggested, 1);
        assert_eq!(totals.missing_out, 1);
        assert_eq!(totals.missing_in, 1);
    }

    #[tokio::test]
    async fn match_all_suggested_records_a_batch_stat() {
        let txns = vec![txn("Woolworths", -250.0)];
        let receipts = vec![receipt("r1", "Woolworths", "2024-03-01", 250.0)];
        let mut reconciler = seeded(txns).await;

        let applied = reconciler
            .match_all_suggested(&receipts, &[], BatchSource::Reconciliation, 0)
            .await
            .unwrap();
        assert_eq!(applied, 1);

        let txns = reconciler.transactions().await.unwrap();
        assert_eq!(txns[0].matched_id.as_deref(), Some("r1"));
        assert_eq!(txns[0].matched_kind, Some(DocKind::Receipt));

        let stats = reconciler.batch_stats().await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].action, BatchAction::MatchSuggestedBatch);
        assert_eq!(stats[0].source, BatchSource::Reconciliation);
        assert_eq!(stats[0].applied, 1);
    }

    #[tokio::test]
    async fn bulk_match_reaches_rows_behind_matched_ones() {
        // with a page size of 2, two already-matched rows must not occupy
        // the first page of the pending queue
        let mut txns = vec![txn("a", -10.0), txn("b", -10.0), txn("Woolworths", -250.0)];
        for (t, doc) in txns.iter_mut().zip(["r8", "r9"]) {
            t.matched_kind = Some(DocKind::Receipt);
            t.matched_id = Some(doc.to_string());
        }
        let receipts = vec![receipt("r1", "Woolworths", "2024-03-01", 250.0)];

        let mut storage = MemoryStore::new();
        storage.save_transactions("co", &txns).await.unwrap();
        let mut reconciler = Reconciler::with_config(storage, "co", 2, MatchConfig::default());

        let applied = reconciler
            .match_all_suggested(&receipts, &[], BatchSource::CatchUp, 0)
            .await
            .unwrap();
        assert_eq!(applied, 1);
        let txns = reconciler.transactions().await.unwrap();
        assert_eq!(txns[2].matched_id.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn page_serves_the_filtered_queue() {
        let mut txns = vec![txn("a", -10.0), txn("b", -20.0), txn("c", -30.0)];
        txns[0].matched_kind = Some(DocKind::Receipt);
        txns[0].matched_id = Some("r1".to_string());
        let reconciler = seeded(txns).await;

        let (pending, page) = reconciler.page(BatchFilter::Pending, 0).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|t| t.is_unmatched()));
        assert_eq!(page.count, 1);

        let (all, _) = reconciler.page(BatchFilter::All, 0).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn link_then_unlink_round_trips_state() {
        let txns = vec![txn("a", -10.0)];
        let id = txns[0].id.clone();
        let mut reconciler = seeded(txns).await;

        reconciler.link(&id, DocKind::Invoice, "inv1").await.unwrap();
        assert!(reconciler.transactions().await.unwrap()[0].is_matched());

        reconciler.unlink(&id).await.unwrap();
        assert!(reconciler.transactions().await.unwrap()[0].is_unmatched());
    }

    #[tokio::test]
    async fn record_post_batch_carries_failures() {
        let mut reconciler = seeded(vec![]).await;
        let stat = reconciler
            .record_post_batch(BatchSource::CatchUp, 2, 18, 2, Some("2 rejected".to_string()))
            .await
            .unwrap();
        assert_eq!(stat.action, BatchAction::PostBatch);
        assert_eq!(stat.succeeded, 18);
        assert_eq!(stat.failed, 2);
        assert_eq!(stat.notes.as_deref(), Some("2 rejected"));
    }
}
