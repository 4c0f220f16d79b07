//! Cent-bucket document index

use std::collections::HashMap;

use crate::matching::dates::day_key_from_doc_date;
use crate::types::{DocKind, InvoiceSummary, ReceiptSummary};

/// Integer cents for an amount, the bucket key for indexing and the window scan
pub fn cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// A document flattened for matching
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDoc {
    pub id: String,
    pub kind: DocKind,
    pub name: String,
    pub day_key: String,
    pub amount: f64,
}

/// Documents of one kind bucketed by exact cent amount.
///
/// Documents with no total amount are unmatchable and excluded.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    buckets: HashMap<i64, Vec<IndexedDoc>>,
}

impl DocumentIndex {
    pub fn from_receipts(receipts: &[ReceiptSummary]) -> Self {
        Self::build(receipts.iter().filter_map(|r| {
            Some(IndexedDoc {
                id: r.id.clone(),
                kind: DocKind::Receipt,
                name: r.display_name(),
                day_key: day_key_from_doc_date(r.receipt_date.as_deref(), &r.created_at),
                amount: r.total_amount?,
            })
        }))
    }

    pub fn from_invoices(invoices: &[InvoiceSummary]) -> Self {
        Self::build(invoices.iter().filter_map(|i| {
            Some(IndexedDoc {
                id: i.id.clone(),
                kind: DocKind::Invoice,
                name: i.display_name(),
                day_key: day_key_from_doc_date(i.invoice_date.as_deref(), &i.created_at),
                amount: i.total_amount?,
            })
        }))
    }

    fn build(docs: impl Iterator<Item = IndexedDoc>) -> Self {
        let mut buckets: HashMap<i64, Vec<IndexedDoc>> = HashMap::new();
        for doc in docs {
            buckets.entry(cents(doc.amount)).or_default().push(doc);
        }
        Self { buckets }
    }

    /// All documents whose total is exactly this many cents
    pub fn bucket(&self, cents: i64) -> &[IndexedDoc] {
        self.buckets.get(&cents).map(Vec::as_slice).unwrap_or(&[])
    }
}
