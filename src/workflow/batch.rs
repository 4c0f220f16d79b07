//! Fixed-size paging over the work queue and the bulk actions that
//! operate on one page at a time.
//!
//! Pages are cut from the filtered queue, not the raw collection: as rows
//! get matched or allocated they leave the pending queue, so a page of
//! size N always holds N rows still needing work.

use std::collections::HashMap;

use crate::rules::{suggest_allocation, AllocationSuggestion};
use crate::types::{BankTransaction, MatchSuggestion, Rule};

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Which transactions form the pageable queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchFilter {
    /// Only transactions that are neither matched nor allocated
    #[default]
    Pending,
    /// The whole collection
    All,
}

/// One page of the queue plus the clamped paging state
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPage {
    /// Clamped page index actually served
    pub index: usize,
    /// Total number of pages (at least 1, even when empty)
    pub count: usize,
    pub start: usize,
    pub end: usize,
}

/// Compute the page bounds for `len` queue items.
///
/// The page count is never zero and a requested index past the end is
/// clamped to the last page, so a caller holding a stale index after the
/// queue shrinks still gets a valid page.
pub fn page_bounds(len: usize, batch_size: usize, requested_index: usize) -> BatchPage {
    let size = batch_size.max(1);
    let count = (len.div_ceil(size)).max(1);
    let index = requested_index.min(count - 1);
    let start = index * size;
    let end = (start + size).min(len);
    BatchPage {
        index,
        count,
        start,
        end,
    }
}

/// Collection indices of the queue rows on one page.
///
/// The queue is the filtered view of the collection in its original order;
/// the returned indices point back into the full collection so mutations
/// land on the right rows.
pub fn queue_page(
    txns: &[BankTransaction],
    filter: BatchFilter,
    batch_size: usize,
    requested_index: usize,
) -> (Vec<usize>, BatchPage) {
    let queue: Vec<usize> = txns
        .iter()
        .enumerate()
        .filter(|(_, t)| filter == BatchFilter::All || t.is_unmatched())
        .map(|(i, _)| i)
        .collect();
    let page = page_bounds(queue.len(), batch_size, requested_index);
    (queue[page.start..page.end].to_vec(), page)
}

/// Apply every available suggestion on one page of the queue.
///
/// Only transactions that are not already matched take a suggestion;
/// returns how many were matched.
pub fn match_suggested_on_page(
    txns: &mut [BankTransaction],
    suggestions: &HashMap<String, Option<MatchSuggestion>>,
    filter: BatchFilter,
    batch_size: usize,
    page_index: usize,
) -> usize {
    let (rows, _) = queue_page(txns, filter, batch_size, page_index);
    let mut applied = 0;
    for i in rows {
        let txn = &mut txns[i];
        if txn.is_matched() {
            continue;
        }
        if let Some(Some(suggestion)) = suggestions.get(&txn.id) {
            txn.matched_kind = Some(suggestion.kind);
            txn.matched_id = Some(suggestion.id.clone());
            txn.allocated = false;
            txn.allocation_direction = None;
            txn.allocation_category = None;
            txn.allocation_account_code = None;
            txn.allocation_tax_treatment = None;
            txn.allocation_notes = None;
            applied += 1;
        }
    }
    applied
}

fn apply_suggestion(txn: &mut BankTransaction, suggestion: AllocationSuggestion) {
    txn.allocated = true;
    txn.allocation_direction = Some(suggestion.direction);
    if suggestion.category.is_some() {
        txn.allocation_category = suggestion.category;
    }
    if suggestion.account_code.is_some() {
        txn.allocation_account_code = suggestion.account_code;
    }
    if suggestion.tax_treatment.is_some() {
        txn.allocation_tax_treatment = suggestion.tax_treatment;
    }
    if suggestion.notes.is_some() {
        txn.allocation_notes = suggestion.notes;
    }
}

/// Run the rule feed over one page of the queue and allocate every
/// transaction that is neither matched nor already allocated. Returns how
/// many were allocated.
pub fn allocate_suggested_on_page(
    txns: &mut [BankTransaction],
    rules: &[Rule],
    filter: BatchFilter,
    batch_size: usize,
    page_index: usize,
) -> usize {
    let (rows, _) = queue_page(txns, filter, batch_size, page_index);
    let mut applied = 0;
    for i in rows {
        let txn = &mut txns[i];
        if txn.is_matched() || txn.allocated {
            continue;
        }
        let suggestion = suggest_allocation(txn, rules);
        apply_suggestion(txn, suggestion);
        applied += 1;
    }
    applied
}
