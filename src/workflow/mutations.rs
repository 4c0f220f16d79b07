//! Per-transaction mutations: link, unlink, flip, allocate, unallocate
//!
//! A transaction is in exactly one of three states (unmatched, matched,
//! allocated); every mutation here clears the states it leaves.

use crate::types::{
    BankTransaction, Direction, DocKind, ReconcileError, ReconcileResult,
};

fn find_mut<'a>(
    txns: &'a mut [BankTransaction],
    txn_id: &str,
) -> ReconcileResult<&'a mut BankTransaction> {
    txns.iter_mut()
        .find(|t| t.id == txn_id)
        .ok_or_else(|| ReconcileError::TransactionNotFound(txn_id.to_string()))
}

fn clear_allocation_fields(txn: &mut BankTransaction) {
    txn.allocated = false;
    txn.allocation_direction = None;
    txn.allocation_category = None;
    txn.allocation_account_code = None;
    txn.allocation_tax_treatment = None;
    txn.allocation_notes = None;
}

/// Explicitly match one transaction to one document
pub fn link(
    txns: &mut [BankTransaction],
    txn_id: &str,
    kind: DocKind,
    doc_id: &str,
) -> ReconcileResult<()> {
    let txn = find_mut(txns, txn_id)?;
    txn.matched_kind = Some(kind);
    txn.matched_id = Some(doc_id.to_string());
    clear_allocation_fields(txn);
    Ok(())
}

/// Clear a transaction's match, leaving it unmatched
pub fn unlink(txns: &mut [BankTransaction], txn_id: &str) -> ReconcileResult<()> {
    let txn = find_mut(txns, txn_id)?;
    txn.matched_kind = None;
    txn.matched_id = None;
    Ok(())
}

/// Flip a misread direction.
///
/// Negates the amount, swaps the raw money in/out values, and clears any
/// match or override, since the flip changes which document index applies.
/// The allocation direction is set to the opposite of the prior sign.
pub fn flip_direction(txns: &mut [BankTransaction], txn_id: &str) -> ReconcileResult<()> {
    let txn = find_mut(txns, txn_id)?;
    let new_direction = Direction::from_amount(txn.amount).flipped();
    txn.amount = -txn.amount;
    std::mem::swap(&mut txn.money_in, &mut txn.money_out);
    txn.direction_override = None;
    txn.matched_kind = None;
    txn.matched_id = None;
    txn.allocated = false;
    txn.allocation_direction = Some(new_direction);
    Ok(())
}

/// Partial update applied by [`allocate`]; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationUpdate {
    pub allocated: Option<bool>,
    pub direction: Option<Direction>,
    pub category: Option<String>,
    pub account_code: Option<String>,
    pub tax_treatment: Option<String>,
    pub notes: Option<String>,
}

/// Record (or edit) a manual allocation for a transaction with no document.
///
/// Clears any existing match. The direction defaults to the one implied by
/// the transaction's sign when neither the update nor the transaction has
/// one.
pub fn allocate(
    txns: &mut [BankTransaction],
    txn_id: &str,
    update: AllocationUpdate,
) -> ReconcileResult<()> {
    let txn = find_mut(txns, txn_id)?;
    txn.matched_kind = None;
    txn.matched_id = None;
    if let Some(allocated) = update.allocated {
        txn.allocated = allocated;
    }
    txn.allocation_direction = update
        .direction
        .or(txn.allocation_direction)
        .or(Some(Direction::from_amount(txn.amount)));
    if let Some(category) = update.category {
        txn.allocation_category = Some(category);
    }
    if let Some(account_code) = update.account_code {
        txn.allocation_account_code = Some(account_code);
    }
    if let Some(tax_treatment) = update.tax_treatment {
        txn.allocation_tax_treatment = Some(tax_treatment);
    }
    if let Some(notes) = update.notes {
        txn.allocation_notes = Some(notes);
    }
    Ok(())
}

/// Clear the whole allocation sub-record
pub fn unallocate(txns: &mut [BankTransaction], txn_id: &str) -> ReconcileResult<()> {
    let txn = find_mut(txns, txn_id)?;
    clear_allocation_fields(txn);
    Ok(())
}
