//! Reconciliation workflow: per-transaction mutations, fixed-size batch
//! paging with bulk actions, CSV export, and the orchestrator tying them
//! to a storage backend

pub mod batch;
pub mod core;
pub mod export;
pub mod mutations;

pub use batch::{
    allocate_suggested_on_page, match_suggested_on_page, page_bounds, queue_page, BatchFilter,
    BatchPage, DEFAULT_BATCH_SIZE,
};
pub use core::{ReconcileTotals, Reconciler};
pub use export::export_allocations;
pub use mutations::AllocationUpdate;
