//! # Reconcile Core
//!
//! A bookkeeping reconciliation library covering bank-statement import,
//! document matching, manual allocation, and batch workflow tracking.
//!
//! ## Features
//!
//! - **Statement import**: Encoding and delimiter sniffing, quoted-field
//!   tokenizing, column auto-detection with a manual-mapping fallback, and
//!   three amount-derivation strategies for common bank export shapes
//! - **Document matching**: Cent-bucket candidate lookup with weighted
//!   amount/date/text scoring and one-document-per-transaction exclusivity
//! - **Allocation**: Manual categorization for transactions with no
//!   document, with rule-driven bulk suggestions
//! - **Batch workflow**: Fixed-size paging, bulk match/allocate actions, an
//!   append-only batch-stat ledger, and CSV export of allocated rows
//! - **Storage abstraction**: Database-agnostic design with trait-based
//!   storage keyed by company
//!
//! ## Quick Start
//!
//! ```rust
//! use reconcile_core::{MemoryStore, Reconciler};
//!
//! # async fn demo() -> reconcile_core::ReconcileResult<()> {
//! let storage = MemoryStore::new();
//! let mut reconciler = Reconciler::new(storage, "company-1");
//! let imported = reconciler
//!     .import_statement(b"Date,Description,Amount\n2024-03-01,Coffee,-35.00\n")
//!     .await?;
//! assert_eq!(imported, 1);
//! # Ok(())
//! # }
//! ```

pub mod matching;
pub mod rules;
pub mod statement;
pub mod stats;
pub mod traits;
pub mod types;
pub mod utils;
pub mod workflow;

// Re-export commonly used types
pub use matching::*;
pub use rules::*;
pub use statement::*;
pub use stats::*;
pub use traits::*;
pub use types::*;
pub use utils::*;
pub use workflow::*;
