//! Matching Engine: propose at most one candidate document per transaction

pub mod dates;
pub mod engine;
pub mod index;

pub use engine::{
    build_suggestions, build_used_doc_ids, normalize_text, quick_candidates, MatchConfig,
    QuickCandidate,
};
pub use index::{cents, DocumentIndex};
