//! Ingest pipeline services
//!
//! Leaf-first: layout reconstruction and line splitting feed the field
//! extractor; the normalizer turns drafts into records; the reconciler and
//! record book guard the store; the coordinator ties them together.

pub mod duplicate_reconciler;
pub mod field_extractor;
pub mod import_coordinator;
pub mod layout_reconstructor;
pub mod line_splitter;
pub mod record_book;
pub mod record_normalizer;

pub use duplicate_reconciler::{
    find_conflicts, plan_reconciliation, DuplicateReconciler, IdentityKey, MaintenanceError,
    ReconciliationPlan, ReconciliationReport,
};
pub use field_extractor::{
    require_core_fields, ExtractionFailure, ExtractionResult, LineRule, PdfLabelExtractor,
    RuleSet, TextLabelExtractor,
};
pub use import_coordinator::{ImportCoordinator, ImportError, ImportOutcome};
pub use layout_reconstructor::{reconstruct, reconstruct_pages};
pub use line_splitter::split_lines;
pub use record_book::RecordBook;
pub use record_normalizer::{draft_from_row, drafts_from_rows, normalize, normalize_all};
