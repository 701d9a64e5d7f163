//! Indexing orchestration and catalog maintenance for flowindex.
//!
//! This crate ties the corpus scanner, change detection, the analyzer and the
//! index store together into an incremental indexing pass, a coalescing
//! background trigger, and explicit maintenance and export operations.

pub mod change;
pub mod export;
pub mod indexer;
pub mod maintenance;
pub mod reindex;
pub mod report;
pub mod scanner;

#[cfg(test)]
mod test_support;

pub use change::{ChangeDetector, ChangeStatus, detect};
pub use export::{ExportConfig, ExportReport, diagram_path, export_diagrams};
pub use indexer::{Indexer, ProgressReporter, SilentProgress};
pub use maintenance::{find_orphans, find_unindexed, prune_orphans};
pub use reindex::{ReindexTrigger, TriggerOutcome};
pub use report::category_report;
pub use scanner::CorpusScanner;
