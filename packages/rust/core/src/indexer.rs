//! Incremental indexing pass.
//!
//! Scans the corpus, skips files whose fingerprint matches the stored one,
//! analyzes the rest and upserts their records. Per-file failures are logged
//! and collected in the [`IndexReport`]; only storage failures abort the pass.
//! A missing corpus root yields an empty report. Records of deleted files are
//! left alone.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use flowindex_analyzer::GraphAnalyzer;
use flowindex_shared::{FlowIndexError, IndexReport, Result, SourceFile, WorkflowDetail};
use flowindex_storage::IndexStore;

use crate::change::{ChangeDetector, ChangeStatus};
use crate::scanner::CorpusScanner;

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Trait for reporting indexing progress (implemented by CLI spinner, etc.).
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each file, whatever its outcome.
    fn file_processed(&self, filename: &str, current: usize, total: usize);
    /// Called when the pass completes.
    fn done(&self, report: &IndexReport);
}

/// No-op progress reporter for non-interactive use.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_processed(&self, _filename: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &IndexReport) {}
}

// ---------------------------------------------------------------------------
// Indexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Indexed,
    Unchanged,
}

/// Binds a corpus directory to the store and the analyzer.
pub struct Indexer {
    store: Arc<IndexStore>,
    analyzer: Arc<GraphAnalyzer>,
    scanner: CorpusScanner,
}

impl Indexer {
    pub fn new(store: Arc<IndexStore>, analyzer: Arc<GraphAnalyzer>, scanner: CorpusScanner) -> Self {
        Self {
            store,
            analyzer,
            scanner,
        }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn analyzer(&self) -> &GraphAnalyzer {
        &self.analyzer
    }

    pub fn scanner(&self) -> &CorpusScanner {
        &self.scanner
    }

    /// Run one indexing pass. With `force`, every file is re-analyzed.
    #[instrument(skip_all, fields(root = %self.scanner.root().display(), force = force))]
    pub async fn run(&self, force: bool, progress: &dyn ProgressReporter) -> Result<IndexReport> {
        let start = Instant::now();

        progress.phase("Scanning workflows");
        let files = match self.scanner.scan() {
            Ok(files) => files,
            Err(e @ FlowIndexError::CorpusUnavailable { .. }) => {
                warn!(error = %e, "corpus unavailable, nothing indexed");
                let report = IndexReport {
                    corpus_unavailable: true,
                    ..IndexReport::default()
                };
                progress.done(&report);
                return Ok(report);
            }
            Err(e) => return Err(e),
        };

        let run_id = self.store.begin_run().await?;
        let detector = ChangeDetector::new(self.store.fingerprints().await?, force);

        progress.phase("Indexing workflows");
        let total = files.len();
        let mut report = IndexReport::default();

        for (i, path) in files.iter().enumerate() {
            let filename = display_name(path);
            match self.index_file(path, &detector).await {
                Ok(FileOutcome::Indexed) => report.processed += 1,
                Ok(FileOutcome::Unchanged) => report.skipped += 1,
                Err(e) if e.is_per_file() => {
                    warn!(filename = %filename, error = %e, "skipping workflow");
                    report.record_failure(&filename, e.to_string());
                }
                Err(e) => return Err(e),
            }
            progress.file_processed(&filename, i + 1, total);
        }

        self.store.finish_run(&run_id, &report).await?;

        info!(
            processed = report.processed,
            skipped = report.skipped,
            errors = report.errors,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "index pass complete"
        );
        progress.done(&report);
        Ok(report)
    }

    async fn index_file(&self, path: &Path, detector: &ChangeDetector) -> Result<FileOutcome> {
        let source = SourceFile::read(path)?;
        if detector.status(&source) == ChangeStatus::Unchanged {
            debug!(filename = %source.filename, "unchanged");
            return Ok(FileOutcome::Unchanged);
        }
        let record = self.analyzer.analyze(&source)?;
        self.store.upsert(&record).await?;
        Ok(FileOutcome::Indexed)
    }

    /// Record, step narrative and diagram of one definition, built from its current file.
    pub fn detail(&self, filename: &str) -> Result<WorkflowDetail> {
        let source = match self.scanner.read(filename) {
            Ok(source) => source,
            Err(FlowIndexError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                return Err(FlowIndexError::NotFound(filename.to_string()));
            }
            Err(e) => return Err(e),
        };
        self.analyzer.detail(&source)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
