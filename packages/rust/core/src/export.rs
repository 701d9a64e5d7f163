//! Writes the flow diagram of every indexed workflow to `<stem>.mmd` files.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument, warn};

use flowindex_shared::{FileFailure, FlowIndexError, Result};

use crate::indexer::{Indexer, ProgressReporter};

/// Configuration for [`export_diagrams`].
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub out_dir: PathBuf,
    /// Replace existing diagram files instead of skipping them.
    pub overwrite: bool,
}

/// Outcome of an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub written: usize,
    /// Targets that already existed.
    pub conflicts: usize,
    pub errors: usize,
    pub failures: Vec<FileFailure>,
}

/// Export diagrams for every indexed workflow whose file is still present.
///
/// Per-item problems (existing target, unreadable or malformed source) are
/// reported and skipped; the rest of the batch proceeds.
#[instrument(skip_all, fields(out_dir = %config.out_dir.display(), overwrite = config.overwrite))]
pub async fn export_diagrams(
    indexer: &Indexer,
    config: &ExportConfig,
    progress: &dyn ProgressReporter,
) -> Result<ExportReport> {
    std::fs::create_dir_all(&config.out_dir).map_err(|e| FlowIndexError::io(&config.out_dir, e))?;

    progress.phase("Exporting diagrams");
    let filenames = indexer.store().list_filenames().await?;
    let total = filenames.len();
    let mut report = ExportReport::default();

    for (i, filename) in filenames.iter().enumerate() {
        match export_one(indexer, filename, config) {
            Ok(()) => report.written += 1,
            Err(e) if e.is_per_file() || matches!(e, FlowIndexError::NotFound(_)) => {
                warn!(filename = %filename, error = %e, "diagram not exported");
                if matches!(e, FlowIndexError::Conflict { .. }) {
                    report.conflicts += 1;
                } else {
                    report.errors += 1;
                }
                report.failures.push(FileFailure {
                    filename: filename.clone(),
                    message: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
        progress.file_processed(filename, i + 1, total);
    }

    info!(
        written = report.written,
        conflicts = report.conflicts,
        errors = report.errors,
        "diagram export complete"
    );
    Ok(report)
}

fn export_one(indexer: &Indexer, filename: &str, config: &ExportConfig) -> Result<()> {
    let target = diagram_path(&config.out_dir, filename);
    if target.exists() && !config.overwrite {
        return Err(FlowIndexError::Conflict { path: target });
    }
    let detail = indexer.detail(filename)?;
    std::fs::write(&target, detail.diagram).map_err(|e| FlowIndexError::io(&target, e))
}

/// `<out_dir>/<filename without .json>.mmd`
pub fn diagram_path(out_dir: &Path, filename: &str) -> PathBuf {
    let stem = filename.strip_suffix(".json").unwrap_or(filename);
    out_dir.join(format!("{stem}.mmd"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::SilentProgress;
    use crate::test_support::{corpus, indexer_for, temp_path};

    #[tokio::test]
    async fn writes_one_file_per_record() {
        let dir = corpus(2);
        let indexer = indexer_for(&dir).await;
        indexer.run(false, &SilentProgress).await.unwrap();
        let out = temp_path("diagrams");

        let config = ExportConfig {
            out_dir: out.clone(),
            overwrite: false,
        };
        let report = export_diagrams(&indexer, &config, &SilentProgress).await.unwrap();
        assert_eq!(report.written, 2);

        let text = std::fs::read_to_string(out.join("0000_wf.mmd")).unwrap();
        assert!(text.starts_with("graph TD"));
        assert!(text.contains("node0 --> node1"));
    }

    #[tokio::test]
    async fn existing_targets_are_conflicts() {
        let dir = corpus(2);
        let indexer = indexer_for(&dir).await;
        indexer.run(false, &SilentProgress).await.unwrap();
        let out = temp_path("diagrams");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("0001_wf.mmd"), "keep me").unwrap();

        let mut config = ExportConfig {
            out_dir: out.clone(),
            overwrite: false,
        };
        let report = export_diagrams(&indexer, &config, &SilentProgress).await.unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.conflicts, 1);
        assert_eq!(report.failures[0].filename, "0001_wf.json");
        assert_eq!(std::fs::read_to_string(out.join("0001_wf.mmd")).unwrap(), "keep me");

        config.overwrite = true;
        let report = export_diagrams(&indexer, &config, &SilentProgress).await.unwrap();
        assert_eq!(report.written, 2);
        assert_ne!(std::fs::read_to_string(out.join("0001_wf.mmd")).unwrap(), "keep me");
    }

    #[tokio::test]
    async fn missing_sources_are_reported() {
        let dir = corpus(2);
        let indexer = indexer_for(&dir).await;
        indexer.run(false, &SilentProgress).await.unwrap();
        std::fs::remove_file(dir.join("0000_wf.json")).unwrap();

        let config = ExportConfig {
            out_dir: temp_path("diagrams"),
            overwrite: false,
        };
        let report = export_diagrams(&indexer, &config, &SilentProgress).await.unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.errors, 1);
    }

    #[test]
    fn diagram_path_replaces_extension() {
        assert_eq!(
            diagram_path(Path::new("out"), "0001_a.json"),
            Path::new("out").join("0001_a.mmd")
        );
    }
}
