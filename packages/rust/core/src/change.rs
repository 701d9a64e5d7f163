//! Fingerprint-based change detection.

use std::collections::BTreeMap;

use flowindex_shared::SourceFile;

/// Whether a file needs re-analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Unchanged,
    Changed,
}

/// `Unchanged` iff the fingerprints are equal and re-analysis is not forced.
///
/// A file with no stored fingerprint is always `Changed`.
pub fn detect(current: &str, stored: Option<&str>, force: bool) -> ChangeStatus {
    match stored {
        Some(stored) if !force && stored == current => ChangeStatus::Unchanged,
        _ => ChangeStatus::Changed,
    }
}

/// Stored fingerprints loaded once per pass.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    stored: BTreeMap<String, String>,
    force: bool,
}

impl ChangeDetector {
    pub fn new(stored: BTreeMap<String, String>, force: bool) -> Self {
        Self { stored, force }
    }

    pub fn status(&self, source: &SourceFile) -> ChangeStatus {
        detect(
            &source.fingerprint,
            self.stored.get(&source.filename).map(String::as_str),
            self.force,
        )
    }
}
