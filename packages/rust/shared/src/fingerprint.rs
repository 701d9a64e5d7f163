//! Content fingerprints for change detection.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{FlowIndexError, Result};

/// SHA-256 hex digest of raw bytes.
pub fn content_fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Raw contents of one definition file plus its fingerprint.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Base file name (the record key).
    pub filename: String,
    pub bytes: Vec<u8>,
    pub fingerprint: String,
}

impl SourceFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let fingerprint = content_fingerprint(&bytes);
        Self {
            filename: filename.into(),
            bytes,
            fingerprint,
        }
    }

    /// Read a file from disk, keyed by its base name.
    pub fn read(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| FlowIndexError::validation(format!("{} has no file name", path.display())))?;
        let bytes = std::fs::read(path).map_err(|e| FlowIndexError::io(path, e))?;
        Ok(Self::new(filename, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// File name without a trailing `.json`.
    pub fn stem(&self) -> &str {
        self.filename
            .strip_suffix(".json")
            .unwrap_or(&self.filename)
    }
}
