//! Enumeration of workflow definition files.

use std::path::{Path, PathBuf};

use flowindex_shared::{FlowIndexError, Result, SourceFile};

/// Lists the `*.json` definition files directly inside a corpus directory.
#[derive(Debug, Clone)]
pub struct CorpusScanner {
    root: PathBuf,
}

impl CorpusScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Definition file paths sorted by file name. Subdirectories are not descended.
    ///
    /// A missing or non-directory root is [`FlowIndexError::CorpusUnavailable`].
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(FlowIndexError::CorpusUnavailable {
                path: self.root.clone(),
            });
        }

        let entries =
            std::fs::read_dir(&self.root).map_err(|e| FlowIndexError::io(&self.root, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FlowIndexError::io(&self.root, e))?;
            let path = entry.path();
            let is_json = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if is_json && path.is_file() {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Base names of [`scan`](Self::scan).
    pub fn file_names(&self) -> Result<Vec<String>> {
        Ok(self
            .scan()?
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect())
    }

    /// Path of a definition file by its base name.
    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Read one definition file by its base name.
    pub fn read(&self, filename: &str) -> Result<SourceFile> {
        SourceFile::read(&self.path_of(filename))
    }
}
