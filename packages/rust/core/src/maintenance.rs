//! Explicit reconciliation between the store and the corpus directory.
//!
//! Indexing never deletes records. These operations are the only way a
//! record whose file has disappeared leaves the store.

use std::collections::BTreeSet;

use tracing::{info, instrument};

use flowindex_shared::Result;
use flowindex_storage::IndexStore;

use crate::scanner::CorpusScanner;

/// Indexed filenames with no file in the corpus.
///
/// A missing corpus root is an error rather than "everything is orphaned".
pub async fn find_orphans(store: &IndexStore, scanner: &CorpusScanner) -> Result<Vec<String>> {
    let on_disk: BTreeSet<String> = scanner.file_names()?.into_iter().collect();
    Ok(store
        .list_filenames()
        .await?
        .into_iter()
        .filter(|f| !on_disk.contains(f))
        .collect())
}

/// Delete every orphaned record. Returns the removed filenames.
#[instrument(skip_all, fields(root = %scanner.root().display()))]
pub async fn prune_orphans(store: &IndexStore, scanner: &CorpusScanner) -> Result<Vec<String>> {
    let orphans = find_orphans(store, scanner).await?;
    let mut removed = Vec::with_capacity(orphans.len());
    for filename in orphans {
        if store.delete(&filename).await? {
            removed.push(filename);
        }
    }
    info!(removed = removed.len(), "orphaned records pruned");
    Ok(removed)
}

/// Corpus files with no record in the store.
pub async fn find_unindexed(store: &IndexStore, scanner: &CorpusScanner) -> Result<Vec<String>> {
    let indexed: BTreeSet<String> = store.list_filenames().await?.into_iter().collect();
    Ok(scanner
        .file_names()?
        .into_iter()
        .filter(|f| !indexed.contains(f))
        .collect())
}
