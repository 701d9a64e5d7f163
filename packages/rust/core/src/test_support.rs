//! Throw-away corpora and stores for tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use flowindex_analyzer::GraphAnalyzer;
use flowindex_storage::IndexStore;
use serde_json::json;
use uuid::Uuid;

use crate::indexer::Indexer;
use crate::scanner::CorpusScanner;

pub(crate) fn temp_path(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("flowindex_{prefix}_{}", Uuid::now_v7()))
}

/// A small valid definition: a webhook feeding one service node.
pub(crate) fn workflow_json(name: &str, service: &str) -> String {
    json!({
        "name": name,
        "active": true,
        "nodes": [
            {"id": "1", "name": "Hook", "type": "n8n-nodes-base.webhook", "parameters": {}},
            {"id": "2", "name": "Call", "type": format!("n8n-nodes-base.{service}"), "parameters": {}}
        ],
        "connections": {"Hook": {"main": [[{"node": "Call", "type": "main", "index": 0}]]}}
    })
    .to_string()
}

pub(crate) fn write_file(dir: &Path, filename: &str, contents: &str) {
    std::fs::write(dir.join(filename), contents).expect("write workflow");
}

/// A corpus directory with `count` valid definitions named `{i:04}_wf.json`.
pub(crate) fn corpus(count: usize) -> PathBuf {
    let dir = temp_path("corpus");
    std::fs::create_dir_all(&dir).expect("create corpus");
    for i in 0..count {
        write_file(
            &dir,
            &format!("{i:04}_wf.json"),
            &workflow_json(&format!("Workflow {i}"), "slack"),
        );
    }
    dir
}

pub(crate) async fn indexer_for(root: &Path) -> Indexer {
    let store = IndexStore::open(&temp_path("db").with_extension("db"))
        .await
        .expect("open store");
    Indexer::new(
        Arc::new(store),
        Arc::new(GraphAnalyzer::default()),
        CorpusScanner::new(root),
    )
}
