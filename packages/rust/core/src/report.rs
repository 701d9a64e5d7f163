//! Reporting over the current index.

use flowindex_analyzer::CategoryMapper;
use flowindex_shared::Result;
use flowindex_storage::IndexStore;

/// Workflow count per category, `Uncategorized` last.
pub async fn category_report(store: &IndexStore, mapper: &CategoryMapper) -> Result<Vec<(String, usize)>> {
    let records = store.list_records().await?;
    Ok(mapper.tally(&records))
}

#[cfg(test)]
mod tests {
    use flowindex_analyzer::UNCATEGORIZED;

    use super::*;
    use crate::indexer::SilentProgress;
    use crate::test_support::{corpus, indexer_for, workflow_json, write_file};

    #[tokio::test]
    async fn counts_indexed_workflows_by_category() {
        let dir = corpus(2);
        write_file(&dir, "0010_stripe.json", &workflow_json("Charge", "stripe"));
        write_file(&dir, "0011_misc.json", &workflow_json("Misc", "set"));
        let indexer = indexer_for(&dir).await;
        indexer.run(false, &SilentProgress).await.unwrap();

        let rows = category_report(indexer.store(), &CategoryMapper::builtin())
            .await
            .unwrap();
        assert_eq!(
            rows,
            vec![
                ("Communication & Messaging".to_string(), 2),
                ("Financial & Accounting".to_string(), 1),
                (UNCATEGORIZED.to_string(), 1),
            ]
        );
    }
}
