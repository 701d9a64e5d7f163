//! libSQL-backed workflow index (offline, embedded).
//!
//! The [`IndexStore`] wraps a libSQL database holding one row per definition
//! file, an FTS5 inverted index kept in sync by triggers, and a journal of
//! indexing passes.
//!
//! **Access rules:**
//! - Indexing: read-write (sole writer) via [`IndexStore::open`]
//! - Query-only tooling: [`IndexStore::open_readonly`]
//!
//! Every upsert is a single statement, so readers observe either the previous
//! or the new version of a record and its text-index entry, never a mix.

mod migrations;
pub mod query;

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use flowindex_shared::{
    Complexity, FlowIndexError, IndexReport, IndexStats, PageRequest, Result, SearchFilters,
    SearchPage, TriggerType, WorkflowRecord,
};
use libsql::params::Params;
use libsql::{Connection, Database, Value, params};
use tracing::{debug, instrument};
use uuid::Uuid;

pub use query::fts_expression;

/// Columns read back into a [`WorkflowRecord`], in `row_to_record` order.
const RECORD_COLUMNS: &str = "w.filename, w.name, w.workflow_id, w.active, w.description, \
     w.trigger_type, w.complexity, w.node_count, w.integrations, w.tags, \
     w.created_at, w.updated_at, w.file_hash, w.file_size, w.analyzed_at";

/// Primary storage handle wrapping a libSQL database.
pub struct IndexStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// One recorded indexing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRun {
    pub id: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub stats_json: Option<String>,
}

/// How long a connection waits on a lock held by another connection.
const BUSY_TIMEOUT_PRAGMA: &str = "PRAGMA busy_timeout = 5000";

impl IndexStore {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| FlowIndexError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;

        let store = Self {
            db,
            conn,
            readonly: false,
        };
        // WAL lets readers keep their snapshot while an index pass commits.
        store.pragma("PRAGMA journal_mode = WAL").await?;
        store.pragma(BUSY_TIMEOUT_PRAGMA).await?;
        store.run_migrations().await?;
        Ok(store)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FlowIndexError::NotFound(format!(
                "database {} (run `flowindex index` first)",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;

        let store = Self {
            db,
            conn,
            readonly: true,
        };
        store.pragma(BUSY_TIMEOUT_PRAGMA).await?;
        Ok(store)
    }

    /// Run a pragma, discarding the row it reports.
    async fn pragma(&self, sql: &str) -> Result<()> {
        let mut rows = self
            .conn
            .query(sql, params![])
            .await
            .map_err(|e| FlowIndexError::Storage(format!("{sql}: {e}")))?;
        while rows
            .next()
            .await
            .map_err(|e| FlowIndexError::Storage(format!("{sql}: {e}")))?
            .is_some()
        {}
        Ok(())
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        FlowIndexError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 if no migrations have been applied.
    async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(FlowIndexError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Workflow records
    // -----------------------------------------------------------------------

    /// Insert a record, or replace every field of the record with the same filename.
    ///
    /// The row keeps its id, and the update trigger swaps the text-index entry
    /// in the same statement.
    pub async fn upsert(&self, record: &WorkflowRecord) -> Result<()> {
        self.check_writable()?;
        let integrations = serde_json::to_string(&record.integrations)
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;
        let tags = serde_json::to_string(&record.tags)
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO workflows (filename, name, workflow_id, active, description, trigger_type,
                    complexity, node_count, integrations, tags, created_at, updated_at,
                    file_hash, file_size, analyzed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                 ON CONFLICT(filename) DO UPDATE SET
                   name = excluded.name,
                   workflow_id = excluded.workflow_id,
                   active = excluded.active,
                   description = excluded.description,
                   trigger_type = excluded.trigger_type,
                   complexity = excluded.complexity,
                   node_count = excluded.node_count,
                   integrations = excluded.integrations,
                   tags = excluded.tags,
                   created_at = excluded.created_at,
                   updated_at = excluded.updated_at,
                   file_hash = excluded.file_hash,
                   file_size = excluded.file_size,
                   analyzed_at = excluded.analyzed_at",
                params![
                    record.filename.as_str(),
                    record.name.as_str(),
                    record.workflow_id.as_str(),
                    i64::from(record.active),
                    record.description.as_str(),
                    record.trigger_type.as_str(),
                    record.complexity.as_str(),
                    record.node_count as i64,
                    integrations,
                    tags,
                    record.created_at.as_deref(),
                    record.updated_at.as_deref(),
                    record.file_hash.as_str(),
                    record.file_size as i64,
                    timestamp(&record.analyzed_at),
                ],
            )
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get the record for a filename.
    pub async fn get(&self, filename: &str) -> Result<Option<WorkflowRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM workflows w WHERE w.filename = ?1");
        let mut rows = self
            .conn
            .query(&sql, params![filename])
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_record(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(FlowIndexError::Storage(e.to_string())),
        }
    }

    /// Stored fingerprint of a filename, if it is indexed.
    pub async fn fingerprint_of(&self, filename: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT file_hash FROM workflows WHERE filename = ?1",
                params![filename],
            )
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(
                row.get::<String>(0)
                    .map_err(|e| FlowIndexError::Storage(e.to_string()))?,
            )),
            Ok(None) => Ok(None),
            Err(e) => Err(FlowIndexError::Storage(e.to_string())),
        }
    }

    /// Every stored `filename → fingerprint` pair.
    pub async fn fingerprints(&self) -> Result<BTreeMap<String, String>> {
        let mut rows = self
            .conn
            .query("SELECT filename, file_hash FROM workflows", params![])
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;

        let mut results = BTreeMap::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?
        {
            results.insert(
                row.get::<String>(0)
                    .map_err(|e| FlowIndexError::Storage(e.to_string()))?,
                row.get::<String>(1)
                    .map_err(|e| FlowIndexError::Storage(e.to_string()))?,
            );
        }
        Ok(results)
    }

    /// All indexed filenames, sorted.
    pub async fn list_filenames(&self) -> Result<Vec<String>> {
        Ok(self.fingerprints().await?.into_keys().collect())
    }

    /// All records, sorted by filename.
    pub async fn list_records(&self) -> Result<Vec<WorkflowRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM workflows w ORDER BY w.filename");
        self.query_records(&sql, Params::None).await
    }

    /// Delete a record by filename. Returns whether a row was removed.
    ///
    /// Only maintenance calls this; indexing never deletes.
    pub async fn delete(&self, filename: &str) -> Result<bool> {
        self.check_writable()?;
        let affected = self
            .conn
            .execute("DELETE FROM workflows WHERE filename = ?1", params![filename])
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;
        Ok(affected > 0)
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Ranked, filtered and sliced search.
    ///
    /// With searchable text, candidates are ordered by FTS rank; otherwise all
    /// records are listed newest analysis first. `total` counts the filtered
    /// candidates before `limit`/`offset` are applied.
    #[instrument(skip_all, fields(query = %text, limit = limit, offset = offset))]
    pub async fn search(
        &self,
        text: &str,
        filters: &SearchFilters,
        limit: usize,
        offset: usize,
    ) -> Result<SearchPage> {
        let mut args: Vec<Value> = Vec::new();

        let (from, order) = match fts_expression(text) {
            Some(expr) => {
                args.push(Value::Text(expr));
                (
                    "FROM workflows_fts JOIN workflows w ON w.id = workflows_fts.rowid \
                     WHERE workflows_fts MATCH ?",
                    "ORDER BY workflows_fts.rank, w.id",
                )
            }
            None => (
                "FROM workflows w WHERE 1 = 1",
                "ORDER BY w.analyzed_at DESC, w.id DESC",
            ),
        };

        let mut conditions = String::new();
        if let Some(trigger) = filters.trigger {
            conditions.push_str(" AND w.trigger_type = ?");
            args.push(Value::Text(trigger.as_str().to_string()));
        }
        if let Some(complexity) = filters.complexity {
            conditions.push_str(" AND w.complexity = ?");
            args.push(Value::Text(complexity.as_str().to_string()));
        }
        if filters.active_only {
            conditions.push_str(" AND w.active = 1");
        }

        let count_sql = format!("SELECT COUNT(*) {from}{conditions}");
        let mut rows = self
            .conn
            .query(&count_sql, Params::Positional(args.clone()))
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;
        let total = match rows.next().await {
            Ok(Some(row)) => row
                .get::<i64>(0)
                .map_err(|e| FlowIndexError::Storage(e.to_string()))?
                as usize,
            Ok(None) => 0,
            Err(e) => return Err(FlowIndexError::Storage(e.to_string())),
        };

        let page_sql = format!("SELECT {RECORD_COLUMNS} {from}{conditions} {order} LIMIT ? OFFSET ?");
        args.push(Value::Integer(limit as i64));
        args.push(Value::Integer(offset as i64));
        let records = self
            .query_records(&page_sql, Params::Positional(args))
            .await?;

        debug!(total, returned = records.len(), "search complete");
        Ok(SearchPage { records, total })
    }

    /// [`search`](Self::search) addressed by 1-based page.
    pub async fn search_page(
        &self,
        text: &str,
        filters: &SearchFilters,
        page: PageRequest,
    ) -> Result<SearchPage> {
        self.search(text, filters, page.limit(), page.offset()).await
    }

    async fn query_records(&self, sql: &str, args: Params) -> Result<Vec<WorkflowRecord>> {
        let mut rows = self
            .conn
            .query(sql, args)
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?
        {
            results.push(row_to_record(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Aggregates
    // -----------------------------------------------------------------------

    /// Aggregate statistics over the current records.
    pub async fn stats(&self) -> Result<IndexStats> {
        let mut stats = IndexStats {
            triggers: TriggerType::ALL
                .iter()
                .map(|t| (t.as_str().to_string(), 0))
                .collect(),
            complexity: Complexity::ALL
                .iter()
                .map(|c| (c.as_str().to_string(), 0))
                .collect(),
            ..IndexStats::default()
        };

        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*), COALESCE(SUM(active), 0), COALESCE(SUM(node_count), 0)
                 FROM workflows",
                params![],
            )
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;
        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?
        {
            stats.total = row
                .get::<i64>(0)
                .map_err(|e| FlowIndexError::Storage(e.to_string()))? as usize;
            stats.active = row
                .get::<i64>(1)
                .map_err(|e| FlowIndexError::Storage(e.to_string()))? as usize;
            stats.total_nodes = row
                .get::<i64>(2)
                .map_err(|e| FlowIndexError::Storage(e.to_string()))? as usize;
        }
        stats.inactive = stats.total - stats.active;

        stats.triggers.extend(
            self.group_counts("SELECT trigger_type, COUNT(*) FROM workflows GROUP BY trigger_type")
                .await?,
        );
        stats.complexity.extend(
            self.group_counts("SELECT complexity, COUNT(*) FROM workflows GROUP BY complexity")
                .await?,
        );

        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(DISTINCT j.value) FROM workflows w, json_each(w.integrations) j",
                params![],
            )
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;
        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?
        {
            stats.unique_integrations = row
                .get::<i64>(0)
                .map_err(|e| FlowIndexError::Storage(e.to_string()))? as usize;
        }

        Ok(stats)
    }

    /// Each integration with the number of workflows using it, most used first.
    pub async fn integration_counts(&self) -> Result<Vec<(String, usize)>> {
        self.group_counts(
            "SELECT j.value, COUNT(*) AS n FROM workflows w, json_each(w.integrations) j
             GROUP BY j.value ORDER BY n DESC, j.value",
        )
        .await
    }

    async fn group_counts(&self, sql: &str) -> Result<Vec<(String, usize)>> {
        let mut rows = self
            .conn
            .query(sql, params![])
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?
        {
            results.push((
                row.get::<String>(0)
                    .map_err(|e| FlowIndexError::Storage(e.to_string()))?,
                row.get::<i64>(1)
                    .map_err(|e| FlowIndexError::Storage(e.to_string()))? as usize,
            ));
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Index runs
    // -----------------------------------------------------------------------

    /// Record the start of an indexing pass. Returns the generated run ID.
    pub async fn begin_run(&self) -> Result<String> {
        self.check_writable()?;
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO index_runs (id, started_at) VALUES (?1, ?2)",
                params![id.as_str(), now.as_str()],
            )
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;
        Ok(id)
    }

    /// Close an indexing pass with its report.
    pub async fn finish_run(&self, run_id: &str, report: &IndexReport) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        let stats_json =
            serde_json::to_string(report).map_err(|e| FlowIndexError::Storage(e.to_string()))?;
        self.conn
            .execute(
                "UPDATE index_runs SET finished_at = ?1, stats_json = ?2 WHERE id = ?3",
                params![now.as_str(), stats_json, run_id],
            )
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;
        Ok(())
    }

    /// The most recently started indexing pass.
    pub async fn last_run(&self) -> Result<Option<IndexRun>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, started_at, finished_at, stats_json FROM index_runs
                 ORDER BY id DESC LIMIT 1",
                params![],
            )
            .await
            .map_err(|e| FlowIndexError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(IndexRun {
                id: row
                    .get::<String>(0)
                    .map_err(|e| FlowIndexError::Storage(e.to_string()))?,
                started_at: row
                    .get::<String>(1)
                    .map_err(|e| FlowIndexError::Storage(e.to_string()))?,
                finished_at: row.get::<String>(2).ok(),
                stats_json: row.get::<String>(3).ok(),
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(FlowIndexError::Storage(e.to_string())),
        }
    }
}

/// Fixed-width UTC timestamp; lexical order equals chronological order.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Convert a database row selected with [`RECORD_COLUMNS`] to a [`WorkflowRecord`].
fn row_to_record(row: &libsql::Row) -> Result<WorkflowRecord> {
    let text = |i: i32| -> Result<String> {
        row.get::<String>(i)
            .map_err(|e| FlowIndexError::Storage(e.to_string()))
    };
    let int = |i: i32| -> Result<i64> {
        row.get::<i64>(i)
            .map_err(|e| FlowIndexError::Storage(e.to_string()))
    };
    let list = |i: i32| -> Result<Vec<String>> {
        serde_json::from_str(&text(i)?).map_err(|e| FlowIndexError::Storage(e.to_string()))
    };

    Ok(WorkflowRecord {
        filename: text(0)?,
        name: text(1)?,
        workflow_id: text(2)?,
        active: int(3)? != 0,
        description: text(4)?,
        trigger_type: text(5)?
            .parse()
            .map_err(|e: FlowIndexError| FlowIndexError::Storage(e.to_string()))?,
        complexity: text(6)?
            .parse()
            .map_err(|e: FlowIndexError| FlowIndexError::Storage(e.to_string()))?,
        node_count: int(7)? as usize,
        integrations: list(8)?,
        tags: list(9)?,
        created_at: row.get::<String>(10).ok(),
        updated_at: row.get::<String>(11).ok(),
        file_hash: text(12)?,
        file_size: int(13)? as u64,
        analyzed_at: {
            let s = text(14)?;
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| FlowIndexError::Storage(format!("invalid date: {e}")))?
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    /// Create a temp file store for testing.
    async fn test_store() -> IndexStore {
        let tmp = std::env::temp_dir().join(format!("flowindex_test_{}.db", Uuid::now_v7()));
        IndexStore::open(&tmp).await.expect("open test db")
    }

    fn record(filename: &str, name: &str) -> WorkflowRecord {
        WorkflowRecord {
            filename: filename.into(),
            name: name.into(),
            workflow_id: String::new(),
            active: false,
            description: format!("Manual workflow that handles {name}"),
            trigger_type: TriggerType::Manual,
            complexity: Complexity::Low,
            node_count: 3,
            integrations: vec!["Slack".into()],
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
            file_hash: format!("hash-{filename}"),
            file_size: 128,
            analyzed_at: Utc::now(),
        }
    }

    fn filenames(page: &SearchPage) -> Vec<&str> {
        page.records.iter().map(|r| r.filename.as_str()).collect()
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let store = test_store().await;
        assert_eq!(store.schema_version().await, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("flowindex_test_{}.db", Uuid::now_v7()));
        let s1 = IndexStore::open(&tmp).await.expect("first open");
        drop(s1);
        let s2 = IndexStore::open(&tmp).await.expect("second open");
        assert_eq!(s2.schema_version().await, 1);
    }

    #[tokio::test]
    async fn upsert_and_get_round_trip() {
        let store = test_store().await;
        let mut rec = record("0001_Slack_Alert.json", "Slack Alert");
        rec.active = true;
        rec.tags = vec!["ops".into(), "alerts".into()];
        rec.created_at = Some("2024-01-01T00:00:00.000Z".into());
        rec.trigger_type = TriggerType::Webhook;
        rec.complexity = Complexity::Medium;

        store.upsert(&rec).await.expect("upsert");
        let found = store.get(&rec.filename).await.unwrap().expect("record");
        assert_eq!(found, rec);

        assert_eq!(
            store.fingerprint_of(&rec.filename).await.unwrap().as_deref(),
            Some("hash-0001_Slack_Alert.json")
        );
        assert_eq!(store.fingerprint_of("missing.json").await.unwrap(), None);
        assert!(store.get("missing.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_text_index_entry() {
        let store = test_store().await;
        store
            .upsert(&record("0001_report.json", "Alphareport digest"))
            .await
            .unwrap();
        let none = SearchFilters::default();
        assert_eq!(store.search("alphareport", &none, 10, 0).await.unwrap().total, 1);

        store
            .upsert(&record("0001_report.json", "Betareport digest"))
            .await
            .unwrap();

        let old = store.search("alphareport", &none, 10, 0).await.unwrap();
        assert_eq!(old.total, 0, "stale terms must be unreachable");
        assert!(old.records.is_empty());

        let new = store.search("betareport", &none, 10, 0).await.unwrap();
        assert_eq!(filenames(&new), vec!["0001_report.json"]);
        assert_eq!(store.list_filenames().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn text_search_matches_indexed_fields() {
        let store = test_store().await;
        let mut a = record("0001_Gmail_Digest.json", "Daily digest");
        a.integrations = vec!["Gmail".into()];
        let mut b = record("0002_Notify.json", "Notify team");
        b.tags = vec!["marketing".into()];
        let c = record("0003_Other.json", "Unrelated");
        for r in [&a, &b, &c] {
            store.upsert(r).await.unwrap();
        }

        let none = SearchFilters::default();
        assert_eq!(
            filenames(&store.search("gmail", &none, 10, 0).await.unwrap()),
            vec!["0001_Gmail_Digest.json"]
        );
        assert_eq!(
            filenames(&store.search("market", &none, 10, 0).await.unwrap()),
            vec!["0002_Notify.json"],
            "prefix match on tags"
        );
        // Punctuation never reaches the FTS parser.
        assert_eq!(
            store.search("notify\" -(", &none, 10, 0).await.unwrap().total,
            1
        );
        // Multiple terms are conjunctive.
        assert_eq!(store.search("daily team", &none, 10, 0).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn text_search_orders_by_relevance() {
        let store = test_store().await;
        let mut weak = record("0001_weekly.json", "Weekly digest");
        weak.tags = vec!["invoice".into()];
        let strong = record("0002_invoice.json", "Invoice sync invoice archive");
        let unrelated = record("0003_other.json", "Unrelated");
        for r in [&weak, &strong, &unrelated] {
            store.upsert(r).await.unwrap();
        }

        let page = store
            .search("invoice", &SearchFilters::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(filenames(&page), vec!["0002_invoice.json", "0001_weekly.json"]);

        // The slice follows the same order.
        let second = store
            .search("invoice", &SearchFilters::default(), 1, 1)
            .await
            .unwrap();
        assert_eq!(filenames(&second), vec!["0001_weekly.json"]);
        assert_eq!(second.total, 2);
    }

    #[tokio::test]
    async fn empty_query_orders_by_analysis_time() {
        let store = test_store().await;
        let base = Utc::now();
        for (i, name) in ["old", "newest", "middle"].iter().enumerate() {
            let mut r = record(&format!("{name}.json"), name);
            r.analyzed_at = base
                + match i {
                    0 => Duration::seconds(0),
                    1 => Duration::seconds(20),
                    _ => Duration::seconds(10),
                };
            store.upsert(&r).await.unwrap();
        }

        for text in ["", "  ", "***"] {
            let page = store
                .search(text, &SearchFilters::default(), 10, 0)
                .await
                .unwrap();
            assert_eq!(page.total, 3);
            assert_eq!(
                filenames(&page),
                vec!["newest.json", "middle.json", "old.json"]
            );
        }
    }

    #[tokio::test]
    async fn filters_are_conjunctive() {
        let store = test_store().await;
        let mut a = record("a.json", "a");
        a.trigger_type = TriggerType::Webhook;
        a.active = true;
        let mut b = record("b.json", "b");
        b.trigger_type = TriggerType::Webhook;
        b.complexity = Complexity::High;
        let mut c = record("c.json", "c");
        c.trigger_type = TriggerType::Scheduled;
        c.active = true;
        for r in [&a, &b, &c] {
            store.upsert(r).await.unwrap();
        }

        let webhook = SearchFilters {
            trigger: Some(TriggerType::Webhook),
            ..SearchFilters::default()
        };
        assert_eq!(store.search("", &webhook, 10, 0).await.unwrap().total, 2);

        let active_webhook = SearchFilters {
            active_only: true,
            ..webhook
        };
        let page = store.search("", &active_webhook, 10, 0).await.unwrap();
        assert_eq!(filenames(&page), vec!["a.json"]);

        let high = SearchFilters {
            complexity: Some(Complexity::High),
            ..SearchFilters::default()
        };
        assert_eq!(
            filenames(&store.search("", &high, 10, 0).await.unwrap()),
            vec!["b.json"]
        );

        // Filters also apply to ranked text search.
        let scheduled = SearchFilters {
            trigger: Some(TriggerType::Scheduled),
            ..SearchFilters::default()
        };
        assert_eq!(
            filenames(&store.search("slack", &scheduled, 10, 0).await.unwrap()),
            vec!["c.json"]
        );
    }

    #[tokio::test]
    async fn pagination_reports_full_total() {
        let store = test_store().await;
        for i in 0..57 {
            store
                .upsert(&record(&format!("{i:04}.json"), &format!("wf {i}")))
                .await
                .unwrap();
        }
        let none = SearchFilters::default();

        let page = PageRequest::new(3, 20).unwrap();
        let third = store.search_page("", &none, page).await.unwrap();
        assert_eq!(third.total, 57);
        assert_eq!(third.records.len(), 17);
        assert_eq!(page.page_count(third.total), 3);

        let fourth = store
            .search_page("", &none, PageRequest::new(4, 20).unwrap())
            .await
            .unwrap();
        assert!(fourth.records.is_empty());
        assert_eq!(fourth.total, 57);

        let limited = store.search("", &none, 5, 0).await.unwrap();
        assert_eq!(limited.records.len(), 5);
        assert_eq!(limited.total, 57);
    }

    #[tokio::test]
    async fn stats_aggregate_current_records() {
        let store = test_store().await;
        let mut a = record("a.json", "a");
        a.active = true;
        a.node_count = 4;
        a.integrations = vec!["Slack".into(), "Gmail".into()];
        let mut b = record("b.json", "b");
        b.trigger_type = TriggerType::Scheduled;
        b.complexity = Complexity::High;
        b.node_count = 20;
        b.integrations = vec!["Slack".into(), "HTTP".into()];
        store.upsert(&a).await.unwrap();
        store.upsert(&b).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.total_nodes, 24);
        assert_eq!(stats.unique_integrations, 3);
        assert_eq!(stats.triggers["Manual"], 1);
        assert_eq!(stats.triggers["Scheduled"], 1);
        assert_eq!(stats.triggers["Complex"], 0);
        assert_eq!(stats.complexity["low"], 1);
        assert_eq!(stats.complexity["high"], 1);

        let counts = store.integration_counts().await.unwrap();
        assert_eq!(
            counts,
            vec![
                ("Slack".to_string(), 2),
                ("Gmail".to_string(), 1),
                ("HTTP".to_string(), 1)
            ]
        );
    }

    #[tokio::test]
    async fn empty_store_stats() {
        let store = test_store().await;
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.unique_integrations, 0);
        assert_eq!(stats.triggers.len(), 4);
    }

    #[tokio::test]
    async fn delete_removes_record_and_text_entry() {
        let store = test_store().await;
        store.upsert(&record("gone.json", "Vanishing act")).await.unwrap();
        assert!(store.delete("gone.json").await.unwrap());
        assert!(!store.delete("gone.json").await.unwrap());
        assert_eq!(
            store
                .search("vanishing", &SearchFilters::default(), 10, 0)
                .await
                .unwrap()
                .total,
            0
        );
    }

    #[tokio::test]
    async fn index_run_lifecycle() {
        let store = test_store().await;
        assert!(store.last_run().await.unwrap().is_none());

        let run_id = store.begin_run().await.expect("begin run");
        let report = IndexReport {
            processed: 3,
            skipped: 1,
            ..IndexReport::default()
        };
        store.finish_run(&run_id, &report).await.expect("finish run");

        let run = store.last_run().await.unwrap().expect("run");
        assert_eq!(run.id, run_id);
        assert!(run.finished_at.is_some());
        assert!(run.stats_json.unwrap().contains("\"processed\":3"));
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("flowindex_test_{}.db", Uuid::now_v7()));
        let rw = IndexStore::open(&tmp).await.unwrap();
        rw.upsert(&record("a.json", "a")).await.unwrap();
        drop(rw);

        let ro = IndexStore::open_readonly(&tmp).await.unwrap();
        assert!(ro.get("a.json").await.unwrap().is_some());
        let result = ro.upsert(&record("b.json", "b")).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }

    #[tokio::test]
    async fn reader_is_not_blocked_by_open_write_transaction() {
        let tmp = std::env::temp_dir().join(format!("flowindex_test_{}.db", Uuid::now_v7()));
        let writer = IndexStore::open(&tmp).await.unwrap();
        writer.upsert(&record("a.json", "a")).await.unwrap();
        let reader = IndexStore::open_readonly(&tmp).await.unwrap();

        writer.conn.execute("BEGIN EXCLUSIVE", params![]).await.unwrap();
        writer.upsert(&record("b.json", "b")).await.unwrap();

        let during = reader
            .search("", &SearchFilters::default(), 10, 0)
            .await
            .expect("search while the writer holds its lock");
        assert_eq!(filenames(&during), vec!["a.json"]);

        writer.conn.execute("COMMIT", params![]).await.unwrap();
        let after = reader
            .search("", &SearchFilters::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(after.total, 2);
    }

    #[tokio::test]
    async fn readonly_requires_existing_database() {
        let tmp = std::env::temp_dir().join(format!("flowindex_missing_{}.db", Uuid::now_v7()));
        let err = IndexStore::open_readonly(&tmp).await.err().expect("error");
        assert!(matches!(err, FlowIndexError::NotFound(_)));
    }
}
