//! SQL migration definitions for the flowindex database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: workflows, index_runs, FTS5",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per definition file
CREATE TABLE IF NOT EXISTS workflows (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    filename     TEXT NOT NULL UNIQUE,
    name         TEXT NOT NULL,
    workflow_id  TEXT NOT NULL DEFAULT '',
    active       INTEGER NOT NULL DEFAULT 0,
    description  TEXT NOT NULL,
    trigger_type TEXT NOT NULL,
    complexity   TEXT NOT NULL,
    node_count   INTEGER NOT NULL DEFAULT 0,
    integrations TEXT NOT NULL DEFAULT '[]',
    tags         TEXT NOT NULL DEFAULT '[]',
    created_at   TEXT,
    updated_at   TEXT,
    file_hash    TEXT NOT NULL,
    file_size    INTEGER NOT NULL DEFAULT 0,
    analyzed_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_workflows_trigger ON workflows(trigger_type);
CREATE INDEX IF NOT EXISTS idx_workflows_complexity ON workflows(complexity);
CREATE INDEX IF NOT EXISTS idx_workflows_active ON workflows(active);
CREATE INDEX IF NOT EXISTS idx_workflows_analyzed_at ON workflows(analyzed_at);

-- Indexing pass history
CREATE TABLE IF NOT EXISTS index_runs (
    id          TEXT PRIMARY KEY,
    started_at  TEXT NOT NULL,
    finished_at TEXT,
    stats_json  TEXT
);

-- Full-text search on workflows
CREATE VIRTUAL TABLE IF NOT EXISTS workflows_fts USING fts5(
    filename,
    name,
    description,
    integrations,
    tags,
    content=workflows,
    content_rowid=id
);

-- Triggers to keep FTS in sync with the workflows table
CREATE TRIGGER IF NOT EXISTS workflows_fts_insert AFTER INSERT ON workflows BEGIN
    INSERT INTO workflows_fts(rowid, filename, name, description, integrations, tags)
    VALUES (new.id, new.filename, new.name, new.description, new.integrations, new.tags);
END;

CREATE TRIGGER IF NOT EXISTS workflows_fts_delete AFTER DELETE ON workflows BEGIN
    INSERT INTO workflows_fts(workflows_fts, rowid, filename, name, description, integrations, tags)
    VALUES ('delete', old.id, old.filename, old.name, old.description, old.integrations, old.tags);
END;

CREATE TRIGGER IF NOT EXISTS workflows_fts_update AFTER UPDATE ON workflows BEGIN
    INSERT INTO workflows_fts(workflows_fts, rowid, filename, name, description, integrations, tags)
    VALUES ('delete', old.id, old.filename, old.name, old.description, old.integrations, old.tags);
    INSERT INTO workflows_fts(rowid, filename, name, description, integrations, tags)
    VALUES (new.id, new.filename, new.name, new.description, new.integrations, new.tags);
END;

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
