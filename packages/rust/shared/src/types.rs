//! Core domain types for the workflow catalog.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FlowIndexError, Result};

/// Node count at or below which a workflow is `low` complexity.
pub const LOW_COMPLEXITY_MAX_NODES: usize = 5;

/// Node count at or below which a workflow is `medium` complexity.
pub const MEDIUM_COMPLEXITY_MAX_NODES: usize = 15;

// ---------------------------------------------------------------------------
// TriggerType
// ---------------------------------------------------------------------------

/// How a workflow is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TriggerType {
    Manual,
    Webhook,
    Scheduled,
    Complex,
}

impl TriggerType {
    pub const ALL: [TriggerType; 4] = [
        TriggerType::Manual,
        TriggerType::Webhook,
        TriggerType::Scheduled,
        TriggerType::Complex,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Webhook => "Webhook",
            Self::Scheduled => "Scheduled",
            Self::Complex => "Complex",
        }
    }

    /// Parse a search filter value: `all` means no constraint.
    pub fn parse_filter(value: &str) -> Result<Option<Self>> {
        if value.eq_ignore_ascii_case("all") {
            return Ok(None);
        }
        value.parse().map(Some)
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = FlowIndexError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FlowIndexError::validation(format!("unknown trigger type '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Complexity
// ---------------------------------------------------------------------------

/// Coarse size tier derived from the node count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub const ALL: [Complexity; 3] = [Complexity::Low, Complexity::Medium, Complexity::High];

    /// `n ≤ 5 → low`, `6 ≤ n ≤ 15 → medium`, `n ≥ 16 → high`.
    pub fn from_node_count(count: usize) -> Self {
        if count <= LOW_COMPLEXITY_MAX_NODES {
            Self::Low
        } else if count <= MEDIUM_COMPLEXITY_MAX_NODES {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parse a search filter value: `all` means no constraint.
    pub fn parse_filter(value: &str) -> Result<Option<Self>> {
        if value.eq_ignore_ascii_case("all") {
            return Ok(None);
        }
        value.parse().map(Some)
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Complexity {
    type Err = FlowIndexError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FlowIndexError::validation(format!("unknown complexity '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// WorkflowRecord
// ---------------------------------------------------------------------------

/// Persistent metadata for one workflow definition file.
///
/// `filename` is the primary key and stays stable across re-indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    /// File name within the corpus directory (e.g. `0001_Slack_Alert.json`).
    pub filename: String,
    /// Display name from the document, or the file stem.
    pub name: String,
    /// External identifier from the document (may be empty).
    pub workflow_id: String,
    pub active: bool,
    /// Synthesized natural-language summary.
    pub description: String,
    pub trigger_type: TriggerType,
    pub complexity: Complexity,
    pub node_count: usize,
    /// Deduplicated integration display names, sorted.
    pub integrations: Vec<String>,
    /// Plain tag names.
    pub tags: Vec<String>,
    /// Opaque timestamp copied from the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Opaque timestamp copied from the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// SHA-256 hex digest of the raw file bytes.
    pub file_hash: String,
    /// File size in bytes.
    pub file_size: u64,
    /// When the record was produced by the analyzer.
    pub analyzed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Detail view
// ---------------------------------------------------------------------------

/// One entry of a workflow's execution narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Node display name.
    pub name: String,
    /// Full node type identifier.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Author note or generated one-line description.
    pub note: String,
}

/// A record together with its on-demand narrative and flow diagram.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowDetail {
    #[serde(flatten)]
    pub record: WorkflowRecord,
    pub steps: Vec<Step>,
    /// Mermaid flowchart text.
    pub diagram: String,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Conjunctive search filters. `None` means "all".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub trigger: Option<TriggerType>,
    pub complexity: Option<Complexity>,
    pub active_only: bool,
}

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub records: Vec<WorkflowRecord>,
    /// Size of the filtered candidate set before pagination.
    pub total: usize,
}

/// A 1-based page request as used by listing surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    /// Largest accepted page size.
    pub const MAX_PER_PAGE: usize = 100;

    pub fn new(page: usize, per_page: usize) -> Result<Self> {
        if page == 0 {
            return Err(FlowIndexError::validation("page numbers start at 1"));
        }
        if per_page == 0 || per_page > Self::MAX_PER_PAGE {
            return Err(FlowIndexError::validation(format!(
                "per_page must be between 1 and {}",
                Self::MAX_PER_PAGE
            )));
        }
        Ok(Self { page, per_page })
    }

    pub fn limit(&self) -> usize {
        self.per_page
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.per_page
    }

    /// `ceil(total / per_page)`.
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.per_page)
    }
}

// ---------------------------------------------------------------------------
// Aggregates & reports
// ---------------------------------------------------------------------------

/// Aggregate statistics over all stored records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub triggers: BTreeMap<String, usize>,
    pub complexity: BTreeMap<String, usize>,
    pub total_nodes: usize,
    pub unique_integrations: usize,
}

/// A single file that could not be processed during a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub filename: String,
    pub message: String,
}

/// Outcome of an indexing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Files analyzed and upserted.
    pub processed: usize,
    /// Files skipped because their fingerprint was unchanged.
    pub skipped: usize,
    /// Files that failed to decode or analyze.
    pub errors: usize,
    pub failures: Vec<FileFailure>,
    /// The workflow directory was missing, so nothing was scanned.
    pub corpus_unavailable: bool,
}

impl IndexReport {
    pub fn record_failure(&mut self, filename: impl Into<String>, message: impl Into<String>) {
        self.errors += 1;
        self.failures.push(FileFailure {
            filename: filename.into(),
            message: message.into(),
        });
    }
}
