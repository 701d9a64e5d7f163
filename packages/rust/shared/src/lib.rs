//! Shared types, error model, and configuration for flowindex.
//!
//! This crate is the foundation depended on by all other flowindex crates.
//! It provides:
//! - [`FlowIndexError`], the unified error type
//! - Domain types ([`WorkflowRecord`], [`TriggerType`], [`Complexity`], [`Step`])
//! - Search/reporting types ([`SearchFilters`], [`SearchPage`], [`IndexStats`], [`IndexReport`])
//! - Content fingerprints ([`SourceFile`])
//! - Configuration ([`AppConfig`], [`IndexSettings`], config loading)

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CategoriesConfig, DefaultsConfig, IndexSettings, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{FlowIndexError, Result};
pub use fingerprint::{SourceFile, content_fingerprint};
pub use types::{
    Complexity, FileFailure, IndexReport, IndexStats, PageRequest, SearchFilters, SearchPage,
    Step, TriggerType, WorkflowDetail, WorkflowRecord,
};
