//! Application configuration for flowindex.
//!
//! User config lives at `~/.flowindex/flowindex.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FlowIndexError, Result};
use crate::types::PageRequest;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "flowindex.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".flowindex";

// ---------------------------------------------------------------------------
// Config structs (matching flowindex.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Extra `serviceIdentifier = "Display Name"` entries for the service table.
    #[serde(default)]
    pub services: BTreeMap<String, String>,

    /// Category table settings.
    #[serde(default)]
    pub categories: CategoriesConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory holding the workflow definition files.
    #[serde(default = "default_workflows_dir")]
    pub workflows_dir: String,

    /// Index database location.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Default search page size.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            workflows_dir: default_workflows_dir(),
            db_path: default_db_path(),
            page_size: default_page_size(),
        }
    }
}

fn default_workflows_dir() -> String {
    "workflows".into()
}
fn default_db_path() -> String {
    "database/workflows.db".into()
}
fn default_page_size() -> usize {
    20
}

/// `[categories]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoriesConfig {
    /// JSON file of `[{ "integration": ..., "category": ... }]` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<String>,
}

// ---------------------------------------------------------------------------
// Runtime settings (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Resolved runtime paths and limits.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    pub workflows_dir: PathBuf,
    pub db_path: PathBuf,
    pub page_size: usize,
}

impl From<&AppConfig> for IndexSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            workflows_dir: PathBuf::from(&config.defaults.workflows_dir),
            db_path: PathBuf::from(&config.defaults.db_path),
            page_size: config
                .defaults
                .page_size
                .clamp(1, PageRequest::MAX_PER_PAGE),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.flowindex/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| FlowIndexError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.flowindex/flowindex.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| FlowIndexError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| FlowIndexError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| FlowIndexError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(FlowIndexError::Conflict { path });
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| FlowIndexError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| FlowIndexError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
