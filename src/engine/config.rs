//! Engine configuration
//!
//! Read from an optional JSON file. Every key is optional; missing keys
//! take their defaults. The loaded file is validated before use.
//!
//! ```json
//! {
//!   "history": {"max_depth": 50},
//!   "load": {"chunk_size": 500},
//!   "validation": {"block_save_on_unknown_fields": false},
//!   "files": {"create_backups": true, "json_indent": 2, "backup_dir": "backups"}
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{EngineError, EngineResult};
use crate::history::DEFAULT_MAX_DEPTH;

/// Largest accepted `files.json_indent`
const MAX_JSON_INDENT: usize = 8;

/// Default backup directory name, next to the data file
const DEFAULT_BACKUP_DIR: &str = "backups";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub history: HistoryConfig,
    pub load: LoadConfig,
    pub validation: ValidationConfig,
    pub files: FilesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Undo levels kept before the oldest is evicted
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadConfig {
    /// Records committed per batch; unset loads in one pass
    #[serde(default)]
    pub chunk_size: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Unknown fields block saving instead of being advisory
    #[serde(default)]
    pub block_save_on_unknown_fields: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    #[serde(default = "default_create_backups")]
    pub create_backups: bool,

    /// Spaces per level in saved data; 0 writes compact JSON
    #[serde(default = "default_json_indent")]
    pub json_indent: usize,

    /// Relative paths resolve against the data file's directory
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            create_backups: default_create_backups(),
            json_indent: default_json_indent(),
            backup_dir: None,
        }
    }
}

impl FilesConfig {
    /// Directory receiving backups of `data_path`
    pub fn backup_dir_for(&self, data_path: &Path) -> PathBuf {
        let base = data_path.parent().unwrap_or_else(|| Path::new(""));
        match &self.backup_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base.join(dir),
            None => base.join(DEFAULT_BACKUP_DIR),
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}
fn default_create_backups() -> bool {
    true
}
fn default_json_indent() -> usize {
    2
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| EngineError::config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Loads `path` if given, otherwise returns the defaults
    pub fn load_or_default(path: Option<&Path>) -> EngineResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_json(content: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_json::from_str(content)
            .map_err(|e| EngineError::config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values no engine could run with
    pub fn validate(&self) -> EngineResult<()> {
        if self.history.max_depth == 0 {
            return Err(EngineError::config("history.max_depth must be > 0"));
        }

        if self.load.chunk_size == Some(0) {
            return Err(EngineError::config("load.chunk_size must be > 0 when set"));
        }

        if self.files.json_indent > MAX_JSON_INDENT {
            return Err(EngineError::config(format!(
                "files.json_indent must be at most {}",
                MAX_JSON_INDENT
            )));
        }

        Ok(())
    }
}
