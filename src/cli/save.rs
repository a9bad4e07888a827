//! Saving data documents
//!
//! Atomic replace:
//! 1. Copy the current file into the backup directory (if enabled)
//! 2. Write the new document to a temp file next to the target
//! 3. fsync the temp file
//! 4. Rename it over the target

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};
use tracing::{debug, info};

use super::errors::{CliError, CliResult};
use crate::engine::FilesConfig;

/// Timestamp suffix of backup files
const BACKUP_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// Where a save went
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub path: PathBuf,
    pub backup: Option<PathBuf>,
}

/// Writes `document` to `path` atomically, backing up any existing file.
pub fn save_document(path: &Path, document: &Value, files: &FilesConfig) -> CliResult<SaveReport> {
    let backup = if files.create_backups && path.exists() {
        Some(backup_existing(path, files)?)
    } else {
        None
    };

    let content = render(document, files.json_indent)?;
    write_atomic(path, &content)?;
    info!(path = %path.display(), bytes = content.len(), "data saved");

    Ok(SaveReport {
        path: path.to_path_buf(),
        backup,
    })
}

/// Serializes with the configured indent; 0 is compact
fn render(document: &Value, indent: usize) -> CliResult<Vec<u8>> {
    if indent == 0 {
        let mut out = serde_json::to_vec(document)?;
        out.push(b'\n');
        return Ok(out);
    }

    let indent = vec![b' '; indent];
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(&indent));
    document.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

fn backup_existing(path: &Path, files: &FilesConfig) -> CliResult<PathBuf> {
    let dir = files.backup_dir_for(path);
    fs::create_dir_all(&dir).map_err(|e| {
        CliError::io_error(format!("failed to create backup directory {}: {}", dir.display(), e))
    })?;

    let backup = dir.join(format!(
        "{}.{}.bak",
        file_name(path)?,
        Local::now().format(BACKUP_TIMESTAMP)
    ));
    fs::copy(path, &backup)
        .map_err(|e| CliError::io_error(format!("failed to back up {}: {}", path.display(), e)))?;
    debug!(backup = %backup.display(), "backup written");
    Ok(backup)
}

fn write_atomic(path: &Path, content: &[u8]) -> CliResult<()> {
    let temp_path = path.with_file_name(format!("{}.tmp", file_name(path)?));

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| CliError::io_error(format!("failed to create temp file: {}", e)))?;
    file.write_all(content)
        .map_err(|e| CliError::io_error(format!("failed to write temp file: {}", e)))?;
    file.sync_all()
        .map_err(|e| CliError::io_error(format!("failed to fsync temp file: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        CliError::io_error(format!("failed to replace {}: {}", path.display(), e))
    })?;

    // fsync the directory so the rename is durable
    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> CliResult<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::io_error(format!("not a file path: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_save_creates_file_without_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");

        let report = save_document(&path, &json!([{"a": 1}]), &FilesConfig::default()).unwrap();
        assert_eq!(report.backup, None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "[\n  {\n    \"a\": 1\n  }\n]\n");
        assert!(!dir.path().join("data.json.tmp").exists());
    }

    #[test]
    fn test_save_backs_up_previous_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "[]").unwrap();

        let report = save_document(&path, &json!([]), &FilesConfig::default()).unwrap();
        let backup = report.backup.unwrap();
        assert_eq!(backup.parent().unwrap(), dir.path().join("backups"));
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("data.json.") && name.ends_with(".bak"), "{}", name);
        assert_eq!(fs::read_to_string(&backup).unwrap(), "[]");
    }

    #[test]
    fn test_compact_and_no_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "old").unwrap();
        let files = FilesConfig {
            create_backups: false,
            json_indent: 0,
            backup_dir: None,
        };

        let report = save_document(&path, &json!([{"a": 1}]), &files).unwrap();
        assert_eq!(report.backup, None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "[{\"a\":1}]\n");
        assert!(!dir.path().join("backups").exists());
    }
}
