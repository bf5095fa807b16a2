//! Backup and restore of the local datastore around a test run.
//!
//! Each table file `X` is copied to `X.<suffix>` before the run. Restoring
//! deletes every non-backup file and renames the backups into place, and
//! refuses to touch anything when no backups exist.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{StoreError, StoreResult};

/// Default backup suffix.
pub const DEFAULT_BACKUP_SUFFIX: &str = "bak";

fn is_backup(path: &Path, suffix: &str) -> bool {
    path.extension().map(|e| e == suffix).unwrap_or(false)
}

fn list_files(dir: &Path) -> StoreResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))? {
        let path = entry.map_err(|e| StoreError::io(dir, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Copy every datastore file to `<file>.<suffix>`. Returns the backups written.
pub fn backup_datastores(dir: &Path, suffix: &str) -> StoreResult<Vec<PathBuf>> {
    let mut written = Vec::new();
    for path in list_files(dir)? {
        if is_backup(&path, suffix) {
            continue;
        }
        let target = backup_path(&path, suffix);
        fs::copy(&path, &target).map_err(|e| StoreError::io(&path, e))?;
        written.push(target);
    }
    info!(dir = %dir.display(), files = written.len(), "Backed up local datastores");
    Ok(written)
}

/// Remove files written during the run and move backups back into place.
/// Returns the restored file paths.
pub fn restore_datastores(dir: &Path, suffix: &str) -> StoreResult<Vec<PathBuf>> {
    let files = list_files(dir)?;
    if !files.iter().any(|p| is_backup(p, suffix)) {
        return Err(StoreError::NoBackups {
            dir: dir.to_path_buf(),
            suffix: suffix.to_string(),
        });
    }

    for path in files.iter().filter(|p| !is_backup(p, suffix)) {
        fs::remove_file(path).map_err(|e| StoreError::io(path, e))?;
    }

    let mut restored = Vec::new();
    for path in files.iter().filter(|p| is_backup(p, suffix)) {
        let original = path.with_extension("");
        fs::rename(path, &original).map_err(|e| StoreError::io(path, e))?;
        restored.push(original);
    }
    info!(dir = %dir.display(), files = restored.len(), "Restored local datastores");
    Ok(restored)
}
