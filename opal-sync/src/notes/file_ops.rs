//! File operations for the vault
//!
//! Vault-relative paths always use `/` separators; these helpers translate them
//! to real paths under the vault root and map io failures onto `SyncError`.

use super::model::NOTE_EXTENSION;
use crate::error::{Result, SyncError};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

/// Absolute path of a vault-relative note path. `.` and `..` segments and
/// backslashes are refused so a path can never leave the vault.
pub fn vault_path(root: &Path, rel_path: &str) -> Result<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in rel_path.split('/').filter(|segment| !segment.is_empty()) {
        if segment == "." || segment == ".." || segment.contains('\\') {
            return Err(SyncError::Parse(format!("unsafe vault path '{}'", rel_path)));
        }
        path.push(segment);
    }
    Ok(path)
}

/// Read a note file
pub async fn read_note(root: &Path, rel_path: &str) -> Result<String> {
    fs::read_to_string(vault_path(root, rel_path)?)
        .await
        .map_err(|e| SyncError::from_io(rel_path, e))
}

/// Replace the content of an existing note file
pub async fn write_note(root: &Path, rel_path: &str, content: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(vault_path(root, rel_path)?)
        .await
        .map_err(|e| SyncError::from_io(rel_path, e))?;
    file.write_all(content.as_bytes())
        .await
        .map_err(|e| SyncError::from_io(rel_path, e))?;
    file.flush().await.map_err(|e| SyncError::from_io(rel_path, e))
}

/// Create a new note file (creates parent directories as needed).
/// Fails with `Collision` when the file already exists.
pub async fn create_note(root: &Path, rel_path: &str, content: &str) -> Result<()> {
    let path = vault_path(root, rel_path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| SyncError::from_io(rel_path, e))?;
    }
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(|e| SyncError::from_io(rel_path, e))?;
    file.write_all(content.as_bytes())
        .await
        .map_err(|e| SyncError::from_io(rel_path, e))?;
    file.flush().await.map_err(|e| SyncError::from_io(rel_path, e))
}

/// List all markdown files under the vault root (recursively), as vault-relative paths
pub fn list_notes(root: &Path) -> io::Result<Vec<String>> {
    let mut files = Vec::new();

    if !root.exists() {
        return Ok(files);
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        // Skip hidden files/dirs (like .obsidian/)
        .filter_entry(|entry| entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_note = entry
            .path()
            .extension()
            .map(|ext| ext == NOTE_EXTENSION)
            .unwrap_or(false);
        if !is_note {
            continue;
        }
        if let Some(rel) = relative_path(root, entry.path()) {
            files.push(rel);
        }
    }

    Ok(files)
}

/// Get the `/`-separated path of a file relative to the vault root
pub fn relative_path(root: &Path, file_path: &Path) -> Option<String> {
    let rel = file_path.strip_prefix(root).ok()?;
    let segments: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}
