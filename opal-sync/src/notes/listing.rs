//! Local lister: which vault notes belong to the sync folder.

use super::model::NoteFile;
use super::store::FileStore;
use crate::error::Result;
use std::collections::BTreeSet;

/// Folder value meaning "files at the vault root"
pub const ROOT_FOLDER: &str = "/";

/// Trim surrounding slashes and whitespace; an empty folder is the vault root
pub fn normalize_folder(folder: &str) -> String {
    let trimmed = folder.trim().trim_matches('/');
    if trimmed.is_empty() {
        ROOT_FOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Whether a vault path lies in `folder`. The root matches only top-level
/// files; any other folder matches whole path segments, so `Notes` does not
/// contain `Notes Archive/a.md`.
pub fn in_folder(path: &str, folder: &str) -> bool {
    let folder = normalize_folder(folder);
    if folder == ROOT_FOLDER {
        return !path.contains('/');
    }
    path.strip_prefix(folder.as_str())
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Vault path of `file_name` inside `folder`
pub fn note_path(folder: &str, file_name: &str) -> String {
    let folder = normalize_folder(folder);
    if folder == ROOT_FOLDER {
        file_name.to_string()
    } else {
        format!("{}/{}", folder, file_name)
    }
}

/// File handles for every note in `folder`
pub async fn list_folder_files(store: &dyn FileStore, folder: &str) -> Result<Vec<NoteFile>> {
    let files = store.list_markdown_files().await?;
    Ok(files
        .into_iter()
        .filter(|file| in_folder(&file.path, folder))
        .collect())
}

/// File names (with extension) of every note in `folder`
pub async fn list_folder_names(store: &dyn FileStore, folder: &str) -> Result<BTreeSet<String>> {
    Ok(list_folder_files(store, folder)
        .await?
        .into_iter()
        .map(|file| file.name)
        .collect())
}
