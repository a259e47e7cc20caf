//! Fetch pass: materialise remote notes into the vault folder.

use super::{ItemFailure, ItemOutcome, ItemResult, ItemTask, Reconciler, SyncOp, SyncReport, run_items};
use crate::error::{Result, SyncError};
use crate::notes::{FileStore, Note, NoteFile, listing, title};
use opal_types::iso8601;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

impl Reconciler {
    /// Create missing notes and overwrite ones whose cached `lastModified`
    /// differs from the remote. Local-only files are left alone.
    pub async fn fetch_notes(&self) -> Result<SyncReport> {
        let notes = self.list_notes().await?;
        let files = listing::list_folder_files(self.store.as_ref(), &self.folder).await?;
        let existing = Arc::new(paths_by_name(&self.folder, files));

        let items = notes
            .into_iter()
            .map(|note| ItemTask {
                note: note.title.clone(),
                op: SyncOp::Fetch,
                work: fetch_note(self.store.clone(), self.folder.clone(), note, existing.clone()),
            })
            .collect();

        let report = run_items("FETCH", Some(self.item_timeout), items).await;
        log::info!("[FETCH] {}: {}", self.folder, report);
        Ok(report)
    }
}

/// File name → vault path for every note in the folder, nested ones included.
/// When a name occurs more than once the file directly in the folder wins.
fn paths_by_name(folder: &str, files: Vec<NoteFile>) -> HashMap<String, String> {
    let mut paths = HashMap::new();
    for NoteFile { path, name, .. } in files {
        let direct = listing::note_path(folder, &name) == path;
        match paths.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(path);
            }
            Entry::Occupied(mut slot) if direct => {
                slot.insert(path);
            }
            Entry::Occupied(_) => {}
        }
    }
    paths
}

async fn fetch_note(
    store: Arc<dyn FileStore>,
    folder: String,
    note: Note,
    existing: Arc<HashMap<String, String>>,
) -> ItemResult {
    let fail = |error: SyncError| ItemFailure::new(note.title.clone(), SyncOp::Fetch, error);
    if !title::is_safe_title(&note.title) {
        return Err(fail(SyncError::Parse(format!(
            "remote title '{}' is not a usable file name",
            note.title
        ))));
    }

    let file_name = note.file_name();
    if let Some(path) = existing.get(&file_name) {
        return refresh_if_stale(store.as_ref(), path, &note).await.map_err(fail);
    }

    let path = listing::note_path(&folder, &file_name);

    match store.create(&path, &note.to_file_content()).await {
        Ok(()) => {
            log::debug!("[FETCH] Created {}", path);
            Ok(ItemOutcome::Created)
        }
        Err(SyncError::Collision(_)) => {
            // Appeared after the folder snapshot; treat it as an existing file
            log::warn!("[FETCH] {} appeared during the pass, checking it instead", path);
            refresh_if_stale(store.as_ref(), &path, &note).await.map_err(fail)
        }
        Err(e) => Err(fail(e)),
    }
}

/// Overwrite `path` when its cached `lastModified` is missing or differs from the remote
async fn refresh_if_stale(store: &dyn FileStore, path: &str, note: &Note) -> Result<ItemOutcome> {
    let remote_stamp = iso8601::format(&note.metadata.last_modified);
    let local_stamp = store.frontmatter(path).await?.and_then(|fm| fm.last_modified());

    if local_stamp.as_deref() == Some(remote_stamp.as_str()) {
        log::debug!("[FETCH] {} is current", path);
        return Ok(ItemOutcome::Skipped);
    }

    store.modify(path, &note.to_file_content()).await?;
    log::debug!(
        "[FETCH] Updated {} ({} -> {})",
        path,
        local_stamp.as_deref().unwrap_or("none"),
        remote_stamp
    );
    Ok(ItemOutcome::Updated)
}
