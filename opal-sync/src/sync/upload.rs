//! Upload pass: push vault notes to the remote store.

use super::{ItemFailure, ItemOutcome, ItemResult, ItemTask, Reconciler, SyncOp, SyncReport, run_items};
use crate::error::{Result, SyncError};
use crate::notes::frontmatter::{self, Frontmatter, ID_FIELD, LAST_MODIFIED_FIELD};
use crate::notes::{FileStore, Note, NoteFile, NoteMetadata, listing};
use crate::remote::NotesApi;
use chrono::Utc;
use opal_types::NotePayload;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

impl Reconciler {
    /// Create remote records for unsynced files (writing the assigned id
    /// back into their frontmatter) and update records whose title or body
    /// differs from the local file.
    pub async fn upload_notes(&self) -> Result<SyncReport> {
        let remote: Arc<HashMap<String, Note>> = Arc::new(
            self.list_notes()
                .await?
                .into_iter()
                .map(|note| (note.metadata.id.clone(), note))
                .collect(),
        );
        let files = listing::list_folder_files(self.store.as_ref(), &self.folder).await?;

        let items = files
            .into_iter()
            .map(|file| ItemTask {
                note: file.basename.clone(),
                op: SyncOp::Update,
                work: upload_file(
                    self.api.clone(),
                    self.store.clone(),
                    file,
                    remote.clone(),
                    self.item_timeout,
                ),
            })
            .collect();

        let report = run_items("UPLOAD", None, items).await;
        log::info!("[UPLOAD] {}: {}", self.folder, report);
        Ok(report)
    }
}

async fn upload_file(
    api: Arc<dyn NotesApi>,
    store: Arc<dyn FileStore>,
    file: NoteFile,
    remote: Arc<HashMap<String, Note>>,
    api_timeout: Duration,
) -> ItemResult {
    let read = async {
        let content = store.read(&file.path).await?;
        let fm = store.frontmatter(&file.path).await?;
        Ok::<_, SyncError>((content, fm))
    };
    let (content, fm) = read
        .await
        .map_err(|e| ItemFailure::new(file.basename.clone(), SyncOp::Read, e))?;

    let known = fm.as_ref().and_then(|fm| fm.id()).and_then(|id| remote.get(&id));

    match (fm, known) {
        (Some(fm), Some(record)) => {
            update_remote(api.as_ref(), store.as_ref(), &file, &content, fm, record, api_timeout)
                .await
                .map_err(|e| ItemFailure::new(record.metadata.id.clone(), SyncOp::Update, e))
        }
        (fm, _) => create_remote(api.as_ref(), store.as_ref(), &file, &content, fm, api_timeout)
            .await
            .map_err(|e| ItemFailure::new(file.basename.clone(), SyncOp::Create, e)),
    }
}

/// Bound one API call
async fn bounded<T>(limit: Duration, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| SyncError::Timeout(limit))?
}

/// POST the note and record the assigned id locally
async fn create_remote(
    api: &dyn NotesApi,
    store: &dyn FileStore,
    file: &NoteFile,
    content: &str,
    fm: Option<Frontmatter>,
    api_timeout: Duration,
) -> Result<ItemOutcome> {
    let body = frontmatter::strip_frontmatter(content, fm.as_ref());
    let payload = NotePayload::new(file.basename.as_str(), body, Utc::now());
    let created = bounded(api_timeout, api.create_record(&payload)).await?;

    let rewritten = match fm {
        None => Note {
            title: file.basename.clone(),
            content: content.to_string(),
            metadata: NoteMetadata {
                id: created.id.clone(),
                last_modified: created.last_modified,
            },
        }
        .to_file_content(),
        Some(mut fm) => {
            fm.set(LAST_MODIFIED_FIELD, created.last_modified);
            fm.set(ID_FIELD, created.id.as_str());
            frontmatter::rewrite_frontmatter(content, &fm)
        }
    };
    if let Err(e) = store.modify(&file.path, &rewritten).await {
        log::error!(
            "[UPLOAD] {} was created remotely as {} but the id could not be saved: {}",
            file.path,
            created.id,
            e
        );
        return Err(SyncError::WriteBack {
            path: file.path.clone(),
            id: created.id,
            source: Box::new(e),
        });
    }

    log::debug!("[UPLOAD] Created {} as {}", file.path, created.id);
    Ok(ItemOutcome::Created)
}

/// PUT the note when its title or body drifted from the remote record
async fn update_remote(
    api: &dyn NotesApi,
    store: &dyn FileStore,
    file: &NoteFile,
    content: &str,
    mut fm: Frontmatter,
    record: &Note,
    api_timeout: Duration,
) -> Result<ItemOutcome> {
    let body = frontmatter::strip_frontmatter(content, Some(&fm));
    if record.title == file.basename && record.content == body {
        return Ok(ItemOutcome::Skipped);
    }

    let payload = NotePayload::new(file.basename.as_str(), body, Utc::now());
    let echoed = bounded(api_timeout, api.update_record(&record.metadata.id, &payload)).await?;

    // Mirror the new remote stamp so the next fetch sees this file as current
    if let Some(stamp) = echoed {
        fm.set(LAST_MODIFIED_FIELD, stamp);
        store
            .modify(&file.path, &frontmatter::rewrite_frontmatter(content, &fm))
            .await?;
    }

    log::debug!("[UPLOAD] Updated {} ({})", file.path, record.metadata.id);
    Ok(ItemOutcome::Updated)
}
