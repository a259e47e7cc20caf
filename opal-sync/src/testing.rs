//! In-memory collaborators for reconciler tests.

use crate::error::{Result, SyncError};
use crate::notes::{FileStore, Frontmatter, NoteFile, VaultStore};
use crate::remote::NotesApi;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use opal_types::{CreatedRecord, NotePayload, RemoteRecord, iso8601};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

pub fn record(id: &str, title: Option<&str>, content: &str, last_modified: &str) -> RemoteRecord {
    RemoteRecord {
        id: id.to_string(),
        title: title.map(str::to_string),
        content: content.to_string(),
        last_modified: iso8601::parse(last_modified).unwrap(),
    }
}

/// Notes API backed by a Vec, recording every POST and PUT.
/// The remote clock starts at 2024-06-01 and ticks one second per write.
#[derive(Default)]
pub struct MemoryNotesApi {
    records: Mutex<Vec<RemoteRecord>>,
    pub posts: Mutex<Vec<NotePayload>>,
    pub puts: Mutex<Vec<(String, NotePayload)>>,
    writes: AtomicUsize,
    next_id: AtomicUsize,
    fail_listing: AtomicBool,
    fail_title: Mutex<Option<String>>,
    echo_updates: AtomicBool,
}

impl MemoryNotesApi {
    pub fn with_records(records: Vec<RemoteRecord>) -> Self {
        let api = Self::default();
        *api.records.lock().unwrap() = records;
        api
    }

    pub fn records(&self) -> Vec<RemoteRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Reject writes whose payload has this title
    pub fn fail_writes_for(&self, title: &str) {
        *self.fail_title.lock().unwrap() = Some(title.to_string());
    }

    /// Return the new lastModified from PUT
    pub fn echo_updates(&self, echo: bool) {
        self.echo_updates.store(echo, Ordering::SeqCst);
    }

    /// Drop every record, as if the remote store was reset
    pub fn reset(&self) {
        self.records.lock().unwrap().clear();
    }

    fn tick(&self) -> DateTime<Utc> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + Duration::seconds(n)
    }

    fn check_write(&self, payload: &NotePayload) -> Result<()> {
        if self.fail_title.lock().unwrap().as_deref() == Some(payload.title.as_str()) {
            return Err(SyncError::Transport("HTTP 500 Internal Server Error".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotesApi for MemoryNotesApi {
    async fn list_records(&self) -> Result<Vec<RemoteRecord>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(SyncError::Transport("connection refused".to_string()));
        }
        Ok(self.records())
    }

    async fn create_record(&self, payload: &NotePayload) -> Result<CreatedRecord> {
        self.check_write(payload)?;
        let last_modified = self.tick();
        let id = format!("id-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.posts.lock().unwrap().push(payload.clone());
        self.records.lock().unwrap().push(RemoteRecord {
            id: id.clone(),
            title: Some(payload.title.clone()),
            content: payload.content.clone(),
            last_modified,
        });
        Ok(CreatedRecord { id, last_modified })
    }

    async fn update_record(&self, id: &str, payload: &NotePayload) -> Result<Option<DateTime<Utc>>> {
        self.check_write(payload)?;
        let last_modified = self.tick();
        self.puts.lock().unwrap().push((id.to_string(), payload.clone()));
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| SyncError::Transport(format!("HTTP 404 for {}", id)))?;
        record.title = Some(payload.title.clone());
        record.content = payload.content.clone();
        record.last_modified = last_modified;

        if self.echo_updates.load(Ordering::SeqCst) {
            Ok(Some(last_modified))
        } else {
            Ok(None)
        }
    }
}

/// VaultStore wrapper that counts writes and can slow down or refuse `modify`
pub struct CountingStore {
    inner: VaultStore,
    writes: AtomicUsize,
    fail_modifies: AtomicBool,
    modify_delay_ms: AtomicU64,
}

impl CountingStore {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: VaultStore::new(root),
            writes: AtomicUsize::new(0),
            fail_modifies: AtomicBool::new(false),
            modify_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_modifies(&self, fail: bool) {
        self.fail_modifies.store(fail, Ordering::SeqCst);
    }

    pub fn delay_modifies(&self, delay: std::time::Duration) {
        self.modify_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileStore for CountingStore {
    async fn list_markdown_files(&self) -> Result<Vec<NoteFile>> {
        self.inner.list_markdown_files().await
    }

    async fn read(&self, path: &str) -> Result<String> {
        self.inner.read(path).await
    }

    async fn modify(&self, path: &str, content: &str) -> Result<()> {
        let delay = self.modify_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        if self.fail_modifies.load(Ordering::SeqCst) {
            return Err(SyncError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied)));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.modify(path, content).await
    }

    async fn create(&self, path: &str, content: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.create(path, content).await
    }

    async fn frontmatter(&self, path: &str) -> Result<Option<Frontmatter>> {
        self.inner.frontmatter(path).await
    }
}
