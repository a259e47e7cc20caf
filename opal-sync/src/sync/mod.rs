//! Reconciliation passes between the vault folder and the notes API.
//!
//! A pass snapshots what it needs once (remote records, local names) and then
//! runs one task per note in a `JoinSet`. Tasks share only those read-only
//! snapshots, and a failure is recorded in the `SyncReport` instead of aborting
//! siblings. Fetch items are bounded by the item timeout as a whole; upload
//! items bound only their API calls, so a record the remote accepted is always
//! written back locally.

pub mod fetch;
pub mod reader;
pub mod upload;

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::notes::{FileStore, Note};
use crate::remote::NotesApi;
use futures_util::FutureExt;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Which operation an item was performing
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SyncOp {
    Fetch,
    Create,
    Update,
    Read,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Created,
    Updated,
    Skipped,
}

/// One note that failed during a pass
#[derive(Debug)]
pub struct ItemFailure {
    /// Title or id of the offending note
    pub note: String,
    pub op: SyncOp,
    pub error: SyncError,
}

impl ItemFailure {
    pub fn new(note: impl Into<String>, op: SyncOp, error: SyncError) -> Self {
        Self {
            note: note.into(),
            op,
            error,
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for '{}': {}", self.op, self.note, self.error)
    }
}

pub type ItemResult = std::result::Result<ItemOutcome, ItemFailure>;

/// Aggregate result of a pass
#[derive(Debug, Default)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failures: Vec<ItemFailure>,
}

impl SyncReport {
    pub fn record(&mut self, result: ItemResult) {
        match result {
            Ok(ItemOutcome::Created) => self.created += 1,
            Ok(ItemOutcome::Updated) => self.updated += 1,
            Ok(ItemOutcome::Skipped) => self.skipped += 1,
            Err(failure) => self.failures.push(failure),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.failed()
    }

    /// Local or remote writes the pass performed
    pub fn writes(&self) -> usize {
        self.created + self.updated
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Err(Partial)` when any item failed
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SyncError::Partial {
                failed: self.failed(),
                total: self.total(),
            })
        }
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {}, updated {}, skipped {}, failed {}",
            self.created,
            self.updated,
            self.skipped,
            self.failed()
        )
    }
}

/// Runs fetch and upload passes for one folder, with its collaborators injected
pub struct Reconciler {
    api: Arc<dyn NotesApi>,
    store: Arc<dyn FileStore>,
    folder: String,
    item_timeout: Duration,
}

impl Reconciler {
    pub fn new(api: Arc<dyn NotesApi>, store: Arc<dyn FileStore>, config: &Config) -> Self {
        Self {
            api,
            store,
            folder: crate::notes::listing::normalize_folder(&config.note_folder),
            item_timeout: config.item_timeout,
        }
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Remote notes, with titles resolved for untitled records
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        reader::list_notes(self.api.as_ref(), self.store.as_ref(), &self.folder).await
    }
}

/// A per-item unit of work: the note it concerns, the op to blame on timeout, and the work
pub(crate) struct ItemTask<F> {
    pub note: String,
    pub op: SyncOp,
    pub work: F,
}

/// Spawn every item, wait for all of them, and tally the outcomes.
/// With `timeout` set, an item still running when it expires is dropped and fails.
pub(crate) async fn run_items<F>(pass: &str, timeout: Option<Duration>, items: Vec<ItemTask<F>>) -> SyncReport
where
    F: Future<Output = ItemResult> + Send + 'static,
{
    let mut set = JoinSet::new();
    let mut names = HashMap::new();
    for ItemTask { note, op, work } in items {
        let label = (note.clone(), op);
        let handle = set.spawn(async move {
            let work = AssertUnwindSafe(work).catch_unwind();
            let finished = match timeout {
                Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| limit),
                None => Ok(work.await),
            };
            match finished {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(ItemFailure::new(
                    note,
                    op,
                    SyncError::Task("item task panicked".to_string()),
                )),
                Err(limit) => Err(ItemFailure::new(note, op, SyncError::Timeout(limit))),
            }
        });
        names.insert(handle.id(), label);
    }

    let mut report = SyncReport::default();
    while let Some(joined) = set.join_next_with_id().await {
        let result = match joined {
            Ok((_, result)) => result,
            Err(e) => {
                let (note, op) = names
                    .remove(&e.id())
                    .unwrap_or_else(|| ("<unknown>".to_string(), SyncOp::Fetch));
                Err(ItemFailure::new(note, op, SyncError::Task(e.to_string())))
            }
        };
        if let Err(failure) = &result {
            log::warn!("[{}] {}", pass, failure);
        }
        report.record(result);
    }
    report
}
