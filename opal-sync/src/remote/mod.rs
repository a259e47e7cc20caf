//! Remote side of the sync: the notes API record store.

mod client;

pub use client::HttpNotesApi;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opal_types::{CreatedRecord, NotePayload, RemoteRecord};

/// The three calls the reconcilers make against the record store
#[async_trait]
pub trait NotesApi: Send + Sync {
    /// `GET /`
    async fn list_records(&self) -> Result<Vec<RemoteRecord>>;

    /// `POST /`; the remote assigns `_id` and `lastModified`
    async fn create_record(&self, payload: &NotePayload) -> Result<CreatedRecord>;

    /// `PUT /<id>`. Returns the new `lastModified` when the remote echoes one
    async fn update_record(&self, id: &str, payload: &NotePayload) -> Result<Option<DateTime<Utc>>>;
}
