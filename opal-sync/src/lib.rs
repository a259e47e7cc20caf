//! Opal Sync keeps a folder of Markdown notes and the Opal notes API in
//! agreement on title, body, and last-modified time.
//!
//! `fetch` materialises remote records as vault files; `upload` pushes vault
//! files to the remote, assigning ids to notes that have never been synced.

pub mod config;
pub mod error;
pub mod notes;
pub mod remote;
pub mod sync;

#[cfg(test)]
mod testing;

pub use error::{Result, SyncError};
