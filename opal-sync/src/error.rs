use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Connection failure or non-2xx response from the notes API
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed JSON from the API, or frontmatter missing an expected field
    #[error("parse error: {0}")]
    Parse(String),

    /// A listed file vanished before it could be read or written
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("file already exists: {0}")]
    Collision(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The remote record exists but its id could not be written to the local file
    #[error("remote record {id} created but not recorded in {path}: {source}")]
    WriteBack {
        path: String,
        id: String,
        #[source]
        source: Box<SyncError>,
    },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("task failed: {0}")]
    Task(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{failed} of {total} notes failed to sync")]
    Partial { failed: usize, total: usize },
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Map an io error on a vault path to the matching variant
    pub fn from_io(path: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => SyncError::NotFound(path.to_string()),
            io::ErrorKind::AlreadyExists => SyncError::Collision(path.to_string()),
            _ => SyncError::Io {
                path: path.to_string(),
                source: err,
            },
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Parse(err.to_string())
        } else {
            SyncError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Parse(err.to_string())
    }
}
