use super::frontmatter::Frontmatter;
use chrono::{DateTime, Utc};
use opal_types::RemoteRecord;

pub const NOTE_EXTENSION: &str = "md";

/// A note as the reconcilers see it: title, body, and sync metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// File name without the `.md` extension
    pub title: String,
    /// Body only, frontmatter stripped
    pub content: String,
    pub metadata: NoteMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteMetadata {
    /// Remote `_id`; empty until the note has been uploaded once
    pub id: String,
    pub last_modified: DateTime<Utc>,
}

impl Note {
    pub fn from_record(record: RemoteRecord, title: String) -> Self {
        Self {
            title,
            content: record.content,
            metadata: NoteMetadata {
                id: record.id,
                last_modified: record.last_modified,
            },
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.title, NOTE_EXTENSION)
    }

    /// Full file content: fresh `id`/`lastModified` frontmatter followed by the body
    pub fn to_file_content(&self) -> String {
        let mut out = Frontmatter::from_metadata(&self.metadata).encode();
        out.push_str(&self.content);
        out
    }
}

/// Handle to a Markdown file in the vault
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteFile {
    /// Vault-relative path with `/` separators
    pub path: String,
    /// `Draft.md`
    pub name: String,
    /// `Draft`
    pub basename: String,
}

impl NoteFile {
    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let basename = name
            .strip_suffix(&format!(".{}", NOTE_EXTENSION))
            .unwrap_or(&name)
            .to_string();
        Self {
            path: path.to_string(),
            name,
            basename,
        }
    }
}
