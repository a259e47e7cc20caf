//! Local side of the sync: Markdown notes in a vault folder.
//!
//! Each note is one `.md` file whose frontmatter mirrors the remote record's
//! `id` and `lastModified`. All file access goes through a [`FileStore`] so the
//! reconcilers never reach into the filesystem directly.

pub mod file_ops;
pub mod frontmatter;
pub mod listing;
pub mod model;
pub mod store;
pub mod title;

pub use frontmatter::{Frontmatter, FrontmatterValue};
pub use model::{Note, NoteFile, NoteMetadata};
pub use store::{FileStamp, FileStore, MetadataCache, VaultStore};
