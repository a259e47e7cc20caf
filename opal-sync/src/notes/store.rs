//! FileStore, the vault capability handed to the reconcilers
//!
//! `VaultStore` keeps a parsed-frontmatter cache keyed by vault path. Entries are
//! refreshed on every read and write through the store and dropped when the
//! file's mtime or length no longer matches.

use super::file_ops;
use super::frontmatter::{self, Frontmatter};
use super::model::NoteFile;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Every Markdown file in the vault
    async fn list_markdown_files(&self) -> Result<Vec<NoteFile>>;

    async fn read(&self, path: &str) -> Result<String>;

    /// Replace the content of an existing file
    async fn modify(&self, path: &str, content: &str) -> Result<()>;

    /// Create a file that must not exist yet (`Collision` otherwise)
    async fn create(&self, path: &str, content: &str) -> Result<()>;

    /// Cached parsed frontmatter; `None` when the file has no frontmatter block
    async fn frontmatter(&self, path: &str) -> Result<Option<Frontmatter>>;
}

/// What a file looked like on disk when it was parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl From<&std::fs::Metadata> for FileStamp {
    fn from(meta: &std::fs::Metadata) -> Self {
        Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        }
    }
}

/// Parsed frontmatter keyed by vault path, tagged with the file's stamp when parsed
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: DashMap<String, CachedFrontmatter>,
}

#[derive(Debug, Clone)]
struct CachedFrontmatter {
    stamp: FileStamp,
    frontmatter: Option<Frontmatter>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached parse if it was taken at `stamp`. `Some(None)` is a
    /// cached file without frontmatter.
    pub fn get(&self, path: &str, stamp: FileStamp) -> Option<Option<Frontmatter>> {
        let entry = self.entries.get(path)?;
        if stamp.modified.is_some() && entry.stamp == stamp {
            Some(entry.frontmatter.clone())
        } else {
            None
        }
    }

    /// Parse `content` and cache the result for `path`
    pub fn update(&self, path: &str, stamp: FileStamp, content: &str) -> Option<Frontmatter> {
        let frontmatter = frontmatter::parse_frontmatter(content);
        self.entries.insert(
            path.to_string(),
            CachedFrontmatter {
                stamp,
                frontmatter: frontmatter.clone(),
            },
        );
        frontmatter
    }

    pub fn invalidate(&self, path: &str) {
        self.entries.remove(path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Vault on local disk
pub struct VaultStore {
    root: PathBuf,
    cache: MetadataCache,
}

impl VaultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: MetadataCache::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    async fn stamp(&self, path: &str) -> Result<FileStamp> {
        let meta = tokio::fs::metadata(file_ops::vault_path(&self.root, path)?)
            .await
            .map_err(|e| SyncError::from_io(path, e))?;
        Ok(FileStamp::from(&meta))
    }

    /// Re-stat after a write and cache the parse of what was written
    async fn remember(&self, path: &str, content: &str) {
        match self.stamp(path).await {
            Ok(stamp) => {
                self.cache.update(path, stamp, content);
            }
            Err(_) => self.cache.invalidate(path),
        }
    }
}

#[async_trait]
impl FileStore for VaultStore {
    async fn list_markdown_files(&self) -> Result<Vec<NoteFile>> {
        let root = self.root.clone();
        let paths = tokio::task::spawn_blocking(move || file_ops::list_notes(&root))
            .await
            .map_err(|e| SyncError::Task(format!("vault scan aborted: {}", e)))?
            .map_err(|e| SyncError::from_io(&self.root.to_string_lossy(), e))?;

        log::debug!("[VAULT] {} markdown files under {}", paths.len(), self.root.display());
        Ok(paths.iter().map(|p| NoteFile::from_path(p)).collect())
    }

    async fn read(&self, path: &str) -> Result<String> {
        match file_ops::read_note(&self.root, path).await {
            Ok(content) => {
                self.remember(path, &content).await;
                Ok(content)
            }
            Err(e) => {
                self.cache.invalidate(path);
                Err(e)
            }
        }
    }

    async fn modify(&self, path: &str, content: &str) -> Result<()> {
        file_ops::write_note(&self.root, path, content).await?;
        self.remember(path, content).await;
        log::debug!("[VAULT] Modified {}", path);
        Ok(())
    }

    async fn create(&self, path: &str, content: &str) -> Result<()> {
        file_ops::create_note(&self.root, path, content).await?;
        self.remember(path, content).await;
        log::debug!("[VAULT] Created {}", path);
        Ok(())
    }

    async fn frontmatter(&self, path: &str) -> Result<Option<Frontmatter>> {
        let stamp = self.stamp(path).await?;
        if let Some(cached) = self.cache.get(path, stamp) {
            return Ok(cached);
        }
        let content = file_ops::read_note(&self.root, path).await?;
        Ok(self.cache.update(path, stamp, &content))
    }
}
