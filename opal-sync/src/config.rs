use crate::error::SyncError;
use crate::notes::listing;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable names - single source of truth
pub mod env_vars {
    /// Base URL of the notes collection, e.g. `http://localhost:3000/api/notes/`
    pub const API_URL: &str = "OPAL_API_URL";
    /// Vault-relative folder holding synced notes. `/` means the vault root.
    pub const NOTE_FOLDER: &str = "OPAL_NOTE_FOLDER";
    pub const VAULT_DIR: &str = "OPAL_VAULT_DIR";
    /// Upper bound for one note's network round trip and file writes
    pub const ITEM_TIMEOUT_SECS: &str = "OPAL_ITEM_TIMEOUT_SECS";
}

/// Default values
pub mod defaults {
    pub const API_URL: &str = "http://localhost:3000/api/notes/";
    pub const NOTE_FOLDER: &str = "Note folder";
    pub const VAULT_DIR: &str = ".";
    pub const ITEM_TIMEOUT_SECS: u64 = 30;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub note_folder: String,
    pub vault_dir: PathBuf,
    pub item_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: defaults::API_URL.to_string(),
            note_folder: defaults::NOTE_FOLDER.to_string(),
            vault_dir: PathBuf::from(defaults::VAULT_DIR),
            item_timeout: Duration::from_secs(defaults::ITEM_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load from the process environment (after `.env` has been applied)
    pub fn from_env() -> Result<Self, SyncError> {
        Self::read_env()?.validate()
    }

    /// Load from an arbitrary variable lookup and validate
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::read_lookup(lookup)?.validate()
    }

    /// Environment values without validation, for callers that override
    /// some of them before calling `validate`
    pub fn read_env() -> Result<Self, SyncError> {
        Self::read_lookup(|key| env::var(key).ok())
    }

    /// Unset or blank values fall back to defaults. Only the timeout is
    /// checked here, since it has to parse.
    pub fn read_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(url) = get(env_vars::API_URL) {
            config.api_base_url = url;
        }
        if let Some(folder) = get(env_vars::NOTE_FOLDER) {
            config.note_folder = folder;
        }
        if let Some(dir) = get(env_vars::VAULT_DIR) {
            config.vault_dir = PathBuf::from(dir);
        }
        if let Some(secs) = get(env_vars::ITEM_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                SyncError::Config(format!("{} must be a whole number of seconds: {}", env_vars::ITEM_TIMEOUT_SECS, e))
            })?;
            config.item_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Check the values and normalise the note folder
    pub fn validate(mut self) -> Result<Self, SyncError> {
        let parsed = url::Url::parse(&self.api_base_url)
            .map_err(|e| SyncError::Config(format!("invalid API URL '{}': {}", self.api_base_url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(SyncError::Config(format!(
                "API URL must be http or https, got '{}'",
                self.api_base_url
            )));
        }
        if self.item_timeout.is_zero() {
            return Err(SyncError::Config("item timeout must be greater than zero".to_string()));
        }
        self.note_folder = listing::normalize_folder(&self.note_folder);
        Ok(self)
    }
}
