use clap::{Parser, Subcommand};
use dotenv::dotenv;
use opal_sync::config::Config;
use opal_sync::notes::VaultStore;
use opal_sync::remote::HttpNotesApi;
use opal_sync::sync::{Reconciler, SyncReport};
use opal_sync::{Result, SyncError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "opal-sync")]
#[command(about = "Sync a folder of Markdown notes with the Opal notes API")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    /// Notes API base URL (overrides OPAL_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Vault-relative folder to sync, "/" for the vault root (overrides OPAL_NOTE_FOLDER)
    #[arg(long, global = true)]
    folder: Option<String>,

    /// Vault directory (overrides OPAL_VAULT_DIR)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Per-note timeout in seconds (overrides OPAL_ITEM_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Pull remote notes into the vault folder
    Fetch,
    /// Push vault notes to the remote store
    Upload,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = Config::read_env()?;
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(folder) = &self.folder {
            config.note_folder = folder.clone();
        }
        if let Some(vault) = &self.vault {
            config.vault_dir = vault.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.item_timeout = Duration::from_secs(secs);
        }
        config.validate()
    }
}

async fn run(cli: Cli) -> Result<SyncReport> {
    let config = cli.config()?;
    if !config.vault_dir.is_dir() {
        return Err(SyncError::Config(format!(
            "vault directory {} does not exist",
            config.vault_dir.display()
        )));
    }

    log::info!(
        "Syncing '{}' in {} with {}",
        config.note_folder,
        config.vault_dir.display(),
        config.api_base_url
    );

    let api = Arc::new(HttpNotesApi::new(&config.api_base_url, config.item_timeout)?);
    let store = Arc::new(VaultStore::new(config.vault_dir.clone()));
    let reconciler = Reconciler::new(api, store, &config);

    match cli.cmd {
        Command::Fetch => reconciler.fetch_notes().await,
        Command::Upload => reconciler.upload_notes().await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(report) => {
            for failure in &report.failures {
                log::error!("{}", failure);
            }
            println!("{}", report);
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            log::error!("Sync failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
