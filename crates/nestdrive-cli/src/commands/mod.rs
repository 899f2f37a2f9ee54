//! CLI command definitions and dispatch.

pub mod account;
pub mod file;
pub mod folder;
pub mod reconcile;
pub mod watch;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use nestdrive_auth::LocalIdentityProvider;
use nestdrive_core::config::AppConfig;
use nestdrive_core::result::AppResult;
use nestdrive_core::types::{FileId, FolderId};
use nestdrive_entity::{File, Folder};
use nestdrive_service::{AppState, SessionContext, SessionScope};

use crate::output::OutputFormat;

/// NestDrive: personal folders and files with live listings
#[derive(Debug, Parser)]
#[command(name = "nestdrive", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `default.toml` and the environment overlays
    #[arg(long, default_value = "config", global = true)]
    pub config_dir: String,

    /// Configuration environment overlay to apply
    #[arg(long, default_value = "development", global = true)]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create an account and sign in
    Register(account::CredentialArgs),
    /// Sign in
    Login(account::CredentialArgs),
    /// Sign out
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Create a folder
    Mkdir(folder::MkdirArgs),
    /// List a folder's children
    Ls(folder::LsArgs),
    /// Show the folder tree
    Tree,
    /// Rename a folder or file
    Rename(folder::RenameArgs),
    /// Move a folder under another folder or the root
    Mv(folder::MvArgs),
    /// Delete a folder and its contents
    Rmdir(folder::RmdirArgs),
    /// Upload one or more files
    Upload(file::UploadArgs),
    /// Download a file
    Download(file::DownloadArgs),
    /// Print a file's retrieval URL
    Link(file::LinkArgs),
    /// Delete a file
    Rm(file::RmArgs),
    /// Follow a folder's listing live
    Watch(watch::WatchArgs),
    /// Repair drift between file records and stored objects
    Reconcile,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> AppResult<()> {
        let ws = Workspace::open(self).await?;
        match &self.command {
            Commands::Register(args) => account::register(&ws, args).await,
            Commands::Login(args) => account::login(&ws, args).await,
            Commands::Logout => account::logout(&ws).await,
            Commands::Whoami => account::whoami(&ws, self.format),
            Commands::Mkdir(args) => folder::mkdir(&ws, args, self.format).await,
            Commands::Ls(args) => folder::ls(&ws, args, self.format).await,
            Commands::Tree => folder::tree(&ws, self.format).await,
            Commands::Rename(args) => folder::rename(&ws, args).await,
            Commands::Mv(args) => folder::mv(&ws, args).await,
            Commands::Rmdir(args) => folder::rmdir(&ws, args).await,
            Commands::Upload(args) => file::upload(&ws, args, self.format).await,
            Commands::Download(args) => file::download(&ws, args).await,
            Commands::Link(args) => file::link(&ws, args).await,
            Commands::Rm(args) => file::rm(&ws, args).await,
            Commands::Watch(args) => watch::execute(&ws, args, self.format).await,
            Commands::Reconcile => reconcile::execute(&ws, self.format).await,
        }
    }
}

/// Everything a command needs: the wired services and the session.
#[derive(Debug)]
pub struct Workspace {
    /// Services and backends.
    pub state: AppState,
    /// Signed-in session.
    pub session: SessionScope,
}

impl Workspace {
    async fn open(cli: &Cli) -> AppResult<Self> {
        let config = AppConfig::load_from(&cli.config_dir, &cli.env)?;
        let provider = Arc::new(LocalIdentityProvider::open(&config.auth).await?);
        let state = AppState::from_config(config).await?;
        let session = SessionScope::spawn(provider, state.engine.clone());
        Ok(Self { state, session })
    }

    /// Context of the signed-in user; fails when signed out.
    pub fn context(&self) -> AppResult<SessionContext> {
        self.session.context()
    }

    /// Look an id up as a folder first, then as a file. Both kinds share
    /// one id space.
    pub async fn resolve(&self, ctx: &SessionContext, id: &str) -> AppResult<Entry> {
        let folder_id: FolderId = id.parse()?;
        if let Some(folder) = self.state.store.find_folder(&ctx.owner_id, &folder_id).await? {
            return Ok(Entry::Folder(folder));
        }
        let file_id: FileId = id.parse()?;
        let file = self.state.files.get_file(ctx, &file_id).await?;
        Ok(Entry::File(file))
    }
}

/// A resolved namespace entry.
#[derive(Debug)]
pub enum Entry {
    /// A folder.
    Folder(Folder),
    /// A file.
    File(File),
}
