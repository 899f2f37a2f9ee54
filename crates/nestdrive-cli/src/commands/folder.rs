//! Folder commands: mkdir, ls, tree, rename, mv, rmdir.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use nestdrive_core::result::AppResult;
use nestdrive_core::types::FolderId;
use nestdrive_entity::{FolderNode, Listing};

use super::{Entry, Workspace};
use crate::output::{self, OutputFormat};

/// Arguments for `mkdir`
#[derive(Debug, Args)]
pub struct MkdirArgs {
    /// Folder name
    pub name: String,
    /// Parent folder ID (omit for root)
    #[arg(short, long)]
    pub parent: Option<FolderId>,
}

/// Arguments for `ls`
#[derive(Debug, Args)]
pub struct LsArgs {
    /// Folder ID (omit for root)
    pub folder: Option<FolderId>,
}

/// Arguments for `rename`
#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Folder or file ID
    pub id: String,
    /// New name
    pub name: String,
}

/// Arguments for `mv`
#[derive(Debug, Args)]
pub struct MvArgs {
    /// Folder ID to move
    pub folder: FolderId,
    /// Destination folder ID (omit for root)
    #[arg(short, long)]
    pub to: Option<FolderId>,
}

/// Arguments for `rmdir`
#[derive(Debug, Args)]
pub struct RmdirArgs {
    /// Folder ID
    pub folder: FolderId,
}

/// One row of a listing
#[derive(Debug, Serialize, Tabled)]
pub struct EntryRow {
    /// "dir" or "file"
    pub kind: &'static str,
    /// ID
    pub id: String,
    /// Name
    pub name: String,
    /// Size
    pub size: String,
    /// Last modified
    pub modified: String,
}

/// Rows for a listing, folders first.
pub fn listing_rows(listing: &Listing) -> Vec<EntryRow> {
    let folders = listing.folders.iter().map(|f| EntryRow {
        kind: "dir",
        id: f.id.to_string(),
        name: f.name.clone(),
        size: "-".to_string(),
        modified: f.updated_at.format("%Y-%m-%d %H:%M").to_string(),
    });
    let files = listing.files.iter().map(|f| EntryRow {
        kind: "file",
        id: f.id.to_string(),
        name: f.name.clone(),
        size: output::format_size(f.size_bytes),
        modified: f.updated_at.format("%Y-%m-%d %H:%M").to_string(),
    });
    folders.chain(files).collect()
}

/// Folder tree display row
#[derive(Debug, Serialize, Tabled)]
struct TreeRow {
    /// Indented name
    name: String,
    /// Folder ID
    id: String,
    /// Files directly inside
    files: u64,
}

/// Create a folder.
pub async fn mkdir(ws: &Workspace, args: &MkdirArgs, format: OutputFormat) -> AppResult<()> {
    let ctx = ws.context()?;
    let folder = ws
        .state
        .folders
        .create_folder(&ctx, args.parent.clone(), &args.name)
        .await?;
    match format {
        OutputFormat::Json => output::print_json(&folder),
        OutputFormat::Table => {
            output::print_success(&format!("Created folder '{}' ({})", folder.name, folder.id))
        }
    }
    Ok(())
}

/// List a folder's children, with a breadcrumb for nested folders.
pub async fn ls(ws: &Workspace, args: &LsArgs, format: OutputFormat) -> AppResult<()> {
    let ctx = ws.context()?;
    let listing = ws.state.folders.list_children(&ctx, args.folder.as_ref()).await?;

    match format {
        OutputFormat::Json => output::print_json(&listing),
        OutputFormat::Table => {
            let mut crumbs = vec!["/".to_string()];
            if let Some(folder_id) = &args.folder {
                let chain = ws.state.folders.ancestors(&ctx, folder_id).await?;
                crumbs.extend(chain.into_iter().map(|f| f.name));
            }
            println!("{}", crumbs.join(" › "));
            output::print_list(&listing_rows(&listing), format);
        }
    }
    Ok(())
}

/// Show the folder tree.
pub async fn tree(ws: &Workspace, format: OutputFormat) -> AppResult<()> {
    let ctx = ws.context()?;
    let tree = ws.state.folders.tree(&ctx).await?;
    if format == OutputFormat::Json {
        output::print_json(&tree);
        return Ok(());
    }

    let mut rows = Vec::new();
    tree.walk(|node: &FolderNode| {
        rows.push(TreeRow {
            name: format!("{}{}", "  ".repeat(node.depth), node.name),
            id: node.id.to_string(),
            files: node.file_count,
        });
    });
    output::print_list(&rows, format);
    println!("{} folder(s)", tree.total_folders);
    Ok(())
}

/// Rename a folder or a file.
pub async fn rename(ws: &Workspace, args: &RenameArgs) -> AppResult<()> {
    let ctx = ws.context()?;
    match ws.resolve(&ctx, &args.id).await? {
        Entry::Folder(folder) => {
            ws.state.folders.rename_folder(&ctx, &folder.id, &args.name).await?;
        }
        Entry::File(file) => {
            ws.state.files.rename_file(&ctx, &file.id, &args.name).await?;
        }
    }
    output::print_success(&format!("Renamed {} to '{}'", args.id, args.name));
    Ok(())
}

/// Move a folder.
pub async fn mv(ws: &Workspace, args: &MvArgs) -> AppResult<()> {
    let ctx = ws.context()?;
    let folder = ws
        .state
        .folders
        .move_folder(&ctx, &args.folder, args.to.clone())
        .await?;
    let target = folder
        .parent_id
        .as_ref()
        .map_or_else(|| "the root".to_string(), |p| p.to_string());
    output::print_success(&format!("Moved '{}' into {target}", folder.name));
    Ok(())
}

/// Delete a folder and its contents.
pub async fn rmdir(ws: &Workspace, args: &RmdirArgs) -> AppResult<()> {
    let ctx = ws.context()?;
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    ws.state
        .folders
        .delete_folder(&ctx, &args.folder, &cancel)
        .await?;
    output::print_success(&format!("Deleted folder {}", args.folder));
    Ok(())
}
