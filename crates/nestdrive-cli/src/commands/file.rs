//! File commands: upload, download, link, rm.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use clap::Args;
use tokio_util::sync::CancellationToken;

use nestdrive_core::error::{AppError, ErrorKind};
use nestdrive_core::result::AppResult;
use nestdrive_core::types::{FileId, FolderId};
use nestdrive_service::BatchItem;
use nestdrive_service::file::BatchProgressCallback;
use nestdrive_storage::UploadProgress;

use super::Workspace;
use super::folder::EntryRow;
use crate::output::{self, OutputFormat};

/// Arguments for `upload`
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Local files to upload
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Destination folder ID (omit for root)
    #[arg(short, long)]
    pub folder: Option<FolderId>,
}

/// Arguments for `download`
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// File ID
    pub file: FileId,
    /// Where to write the content (defaults to the file's name)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `link`
#[derive(Debug, Args)]
pub struct LinkArgs {
    /// File ID
    pub file: FileId,
}

/// Arguments for `rm`
#[derive(Debug, Args)]
pub struct RmArgs {
    /// File ID
    pub file: FileId,
}

/// Upload local files. Every file is attempted; the command fails if any
/// of them did.
pub async fn upload(ws: &Workspace, args: &UploadArgs, format: OutputFormat) -> AppResult<()> {
    let ctx = ws.context()?;

    let mut items = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::validation(format!("Not a file: {}", path.display())))?;
        let data = tokio::fs::read(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Validation,
                format!("Cannot read {}: {e}", path.display()),
                e,
            )
        })?;
        items.push(BatchItem {
            name: name.to_string(),
            data: Bytes::from(data),
        });
    }

    let progress: BatchProgressCallback = Arc::new(|name: &str, p: UploadProgress| {
        eprintln!("  {name}: {:>3.0}%", p.fraction() * 100.0);
    });
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let outcomes = ws
        .state
        .uploads
        .upload_batch(&ctx, args.folder.clone(), items, Some(progress), &cancel)
        .await;

    let mut rows = Vec::new();
    let mut failed = 0;
    for outcome in outcomes {
        match outcome.result {
            Ok(file) => rows.push(EntryRow {
                kind: "file",
                id: file.id.to_string(),
                name: file.name,
                size: output::format_size(file.size_bytes),
                modified: file.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            }),
            Err(e) => {
                failed += 1;
                output::print_error(&format!("{}: {}", outcome.name, e.user_message()));
            }
        }
    }
    output::print_list(&rows, format);

    if failed > 0 {
        return Err(AppError::new(
            ErrorKind::Storage,
            format!("{failed} of {} uploads failed", args.paths.len()),
        ));
    }
    Ok(())
}

/// Download a file.
pub async fn download(ws: &Workspace, args: &DownloadArgs) -> AppResult<()> {
    let ctx = ws.context()?;
    let (file, data) = ws.state.files.download(&ctx, &args.file).await?;
    let out = args.out.clone().unwrap_or_else(|| PathBuf::from(&file.name));
    tokio::fs::write(&out, &data).await?;
    output::print_success(&format!(
        "Saved '{}' ({}) to {}",
        file.name,
        output::format_size(file.size_bytes),
        out.display()
    ));
    Ok(())
}

/// Print a file's retrieval URL.
pub async fn link(ws: &Workspace, args: &LinkArgs) -> AppResult<()> {
    let ctx = ws.context()?;
    let url = ws.state.files.resolve_url(&ctx, &args.file).await?;
    println!("{url}");
    Ok(())
}

/// Delete a file.
pub async fn rm(ws: &Workspace, args: &RmArgs) -> AppResult<()> {
    let ctx = ws.context()?;
    ws.state
        .files
        .delete_file(&ctx, &args.file, &CancellationToken::new())
        .await?;
    output::print_success(&format!("Deleted file {}", args.file));
    Ok(())
}
