//! `watch`: print a folder's listing every time it changes.

use std::time::Duration;

use clap::Args;
use tracing::warn;

use nestdrive_core::result::AppResult;
use nestdrive_core::types::FolderId;
use nestdrive_entity::Listing;

use super::Workspace;
use super::folder::listing_rows;
use crate::output::{self, OutputFormat};

/// Arguments for `watch`
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Folder ID (omit for root)
    pub folder: Option<FolderId>,
    /// Seconds between re-queries, to pick up changes made by other processes
    #[arg(short, long, default_value = "2")]
    pub interval: u64,
}

/// Follow a folder until Ctrl-C or sign-out.
pub async fn execute(ws: &Workspace, args: &WatchArgs, format: OutputFormat) -> AppResult<()> {
    let ctx = ws.context()?;
    let mut subscription = ws
        .state
        .engine
        .subscribe(&ctx.owner_id, args.folder.clone())
        .await?;
    let scope = subscription.scope().clone();

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut shown: Option<Listing> = None;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                if let Err(e) = ws.state.engine.refresh(&scope).await {
                    warn!(scope = %scope, error = %e, "Refresh failed");
                }
            }
            snapshot = subscription.next() => {
                let Some(snapshot) = snapshot else {
                    output::print_warning("Live query closed");
                    break;
                };
                if shown.as_ref() == Some(&snapshot.listing) {
                    continue;
                }
                match format {
                    OutputFormat::Json => output::print_json(snapshot.as_ref()),
                    OutputFormat::Table => {
                        println!(
                            "── {} · #{} · {}",
                            scope,
                            snapshot.sequence,
                            snapshot.taken_at.format("%H:%M:%S")
                        );
                        output::print_list(&listing_rows(&snapshot.listing), format);
                    }
                }
                shown = Some(snapshot.listing.clone());
            }
        }
    }

    subscription.cancel();
    Ok(())
}
