//! `reconcile`: one sweep over both stores.

use nestdrive_core::result::AppResult;

use super::Workspace;
use crate::output::{self, OutputFormat};

/// Run one reconciliation sweep and print what it did.
pub async fn execute(ws: &Workspace, format: OutputFormat) -> AppResult<()> {
    let report = ws.state.reconciler.run().await?;
    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Table => {
            println!("Reconciliation:");
            output::print_kv("Records scanned", &report.records_scanned.to_string());
            output::print_kv("Objects scanned", &report.objects_scanned.to_string());
            output::print_kv(
                "Dangling records removed",
                &report.dangling_records_removed.to_string(),
            );
            output::print_kv(
                "Orphan objects removed",
                &report.orphan_objects_removed.to_string(),
            );
            output::print_kv(
                "Orphan objects deferred",
                &report.orphan_objects_deferred.to_string(),
            );
        }
    }
    Ok(())
}
