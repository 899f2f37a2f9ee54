//! Periodic sweep repairing record/object drift.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use nestdrive_service::Reconciler;

use crate::executor::{JobExecutionError, JobHandler};

/// Job type of the reconciliation sweep.
pub const RECONCILE_JOB: &str = "reconcile";

/// Runs [`Reconciler::run`] as a job.
#[derive(Debug)]
pub struct ReconcileJobHandler {
    reconciler: Arc<Reconciler>,
}

impl ReconcileJobHandler {
    /// Create a new reconcile job handler
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self { reconciler }
    }
}

#[async_trait]
impl JobHandler for ReconcileJobHandler {
    fn job_type(&self) -> &str {
        RECONCILE_JOB
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        info!("Running reconciliation sweep");
        let report = self
            .reconciler
            .run()
            .await
            .map_err(JobExecutionError::from_app_error)?;
        serde_json::to_value(&report).map_err(|e| JobExecutionError::Internal(e.into()))
    }
}
