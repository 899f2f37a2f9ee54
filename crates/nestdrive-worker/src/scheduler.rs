//! Interval scheduler for periodic maintenance jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use nestdrive_core::config::WorkerConfig;

use crate::executor::{JobExecutionError, JobExecutor};
use crate::jobs::RECONCILE_JOB;

#[derive(Debug, Clone)]
struct ScheduledTask {
    job_type: String,
    period: Duration,
}

/// Runs registered job types on fixed intervals until cancelled.
///
/// A job type never overlaps with itself: a tick that arrives while the
/// previous run is still going is skipped.
#[derive(Debug)]
pub struct IntervalScheduler {
    executor: Arc<JobExecutor>,
    tasks: Vec<ScheduledTask>,
}

impl IntervalScheduler {
    /// Create a scheduler with no tasks
    pub fn new(executor: Arc<JobExecutor>) -> Self {
        Self {
            executor,
            tasks: Vec::new(),
        }
    }

    /// Run `job_type` every `period`, starting immediately
    pub fn every(mut self, job_type: impl Into<String>, period: Duration) -> Self {
        self.tasks.push(ScheduledTask {
            job_type: job_type.into(),
            period: period.max(Duration::from_secs(1)),
        });
        self
    }

    /// Register the tasks enabled by configuration
    pub fn with_default_tasks(self, config: &WorkerConfig) -> Self {
        if !config.reconcile_enabled {
            info!("Reconciliation disabled by configuration");
            return self;
        }
        let period = Duration::from_secs(config.reconcile_interval_seconds);
        info!(job_type = RECONCILE_JOB, every_seconds = period.as_secs(), "Registered scheduled job");
        self.every(RECONCILE_JOB, period)
    }

    /// Number of scheduled tasks
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Run every task until `cancel` fires
    pub async fn run(self, cancel: CancellationToken) {
        let mut set = JoinSet::new();
        for task in self.tasks {
            let executor = Arc::clone(&self.executor);
            let cancel = cancel.clone();
            set.spawn(run_task(executor, task, cancel));
        }
        info!(tasks = set.len(), "Scheduler started");

        while set.join_next().await.is_some() {}
        info!("Scheduler shut down");
    }
}

async fn run_task(executor: Arc<JobExecutor>, task: ScheduledTask, cancel: CancellationToken) {
    let mut ticker = time::interval(task.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = executor.execute(&task.job_type) => result,
        };
        match result {
            Ok(summary) => debug!(job_type = %task.job_type, %summary, "Job completed"),
            Err(JobExecutionError::Transient(msg)) => {
                warn!(job_type = %task.job_type, error = %msg, "Job failed; will run again next tick")
            }
            Err(JobExecutionError::Permanent(msg)) => {
                error!(job_type = %task.job_type, error = %msg, "Job failed permanently; unscheduling");
                break;
            }
            Err(JobExecutionError::Internal(err)) => {
                error!(job_type = %task.job_type, error = %err, "Job internal error")
            }
        }
    }
}
