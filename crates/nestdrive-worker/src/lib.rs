//! Background jobs for NestDrive.
//!
//! This crate provides:
//! - A job executor that dispatches a job type to its handler
//! - An interval scheduler that runs registered job types periodically
//! - The reconciliation job, which repairs drift between the namespace
//!   store and the object store

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use scheduler::IntervalScheduler;
