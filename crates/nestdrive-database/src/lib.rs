//! # nestdrive-database
//!
//! The owner-scoped namespace store: folder and file records kept as an
//! adjacency list, with an in-process implementation and a SQLite one.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod sqlite;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryNamespaceStore;
pub use sqlite::SqliteNamespaceStore;
pub use store::NamespaceStore;

use std::sync::Arc;

use nestdrive_core::config::DatabaseConfig;
use nestdrive_core::result::AppResult;

/// Build the namespace store selected by configuration, running migrations
/// when SQLite is used.
pub async fn open_store(config: &DatabaseConfig) -> AppResult<Arc<dyn NamespaceStore>> {
    if config.is_in_process() {
        tracing::info!("Using in-process namespace store");
        return Ok(Arc::new(MemoryNamespaceStore::new()));
    }
    let pool = DatabasePool::connect(config).await?;
    migration::run_migrations(pool.pool()).await?;
    Ok(Arc::new(SqliteNamespaceStore::new(pool)))
}
