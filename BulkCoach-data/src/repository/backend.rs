use tracing::debug;

use crate::database::{get_db_pool, DatabasePool};
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;

/// Where a repository keeps its rows.
///
/// Every repository of a running application must be built from clones of the
/// same backend so plans, logs and dismissals are visible to each other.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Pooled SQLite database
    Database(DatabasePool),
    /// Process-local tables
    InMemory(InMemoryStorage),
}

impl StorageBackend {
    /// Use the global database pool when it has been initialized, otherwise in-memory tables
    pub fn from_environment() -> Self {
        match get_db_pool() {
            Ok(pool) => {
                debug!("Using database storage");
                StorageBackend::Database(pool)
            }
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage", e);
                StorageBackend::InMemory(InMemoryStorage::new())
            }
        }
    }

    /// Fresh, empty in-memory tables
    pub fn in_memory() -> Self {
        StorageBackend::InMemory(InMemoryStorage::new())
    }

    /// A private in-memory SQLite database with the schema applied
    pub fn sqlite_in_memory() -> Result<Self, RepositoryError> {
        Ok(StorageBackend::Database(DatabasePool::sqlite_in_memory()?))
    }

    pub fn describe(&self) -> &'static str {
        match self {
            StorageBackend::Database(_) => "sqlite",
            StorageBackend::InMemory(_) => "in-memory",
        }
    }
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::from_environment()
    }
}
