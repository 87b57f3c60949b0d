use std::path::Path;
use std::sync::Arc;

use rl_core::storage::ReadingStorage;
use rl_core::{Error, Result};

pub mod backends;

pub use backends::*;

/// Builds a storage backend from its configured name. `db_path` only
/// matters for file-backed backends.
pub async fn create_storage(kind: &str, db_path: &Path) -> Result<Arc<dyn ReadingStorage>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(SqliteStorage::new_with_path(db_path).await?)),
        other => Err(Error::Storage(format!("unknown storage backend: {other}"))),
    }
}
