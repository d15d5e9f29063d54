use std::path::PathBuf;

use async_trait::async_trait;
use fee_core::db::{DbConfig, PortalRepository, RepositoryError, RepositoryFactory};
use tracing::{debug, warn};

use crate::repository::SqliteRepository;

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`FEE_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **Crate manifest dir**: `$CARGO_MANIFEST_DIR/seeds` as last resort
///    (dev/tests when run from the build tree).
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FEE_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`fee_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use fee_core::db::RepositoryRegistry;
/// use fee_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`, migrate it
    /// and apply the seed files.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"portal.db"`. Created if missing.
    /// * A `sqlite:` URL.
    /// * `":memory:"` for an ephemeral database.
    ///
    /// A missing seeds directory is logged and skipped.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn PortalRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        let seeds = seeds_dir();
        if seeds.is_dir() {
            repo.run_seeds(&seeds)
                .await
                .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        } else {
            warn!(dir = %seeds.display(), "seeds directory not found; starting without seed data");
        }

        debug!(connection = %config.connection_string, "sqlite repository ready");
        Ok(Box::new(repo))
    }
}
