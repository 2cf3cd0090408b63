//! SQLite-based unified store using `SeaORM`.
//!
//! A single [`Store`] implements `BindingRepository`, `ProfileRepository`,
//! `CodeLedger`, and `FavoritesRepository`, backed by a local `SQLite`
//! database file. The exactly-once code redemption guarantee lives here:
//! `CodeLedger::begin` issues a conditional update inside a transaction and
//! decides the winner from the affected-row count.

mod binding_repo;
mod code_ledger;
pub(crate) mod entity;
mod favorites_repo;
mod migration;
mod profile_repo;

use std::path::Path;

use emby_orchestrator_core::error::{CoreError, CoreResult};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use migration::Migrator;

/// SQLite-based unified store.
///
/// Implements all four storage traits against a single `SQLite` database
/// file. Multiple process instances may share the file; consistency relies
/// on `SQLite` transactions, not in-process locking.
pub struct Store {
    /// Shared `SeaORM` database connection.
    pub(crate) db: DatabaseConnection,
}

impl Store {
    /// Create a new `SQLite` store.
    ///
    /// - `db_path`: Path to the `SQLite` database file (created if not
    ///   exists).
    ///
    /// # Errors
    /// Returns `CoreError::StorageError` if directory creation, database
    /// connection, or schema migration fails.
    pub async fn new(db_path: &Path) -> CoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::StorageError(format!("Failed to create directory: {e}")))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = Database::connect(&db_url)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to connect to SQLite: {e}")))?;

        let store = Self { db };

        // Ensure schema is up to date before the store is used.
        Migrator::up(&store.db, None)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to run migrations: {e}")))?;

        Ok(store)
    }
}
