//! # vk-db-sqlite
//!
//! SQLite implementation of the vk-core storage ports. This module maps
//! between the relational rows and the domain models; the reaction
//! dedup invariant lives here as a unique index so it holds under
//! concurrent writers, not just within one process.

mod catalog;
mod engage;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use vk_core::error::{AppError, Result};

/// Shared handle implementing both `CatalogRepo` and `EngagementRepo`.
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to `url` and applies embedded migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .connect(url)
            .await
            .map_err(db_err)?;
        Self::migrate(&pool).await?;
        Ok(SqliteStore { pool })
    }

    /// In-memory database pinned to a single connection (each SQLite
    /// memory connection is its own database). Used by tests and local
    /// experiments.
    pub async fn memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_err)?;
        Self::migrate(&pool).await?;
        Ok(SqliteStore { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|err| AppError::Storage(format!("migration failed: {err}")))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Maps sqlx failures onto the core taxonomy. Unique-index violations
/// become `Conflict` so the reaction engine can resolve the lost race.
pub(crate) fn db_err(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return AppError::Conflict(db.message().to_string());
        }
    }
    AppError::Storage(err.to_string())
}
