//! Helpdesk database connection pool and initialization.

use std::path::{Path, PathBuf};

use sqlx::SqlitePool;
use tracing::info;

use crate::{
    error::{DbError, DbResult},
    sqlite_runtime::create_file_pool,
};

/// Helpdesk database pool wrapper
#[derive(Debug, Clone)]
pub struct HelpdeskDbPool {
    pool: SqlitePool,
}

impl HelpdeskDbPool {
    /// Open the database at the default location, running migrations.
    pub async fn new() -> DbResult<Self> {
        let db_path = Self::default_db_path()?;
        Self::open(&db_path).await
    }

    /// Open (or create) the database at `db_path`, running migrations.
    ///
    /// This function:
    /// 1. Ensures the parent directory exists
    /// 2. Creates/connects to the database
    /// 3. Runs migrations
    pub async fn open(db_path: &Path) -> DbResult<Self> {
        info!("Initializing helpdesk database at: {}", db_path.display());

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let pool = create_file_pool(db_path, 5).await?;

        Self::run_migrations(&pool).await?;

        info!("Helpdesk database initialized successfully");
        Ok(Self { pool })
    }

    /// Get the inner SQLx pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the default database file path
    pub fn default_db_path() -> DbResult<PathBuf> {
        let data_dir = dirs::data_dir().ok_or(DbError::NoConfigDir)?;
        Ok(data_dir.join("helpdesk").join("helpdesk.sqlite3"))
    }

    /// Run database migrations using sqlx migrate macro
    pub(crate) async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;

        info!("Helpdesk database migrations completed");
        Ok(())
    }

    /// Close the pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Create a HelpdeskDbPool from an existing SqlitePool (for testing)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TicketRepository;

    #[tokio::test]
    async fn test_open_creates_file_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("helpdesk.sqlite3");

        let db = HelpdeskDbPool::open(&path).await.unwrap();
        TicketRepository::create(db.pool(), "Where is my invoice?", None)
            .await
            .unwrap();
        db.close().await;
        assert!(path.exists());

        let reopened = HelpdeskDbPool::open(&path).await.unwrap();
        let tickets = TicketRepository::list_all(reopened.pool()).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].question, "Where is my invoice?");
    }
}
