//! Test helpers for helpdesk databases.

use crate::{
    error::DbResult, helpdesk_db::HelpdeskDbPool, sqlite_runtime::create_in_memory_pool,
};

/// Create an in-memory helpdesk database for testing
pub async fn create_test_pool() -> DbResult<HelpdeskDbPool> {
    let pool = create_in_memory_pool(1).await?;

    HelpdeskDbPool::run_migrations(&pool).await?;

    Ok(HelpdeskDbPool::from_pool(pool))
}
