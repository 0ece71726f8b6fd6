//! Database pool initialization.
//!
//! SYSTEM CONTEXT
//! ==============
//! The households table lives in the Supabase Postgres instance and its
//! schema is owned there, so startup only opens the shared SQLx pool; no
//! migrations run from this process.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Initialize the `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
