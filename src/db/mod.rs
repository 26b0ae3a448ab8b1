//! Database module
//!
//! Connection pooling, embedded migrations, and table repositories.

pub mod connection;
pub mod repositories;

use sqlx::PgPool;

pub use connection::create_pool;

/// Apply embedded migrations at startup
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
