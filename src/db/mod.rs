pub mod models;
pub mod repo;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// Open a connection pool for the given SQLite URL.
pub async fn connect(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    // In-memory SQLite gives every pooled connection its own private database,
    // so the pool must stay at a single connection for ":memory:" URLs.
    let max_connections = if db_url.contains(":memory:") { 1 } else { 5 };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await
}
