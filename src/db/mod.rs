use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

const MAX_CONNECTIONS: u32 = 20;
const MIN_CONNECTIONS: u32 = 2;

/// Open the database pool handed to every request through
/// [`crate::state::AppState`].
///
/// PostgreSQL in deployment, `sqlite::memory:` in integration tests; SeaORM
/// picks the backend from the URL scheme.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url);
    opts.max_connections(MAX_CONNECTIONS)
        .min_connections(MIN_CONNECTIONS)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(false);

    Ok(Database::connect(opts).await?)
}
