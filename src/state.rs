use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::storage::AssetStore;

/// Shared application state available to all request handlers via Axum's
/// `State` extractor. Constructed once at startup; the database pool and the
/// asset store are passed around explicitly rather than held in globals.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub assets: AssetStore,
}
