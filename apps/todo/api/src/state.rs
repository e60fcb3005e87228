use crate::config::Config;
use sea_orm::DatabaseConnection;

/// Shared handles built once at startup
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DatabaseConnection,
}
