use std::sync::Arc;

use common::storage::Disk;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    /// Disk receiving uploaded import files (`storage.root/storage.disk`).
    pub disk: Arc<dyn Disk>,
}
