use std::sync::Arc;
use std::time::Duration;

use common::{DocumentRenderer, Mailer, QrEncoder};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::services::StoreLimits;

/// Handles shared by every request. Built once by the process entry point.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub mailer: Arc<dyn Mailer>,
    pub qr: Arc<dyn QrEncoder>,
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl AppState {
    /// Timeout and retry bounds applied to engine operations.
    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            timeout: Duration::from_millis(self.config.database.operation_timeout_ms),
            retry: self.config.database.retry,
        }
    }
}
