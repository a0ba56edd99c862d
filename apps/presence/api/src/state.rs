//! Shared state handed to the HTTP handlers.

use database::mongodb::Database;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// Handle to the configured database, connected in the background at startup
    pub db: Arc<Database>,
}

impl AppState {
    /// Connects the database on its own task. A failure is logged, not retried.
    pub fn spawn_connect(&self) -> JoinHandle<()> {
        let db = self.db.clone();
        tokio::spawn(async move {
            match db.connect().await {
                Ok(()) => info!("database {} connected", db.name()),
                Err(e) => error!("database connection failed: {}", e),
            }
        })
    }
}
