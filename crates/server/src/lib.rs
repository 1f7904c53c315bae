use std::sync::Arc;

use db::LogStore;

pub mod config;
pub mod error;
pub mod file_logging;
pub mod middleware;
pub mod render;
pub mod routes;

pub use routes::router;

use crate::config::ServerConfig;

/// Shared by every handler. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub store: LogStore,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: LogStore, config: ServerConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}
