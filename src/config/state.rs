// Application state module
// Bundles the loaded configuration with the book store handed to every handler

use super::types::Config;
use crate::store::BookStore;

/// Application state shared by all connections
pub struct AppState {
    pub config: Config,
    pub store: BookStore,
}

impl AppState {
    pub const fn new(config: Config, store: BookStore) -> Self {
        Self { config, store }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
