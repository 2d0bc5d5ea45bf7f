// Application state module
// Shared per-process state handed to every connection

use std::sync::atomic::AtomicBool;

use super::types::Config;

/// Application state shared across connections
pub struct AppState {
    pub config: Config,

    // Cached so the hot path can check it without touching the config tree
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            cached_access_log: AtomicBool::new(config.logging.access_log),
        }
    }
}
