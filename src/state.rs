//! Shared application state.

use std::sync::Arc;

use crate::config::BridgeConfig;

/// State shared by all handlers. One per process; sessions themselves share
/// nothing with each other.
pub struct AppState {
    pub config: Arc<BridgeConfig>,
}

impl AppState {
    pub fn new(config: BridgeConfig) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
        })
    }
}
