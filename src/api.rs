//! HTTP API for the portfolio chat

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::config::ChatConfig;
use crate::runtime::{FlowCatalog, SessionManager};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager<Arc<dyn FlowCatalog>>>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn FlowCatalog>, config: &ChatConfig) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(
                catalog,
                config.delivery_delay,
                config.asset_root.clone(),
            )),
        }
    }
}
