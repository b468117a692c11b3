//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::audit::AuditLog;
use crate::config::Settings;
use crate::entities::EntityStore;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,

    /// Governed entities (has internal locking)
    pub entities: EntityStore,

    /// Workflow event history
    pub audit: AuditLog,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            entities: EntityStore::new(),
            audit: AuditLog::new(),
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
