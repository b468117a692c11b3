//! Audit log
//!
//! Stamps on an entity only keep the latest review of each stage. The audit
//! log keeps every workflow event so earlier review cycles stay visible.

use crate::entities::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: AuditAction,
    pub entity_kind: EntityKind,
    pub entity_id: Uuid,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    EntityCreated,
    EntityUpdated,
    Transitioned,
    LifecycleChanged,
    BulkTransition,
}

impl AuditEntry {
    pub fn new(
        actor: impl Into<String>,
        action: AuditAction,
        entity_kind: EntityKind,
        entity_id: Uuid,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor: actor.into(),
            action,
            entity_kind,
            entity_id,
            details,
        }
    }
}

/// Append-only in-memory audit log
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub async fn record(&self, entry: AuditEntry) {
        debug!(
            "Audit: {:?} on {} {} by {}",
            entry.action, entry.entity_kind, entry.entity_id, entry.actor
        );
        let mut entries = self.entries.write().await;
        entries.push(entry);
    }

    /// Entries for one entity, oldest first
    pub async fn for_entity(&self, entity_id: Uuid) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect()
    }

    pub async fn all(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
