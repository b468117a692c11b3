//! Entity storage
//!
//! In-memory store with version-checked writes.

use crate::entities::{EntityFamily, EntityKind, GovernedEntity};
use crate::error::AppError;
use crate::workflow::ApprovalStatus;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Optional list filters
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityFilter {
    pub kind: Option<EntityKind>,
    pub family: Option<EntityFamily>,
    pub status: Option<ApprovalStatus>,
}

impl EntityFilter {
    fn matches(&self, entity: &GovernedEntity) -> bool {
        self.kind.map_or(true, |k| entity.kind() == k)
            && self.family.map_or(true, |f| entity.kind().family() == f)
            && self.status.map_or(true, |s| entity.approval.approval_status == Some(s))
    }
}

/// Thread-safe entity store
pub struct EntityStore {
    entities: Arc<RwLock<HashMap<Uuid, GovernedEntity>>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            entities: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a newly saved entity at version 1
    pub async fn insert(&self, mut entity: GovernedEntity) -> Result<GovernedEntity, AppError> {
        let mut entities = self.entities.write().await;
        if entities.contains_key(&entity.id) {
            return Err(AppError::Conflict(format!("Entity {} already exists", entity.id)));
        }
        entity.version = 1;
        entities.insert(entity.id, entity.clone());
        debug!("Inserted {} {}", entity.kind(), entity.id);
        Ok(entity)
    }

    /// Get an entity by ID
    pub async fn get(&self, id: Uuid) -> Result<GovernedEntity, AppError> {
        let entities = self.entities.read().await;
        entities
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Entity {} not found", id)))
    }

    /// Fetch several entities, keeping request order; missing ids are reported separately
    pub async fn get_many(&self, ids: &[Uuid]) -> (Vec<GovernedEntity>, Vec<Uuid>) {
        let entities = self.entities.read().await;
        let mut found = Vec::new();
        let mut missing = Vec::new();
        for id in ids {
            match entities.get(id) {
                Some(entity) => found.push(entity.clone()),
                None => missing.push(*id),
            }
        }
        (found, missing)
    }

    /// List entities, oldest first
    pub async fn list(&self, filter: EntityFilter) -> Vec<GovernedEntity> {
        let entities = self.entities.read().await;
        let mut list: Vec<GovernedEntity> = entities
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            a.approval
                .created_date
                .cmp(&b.approval.created_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        list
    }

    /// Overwrite an entity if nobody else wrote it since `expected_version`
    pub async fn replace(
        &self,
        mut entity: GovernedEntity,
        expected_version: u64,
    ) -> Result<GovernedEntity, AppError> {
        let mut entities = self.entities.write().await;
        let current = entities
            .get(&entity.id)
            .ok_or_else(|| AppError::NotFound(format!("Entity {} not found", entity.id)))?;

        if current.version != expected_version {
            return Err(AppError::Conflict(format!(
                "Entity {} was modified (expected version {}, found {})",
                entity.id, expected_version, current.version
            )));
        }

        entity.version = expected_version + 1;
        entity.updated_at = chrono::Utc::now();
        entities.insert(entity.id, entity.clone());
        debug!("Stored {} {} at version {}", entity.kind(), entity.id, entity.version);
        Ok(entity)
    }

    /// Get entity count
    pub async fn count(&self) -> usize {
        let entities = self.entities.read().await;
        entities.len()
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DynamicDataRecordContent, EntityContent, Governed, ScaffoldDefinition};

    fn scaffold(name: &str) -> GovernedEntity {
        let mut entity = Governed::new(EntityContent::Scaffold(ScaffoldDefinition {
            name: name.to_string(),
            description: None,
            integration_object: None,
            template: "{{ source.id }}".to_string(),
        }));
        entity.approval.approval_status = Some(ApprovalStatus::Draft);
        entity
    }

    #[tokio::test]
    async fn test_insert_starts_at_version_one() {
        let store = EntityStore::new();
        let stored = store.insert(scaffold("a")).await.unwrap();

        assert_eq!(stored.version, 1);
        assert_eq!(store.count().await, 1);
        assert!(store.insert(stored).await.is_err());
    }

    #[tokio::test]
    async fn test_stale_replace_conflicts() {
        let store = EntityStore::new();
        let stored = store.insert(scaffold("a")).await.unwrap();

        let mut first = stored.clone();
        first.approval.approval_status = Some(ApprovalStatus::PendingPeerReview);
        let first = store.replace(first, stored.version).await.unwrap();
        assert_eq!(first.version, 2);

        let mut second = stored.clone();
        second.approval.approval_status = Some(ApprovalStatus::Rejected);
        let err = store.replace(second, stored.version).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let current = store.get(stored.id).await.unwrap();
        assert_eq!(current.approval.approval_status, Some(ApprovalStatus::PendingPeerReview));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let store = EntityStore::new();
        store.insert(scaffold("a")).await.unwrap();
        let mut record = Governed::new(EntityContent::DynamicDataRecord(DynamicDataRecordContent {
            name: "row-1".to_string(),
            dataset: "pricing".to_string(),
            values: serde_json::json!({ "sku": "A1" }),
        }));
        record.approval.approval_status = Some(ApprovalStatus::PendingPeerReview);
        store.insert(record).await.unwrap();

        let data = store
            .list(EntityFilter { family: Some(EntityFamily::Data), ..Default::default() })
            .await;
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].kind(), EntityKind::DynamicDataRecord);

        let drafts = store
            .list(EntityFilter { status: Some(ApprovalStatus::Draft), ..Default::default() })
            .await;
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].name(), "a");
    }

    #[tokio::test]
    async fn test_get_many_reports_missing() {
        let store = EntityStore::new();
        let stored = store.insert(scaffold("a")).await.unwrap();
        let ghost = Uuid::new_v4();

        let (found, missing) = store.get_many(&[stored.id, ghost]).await;
        assert_eq!(found.len(), 1);
        assert_eq!(missing, vec![ghost]);
    }
}
