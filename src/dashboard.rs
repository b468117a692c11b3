//! Approvals dashboard projection
//!
//! Buckets governed entities into review queues. Drafts are still with their
//! authors and are not queued.

use crate::entities::{EntityFamily, EntityKind, GovernedEntity};
use crate::workflow::{ApprovalStatus, LifecycleStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which entities a dashboard covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardScope {
    /// Approvals dashboard
    Definitions,
    /// Data-Workflow dashboard
    Data,
    #[default]
    All,
}

impl DashboardScope {
    pub fn family(&self) -> Option<EntityFamily> {
        match self {
            DashboardScope::Definitions => Some(EntityFamily::Definitions),
            DashboardScope::Data => Some(EntityFamily::Data),
            DashboardScope::All => None,
        }
    }
}

/// One row in a review queue
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: Uuid,
    pub kind: EntityKind,
    pub name: String,
    pub version: u64,
    pub approval_status: ApprovalStatus,
    pub lifecycle_status: LifecycleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCounts {
    pub pending_peer_review: usize,
    pub pending_final_approval: usize,
    pub approved: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalQueues {
    pub pending_peer_review: Vec<QueueItem>,
    pub pending_final_approval: Vec<QueueItem>,
    pub approved: Vec<QueueItem>,
    pub rejected: Vec<QueueItem>,
    pub counts: QueueCounts,
}

impl ApprovalQueues {
    pub fn from_entities<'a>(entities: impl IntoIterator<Item = &'a GovernedEntity>) -> Self {
        let mut queues = ApprovalQueues::default();

        for entity in entities {
            let Some(status) = entity.approval.approval_status else {
                continue;
            };
            let queue = match status {
                ApprovalStatus::PendingPeerReview => &mut queues.pending_peer_review,
                ApprovalStatus::PendingFinalApproval => &mut queues.pending_final_approval,
                ApprovalStatus::Approved => &mut queues.approved,
                ApprovalStatus::Rejected => &mut queues.rejected,
                ApprovalStatus::Draft => continue,
            };
            queue.push(QueueItem {
                id: entity.id,
                kind: entity.kind(),
                name: entity.name().to_string(),
                version: entity.version,
                approval_status: status,
                lifecycle_status: entity.approval.lifecycle_status,
                created_by: entity.approval.created_by.clone(),
                peer_reviewed_by: entity.approval.peer_reviewed_by.clone(),
                approved_by: entity.approval.approved_by.clone(),
            });
        }

        queues.counts = QueueCounts {
            pending_peer_review: queues.pending_peer_review.len(),
            pending_final_approval: queues.pending_final_approval.len(),
            approved: queues.approved.len(),
            rejected: queues.rejected.len(),
        };
        queues
    }
}
