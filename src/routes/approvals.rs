//! Approvals Dashboard Routes
//!
//! Cross-entity review queues and bulk approve/reject.

use crate::audit::{AuditAction, AuditEntry};
use crate::dashboard::{ApprovalQueues, DashboardScope};
use crate::entities::EntityFilter;
use crate::error::{validation_error, ApiResult, AppError};
use crate::models::SuccessResponse;
use crate::state::SharedState;
use crate::workflow::{apply_bulk, Action, Actor};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    #[serde(default)]
    pub scope: DashboardScope,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionRequest {
    #[validate(length(min = 1, max = 500, message = "Select between 1 and 500 entities"))]
    pub ids: Vec<Uuid>,
    pub action: Action,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEntity {
    pub id: Uuid,
    pub code: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionResponse {
    pub action: Action,
    pub updated: Vec<Uuid>,
    pub skipped: Vec<SkippedEntity>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuesResponse {
    pub queues: ApprovalQueues,
}

/// Review queues for the Approvals or Data-Workflow dashboard
pub async fn get_queues(
    State(state): State<SharedState>,
    Query(query): Query<QueueQuery>,
) -> ApiResult<Json<SuccessResponse<QueuesResponse>>> {
    let entities = state
        .entities
        .list(EntityFilter {
            family: query.scope.family(),
            ..Default::default()
        })
        .await;
    let queues = ApprovalQueues::from_entities(&entities);

    Ok(Json(SuccessResponse::with_data(
        format!(
            "{} awaiting peer review, {} awaiting final approval",
            queues.counts.pending_peer_review, queues.counts.pending_final_approval
        ),
        QueuesResponse { queues },
    )))
}

/// Apply one action to many entities
///
/// Ineligible entities are reported and left untouched; they never fail the
/// whole request.
pub async fn bulk_action(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<BulkActionRequest>,
) -> ApiResult<Json<SuccessResponse<BulkActionResponse>>> {
    req.validate().map_err(|e| validation_error(e.to_string()))?;

    let mut seen = HashSet::new();
    let ids: Vec<Uuid> = req.ids.iter().copied().filter(|id| seen.insert(*id)).collect();

    let (found, missing) = state.entities.get_many(&ids).await;
    let outcome = apply_bulk(&found, req.action, &actor, Utc::now(), |e| e.id);

    let mut skipped: Vec<SkippedEntity> = missing
        .into_iter()
        .map(|id| SkippedEntity {
            id,
            code: "NOT_FOUND".to_string(),
            reason: format!("Entity {} not found", id),
        })
        .collect();
    skipped.extend(outcome.skipped.into_iter().map(|f| SkippedEntity {
        id: f.key,
        code: f.error.code().to_string(),
        reason: f.error.to_string(),
    }));

    let mut updated = Vec::with_capacity(outcome.updated.len());
    for entity in outcome.updated {
        let (id, kind, expected) = (entity.id, entity.kind(), entity.version);
        let from = found
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.approval.approval_status);
        let to = entity.approval.approval_status;

        match state.entities.replace(entity, expected).await {
            Ok(_) => {
                state
                    .audit
                    .record(AuditEntry::new(
                        &actor.name,
                        AuditAction::BulkTransition,
                        kind,
                        id,
                        Some(serde_json::json!({
                            "action": req.action,
                            "from": from.map(|s| s.as_str()),
                            "to": to.map(|s| s.as_str())
                        })),
                    ))
                    .await;
                updated.push(id);
            }
            // Lost a race with another writer; report it like any other skip
            Err(e @ AppError::Conflict(_)) => skipped.push(SkippedEntity {
                id,
                code: "CONFLICT".to_string(),
                reason: e.to_string(),
            }),
            Err(e) => return Err(e),
        }
    }

    if !skipped.is_empty() {
        warn!(
            "Bulk {} by {} skipped {} of {} entities",
            req.action,
            actor.name,
            skipped.len(),
            ids.len()
        );
    }
    info!("Bulk {} by {} updated {} entities", req.action, actor.name, updated.len());

    Ok(Json(SuccessResponse::with_data(
        format!("Updated {} of {} entities", updated.len(), ids.len()),
        BulkActionResponse {
            action: req.action,
            updated,
            skipped,
        },
    )))
}
