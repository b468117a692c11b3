//! Entity Routes
//!
//! Editor endpoints: create, edit, and move governed entities through the
//! approval workflow.

use crate::audit::{AuditAction, AuditEntry};
use crate::entities::{EntityContent, EntityFilter, EntityKind, Governed, GovernedEntity};
use crate::error::{validation_error, ApiResult, AppError};
use crate::models::SuccessResponse;
use crate::state::SharedState;
use crate::workflow::{
    apply_transition, available_actions, can_activate, is_editable, Action, Actor, Approvable,
    ApprovalStatus, Capabilities, LifecycleStatus, WorkflowError,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityListQuery {
    pub kind: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntityRequest {
    pub expected_version: u64,
    #[serde(flatten)]
    pub content: EntityContent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub action: Action,
    #[serde(default)]
    pub expected_version: Option<u64>,
    /// Only meaningful with `finalApprove`
    #[serde(default)]
    pub activate: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleRequest {
    pub lifecycle_status: LifecycleStatus,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// An entity plus what the calling actor may do with it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView {
    #[serde(flatten)]
    pub entity: GovernedEntity,
    pub editable: bool,
    pub can_activate: bool,
    pub available_actions: Vec<Action>,
}

impl EntityView {
    pub fn new(entity: GovernedEntity, actor: &Actor) -> Self {
        let status = entity.approval_status();
        Self {
            editable: is_editable(status),
            can_activate: can_activate(status),
            available_actions: available_actions(status, &actor.capabilities),
            entity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResponse {
    pub entity: EntityView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityListResponse {
    pub entities: Vec<EntityView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrailResponse {
    pub entries: Vec<AuditEntry>,
}

/// Reject a write made against an outdated copy
fn check_version(entity: &GovernedEntity, expected: Option<u64>) -> Result<u64, AppError> {
    match expected {
        Some(v) if v != entity.version => Err(AppError::Conflict(format!(
            "Entity {} was modified (expected version {}, found {})",
            entity.id, v, entity.version
        ))),
        _ => Ok(entity.version),
    }
}

fn status_str(status: Option<ApprovalStatus>) -> Option<&'static str> {
    status.map(|s| s.as_str())
}

// =============================================================================
// ROUTES
// =============================================================================

/// List entities
pub async fn list_entities(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<EntityListQuery>,
) -> ApiResult<Json<SuccessResponse<EntityListResponse>>> {
    let kind = query
        .kind
        .as_deref()
        .map(str::parse::<EntityKind>)
        .transpose()
        .map_err(AppError::BadRequest)?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ApprovalStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let entities: Vec<EntityView> = state
        .entities
        .list(EntityFilter {
            kind,
            status,
            ..Default::default()
        })
        .await
        .into_iter()
        .map(|e| EntityView::new(e, &actor))
        .collect();

    Ok(Json(SuccessResponse::with_data(
        format!("Found {} entities", entities.len()),
        EntityListResponse { entities },
    )))
}

/// Get an entity by ID
pub async fn get_entity(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<EntityResponse>>> {
    let entity = state.entities.get(id).await?;

    Ok(Json(SuccessResponse::with_data(
        "Entity retrieved",
        EntityResponse {
            entity: EntityView::new(entity, &actor),
        },
    )))
}

/// Create and save a new entity as a draft
pub async fn create_entity(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
    Json(content): Json<EntityContent>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<EntityResponse>>)> {
    content
        .validate_content()
        .map_err(|e| validation_error(e.to_string()))?;

    let saved = apply_transition(&Governed::new(content), Action::Save, &actor, Utc::now())?;
    let entity = state.entities.insert(saved).await?;

    state
        .audit
        .record(AuditEntry::new(
            &actor.name,
            AuditAction::EntityCreated,
            entity.kind(),
            entity.id,
            Some(serde_json::json!({ "name": entity.name() })),
        ))
        .await;

    info!("{} created {} {}", actor.name, entity.kind(), entity.id);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Entity saved as draft",
            EntityResponse {
                entity: EntityView::new(entity, &actor),
            },
        )),
    ))
}

/// Edit the content of a draft or rejected entity
///
/// Editing a rejected entity re-saves it as a draft.
pub async fn update_entity(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEntityRequest>,
) -> ApiResult<Json<SuccessResponse<EntityResponse>>> {
    req.content
        .validate_content()
        .map_err(|e| validation_error(e.to_string()))?;

    let current = state.entities.get(id).await?;
    let expected = check_version(&current, Some(req.expected_version))?;
    let status = current.approval_status();

    if !is_editable(status) {
        return Err(WorkflowError::NotEditable { status }.into());
    }
    if req.content.kind() != current.kind() {
        return Err(AppError::BadRequest(format!(
            "Entity {} is a {}, not a {}",
            id,
            current.kind(),
            req.content.kind()
        )));
    }
    if !actor.capabilities.can_author() {
        return Err(WorkflowError::Unauthorized {
            actor: actor.name.clone(),
            action: Action::Save,
        }
        .into());
    }

    let mut edited = current.clone();
    edited.content = req.content;

    let resubmitted = status == Some(ApprovalStatus::Rejected);
    if resubmitted {
        edited = apply_transition(&edited, Action::Resubmit, &actor, Utc::now())?;
    }

    let entity = state.entities.replace(edited, expected).await?;

    state
        .audit
        .record(AuditEntry::new(
            &actor.name,
            AuditAction::EntityUpdated,
            entity.kind(),
            entity.id,
            Some(serde_json::json!({
                "version": entity.version,
                "resubmitted": resubmitted
            })),
        ))
        .await;

    Ok(Json(SuccessResponse::with_data(
        if resubmitted { "Entity re-saved as draft" } else { "Entity updated" },
        EntityResponse {
            entity: EntityView::new(entity, &actor),
        },
    )))
}

/// Apply a workflow action to an entity
pub async fn transition_entity(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Json<SuccessResponse<EntityResponse>>> {
    if req.activate && req.action != Action::FinalApprove {
        return Err(AppError::BadRequest(
            "activate is only allowed together with finalApprove".to_string(),
        ));
    }

    let current = state.entities.get(id).await?;
    let expected = check_version(&current, req.expected_version)?;
    let from = current.approval_status();

    let mut updated = apply_transition(&current, req.action, &actor, Utc::now())?;
    if req.activate {
        updated.approval.set_lifecycle(LifecycleStatus::Active)?;
    }

    let entity = state.entities.replace(updated, expected).await?;
    let to = entity.approval_status();

    state
        .audit
        .record(AuditEntry::new(
            &actor.name,
            AuditAction::Transitioned,
            entity.kind(),
            entity.id,
            Some(serde_json::json!({
                "action": req.action,
                "from": status_str(from),
                "to": status_str(to),
                "activated": req.activate
            })),
        ))
        .await;

    info!(
        "{} applied {} to {} {} ({} -> {})",
        actor.name,
        req.action,
        entity.kind(),
        entity.id,
        status_str(from).unwrap_or("(unsaved)"),
        status_str(to).unwrap_or("(unsaved)")
    );

    Ok(Json(SuccessResponse::with_data(
        format!("Entity is now {}", status_str(to).unwrap_or("(unsaved)")),
        EntityResponse {
            entity: EntityView::new(entity, &actor),
        },
    )))
}

/// Activate or deactivate an entity
pub async fn set_lifecycle(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<LifecycleRequest>,
) -> ApiResult<Json<SuccessResponse<EntityResponse>>> {
    if !actor.capabilities.can_final_approve() {
        return Err(AppError::Workflow(WorkflowError::Unauthorized {
            actor: actor.name.clone(),
            action: Action::FinalApprove,
        }));
    }

    let current = state.entities.get(id).await?;
    let expected = check_version(&current, req.expected_version)?;

    let mut updated = current.clone();
    updated.approval.set_lifecycle(req.lifecycle_status)?;

    let entity = state.entities.replace(updated, expected).await?;

    state
        .audit
        .record(AuditEntry::new(
            &actor.name,
            AuditAction::LifecycleChanged,
            entity.kind(),
            entity.id,
            Some(serde_json::json!({
                "from": current.approval.lifecycle_status,
                "to": entity.approval.lifecycle_status
            })),
        ))
        .await;

    Ok(Json(SuccessResponse::with_data(
        format!("Entity is now {}", entity.approval.lifecycle_status),
        EntityResponse {
            entity: EntityView::new(entity, &actor),
        },
    )))
}

/// Workflow history of one entity
pub async fn entity_audit(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<AuditTrailResponse>>> {
    // 404 for unknown ids rather than an empty trail
    state.entities.get(id).await?;
    let entries = state.audit.for_entity(id).await;

    Ok(Json(SuccessResponse::with_data(
        format!("Found {} audit entries", entries.len()),
        AuditTrailResponse { entries },
    )))
}

/// Full audit log
pub async fn list_audit(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<AuditTrailResponse>>> {
    let entries = state.audit.all().await;

    Ok(Json(SuccessResponse::with_data(
        format!("Found {} audit entries", entries.len()),
        AuditTrailResponse { entries },
    )))
}
