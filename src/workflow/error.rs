//! Workflow errors

use crate::workflow::status::{Action, ApprovalStatus};
use thiserror::Error;

/// Why a workflow operation was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Cannot {action} an entity in status {}", display_status(.from))]
    InvalidTransition {
        from: Option<ApprovalStatus>,
        action: Action,
    },

    #[error("{actor} is not allowed to {action}")]
    Unauthorized { actor: String, action: Action },

    #[error("Entity in status {} cannot be edited", display_status(.status))]
    NotEditable { status: Option<ApprovalStatus> },

    #[error("Entity in status {} cannot be activated", display_status(.status))]
    NotActivatable { status: Option<ApprovalStatus> },
}

impl WorkflowError {
    /// Machine-readable code surfaced to callers
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::InvalidTransition { .. } => "INVALID_TRANSITION",
            WorkflowError::Unauthorized { .. } => "FORBIDDEN",
            WorkflowError::NotEditable { .. } => "NOT_EDITABLE",
            WorkflowError::NotActivatable { .. } => "NOT_ACTIVATABLE",
        }
    }
}

fn display_status(status: &Option<ApprovalStatus>) -> &'static str {
    status.map(|s| s.as_str()).unwrap_or("(unsaved)")
}
