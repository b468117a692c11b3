//! Approval Workflow
//!
//! The two-stage review state machine shared by every governed entity:
//!
//! `Draft → Pending Peer Review → Pending Final Approval → Approved`,
//! with `Rejected` reachable from either pending stage and looping back to
//! `Draft` on resubmission.

mod approvable;
mod engine;
mod error;
mod status;

pub use approvable::{Approvable, ApprovalRecord};
pub use engine::{
    apply_bulk, apply_transition, available_actions, can_activate, can_transition,
    can_transition_from, is_editable, next_status, Actor, BulkFailure, BulkOutcome,
    Capabilities, CapabilitySet,
};
pub use error::WorkflowError;
pub use status::{Action, ApprovalStatus, LifecycleStatus, Stage};
