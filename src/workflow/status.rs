//! Workflow vocabulary
//!
//! Status and action identifiers are part of the wire contract with the
//! backend and must keep their exact string values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Approval stage of a governed entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalStatus {
    /// Being edited by its author
    #[serde(rename = "Draft")]
    Draft,
    /// Waiting on the first review gate
    #[serde(rename = "Pending Peer Review")]
    PendingPeerReview,
    /// Peer review passed, waiting on the approver
    #[serde(rename = "Pending Final Approval")]
    PendingFinalApproval,
    /// Fully approved, eligible for activation
    #[serde(rename = "Approved")]
    Approved,
    /// Sent back by either review gate
    #[serde(rename = "Rejected")]
    Rejected,
}

impl ApprovalStatus {
    pub const ALL: [ApprovalStatus; 5] = [
        ApprovalStatus::Draft,
        ApprovalStatus::PendingPeerReview,
        ApprovalStatus::PendingFinalApproval,
        ApprovalStatus::Approved,
        ApprovalStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Draft => "Draft",
            ApprovalStatus::PendingPeerReview => "Pending Peer Review",
            ApprovalStatus::PendingFinalApproval => "Pending Final Approval",
            ApprovalStatus::Approved => "Approved",
            ApprovalStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    /// Accepts the wire strings as well as the snake_case spelling used in query strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Draft" | "draft" => Ok(ApprovalStatus::Draft),
            "Pending Peer Review" | "pending_peer_review" => Ok(ApprovalStatus::PendingPeerReview),
            "Pending Final Approval" | "pending_final_approval" => {
                Ok(ApprovalStatus::PendingFinalApproval)
            }
            "Approved" | "approved" => Ok(ApprovalStatus::Approved),
            "Rejected" | "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(format!("Unknown approval status '{}'", other)),
        }
    }
}

/// Operational flag, independent of approval stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LifecycleStatus {
    Active,
    #[default]
    Inactive,
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleStatus::Active => write!(f, "Active"),
            LifecycleStatus::Inactive => write!(f, "Inactive"),
        }
    }
}

/// Review gate an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Authoring,
    PeerReview,
    FinalApproval,
}

/// A requested workflow action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// First save of a new entity
    Save,
    SubmitForPeerReview,
    ApprovePeerReview,
    RejectPeerReview,
    FinalApprove,
    FinalReject,
    /// Re-save a rejected entity as a draft
    Resubmit,
}

impl Action {
    /// Every action in transition-table order
    pub const ALL: [Action; 7] = [
        Action::Save,
        Action::SubmitForPeerReview,
        Action::ApprovePeerReview,
        Action::RejectPeerReview,
        Action::FinalApprove,
        Action::FinalReject,
        Action::Resubmit,
    ];

    pub fn stage(&self) -> Stage {
        match self {
            Action::Save | Action::SubmitForPeerReview | Action::Resubmit => Stage::Authoring,
            Action::ApprovePeerReview | Action::RejectPeerReview => Stage::PeerReview,
            Action::FinalApprove | Action::FinalReject => Stage::FinalApproval,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Save => "save",
            Action::SubmitForPeerReview => "submitForPeerReview",
            Action::ApprovePeerReview => "approvePeerReview",
            Action::RejectPeerReview => "rejectPeerReview",
            Action::FinalApprove => "finalApprove",
            Action::FinalReject => "finalReject",
            Action::Resubmit => "resubmit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
