//! Shared approval fields
//!
//! Every governed entity composes one `ApprovalRecord` instead of
//! redeclaring the status and stamp fields itself.

use crate::workflow::engine::can_activate;
use crate::workflow::error::WorkflowError;
use crate::workflow::status::{ApprovalStatus, LifecycleStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Approval state and reviewer stamps of one entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    /// Absent until the first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(default)]
    pub lifecycle_status: LifecycleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_reviewed_date: Option<DateTime<Utc>>,
    /// Final-stage actor, whether they approved or rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_date: Option<DateTime<Utc>>,
}

impl ApprovalRecord {
    /// Record for an entity that has never been saved
    pub fn unsaved() -> Self {
        Self::default()
    }

    /// Set the lifecycle flag; Active requires an approved entity
    pub fn set_lifecycle(&mut self, lifecycle: LifecycleStatus) -> Result<(), WorkflowError> {
        if lifecycle == LifecycleStatus::Active && !can_activate(self.approval_status) {
            return Err(WorkflowError::NotActivatable {
                status: self.approval_status,
            });
        }
        self.lifecycle_status = lifecycle;
        Ok(())
    }
}

/// Anything governed by the approval workflow
pub trait Approvable {
    fn approval(&self) -> &ApprovalRecord;
    fn approval_mut(&mut self) -> &mut ApprovalRecord;

    fn approval_status(&self) -> Option<ApprovalStatus> {
        self.approval().approval_status
    }
}

impl Approvable for ApprovalRecord {
    fn approval(&self) -> &ApprovalRecord {
        self
    }

    fn approval_mut(&mut self) -> &mut ApprovalRecord {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsaved_record_serializes_without_status() {
        let json = serde_json::to_value(ApprovalRecord::unsaved()).unwrap();
        assert_eq!(json, serde_json::json!({ "lifecycleStatus": "Inactive" }));
    }

    #[test]
    fn test_activation_requires_approval() {
        let mut record = ApprovalRecord {
            approval_status: Some(ApprovalStatus::PendingFinalApproval),
            ..Default::default()
        };
        let err = record.set_lifecycle(LifecycleStatus::Active).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::NotActivatable {
                status: Some(ApprovalStatus::PendingFinalApproval)
            }
        );
        assert_eq!(record.lifecycle_status, LifecycleStatus::Inactive);

        record.approval_status = Some(ApprovalStatus::Approved);
        record.set_lifecycle(LifecycleStatus::Active).unwrap();
        assert_eq!(record.lifecycle_status, LifecycleStatus::Active);
    }

    #[test]
    fn test_deactivation_always_allowed() {
        let mut record = ApprovalRecord {
            approval_status: Some(ApprovalStatus::Draft),
            lifecycle_status: LifecycleStatus::Active,
            ..Default::default()
        };
        record.set_lifecycle(LifecycleStatus::Inactive).unwrap();
        assert_eq!(record.lifecycle_status, LifecycleStatus::Inactive);
    }
}
