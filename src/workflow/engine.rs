//! The approval state machine
//!
//! Pure functions over `ApprovalStatus`. Nothing here performs I/O or keeps
//! state; callers persist the returned values themselves.

use crate::workflow::approvable::Approvable;
use crate::workflow::error::WorkflowError;
use crate::workflow::status::{Action, ApprovalStatus, Stage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

// =============================================================================
// CAPABILITIES & ACTOR
// =============================================================================

/// Role predicate supplied by the caller's identity context
pub trait Capabilities {
    /// May save, submit and resubmit entities
    fn can_author(&self) -> bool;
    /// May approve or reject at the peer review gate
    fn can_peer_review(&self) -> bool;
    /// May approve or reject at the final approval gate
    fn can_final_approve(&self) -> bool;

    fn allows(&self, stage: Stage) -> bool {
        match stage {
            Stage::Authoring => self.can_author(),
            Stage::PeerReview => self.can_peer_review(),
            Stage::FinalApproval => self.can_final_approve(),
        }
    }
}

/// Plain capability flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitySet {
    pub author: bool,
    pub peer_review: bool,
    pub final_approval: bool,
}

impl CapabilitySet {
    pub fn all() -> Self {
        Self {
            author: true,
            peer_review: true,
            final_approval: true,
        }
    }
}

impl Capabilities for CapabilitySet {
    fn can_author(&self) -> bool {
        self.author
    }

    fn can_peer_review(&self) -> bool {
        self.peer_review
    }

    fn can_final_approve(&self) -> bool {
        self.final_approval
    }
}

/// The authenticated user performing an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    /// Recorded in stamps
    pub name: String,
    pub capabilities: CapabilitySet,
}

impl Actor {
    pub fn new(id: Uuid, name: impl Into<String>, capabilities: CapabilitySet) -> Self {
        Self {
            id,
            name: name.into(),
            capabilities,
        }
    }
}

// =============================================================================
// TRANSITION TABLE
// =============================================================================

/// Resulting status of `action` from `current`, `None` if the pair is illegal.
/// `current == None` is a new entity that has never been saved.
pub fn next_status(current: Option<ApprovalStatus>, action: Action) -> Option<ApprovalStatus> {
    use ApprovalStatus::*;

    match (current, action) {
        (None, Action::Save) => Some(Draft),
        (Some(Draft), Action::SubmitForPeerReview) => Some(PendingPeerReview),
        (Some(PendingPeerReview), Action::ApprovePeerReview) => Some(PendingFinalApproval),
        (Some(PendingPeerReview), Action::RejectPeerReview) => Some(Rejected),
        (Some(PendingFinalApproval), Action::FinalApprove) => Some(Approved),
        (Some(PendingFinalApproval), Action::FinalReject) => Some(Rejected),
        (Some(Rejected), Action::Resubmit) => Some(Draft),
        (None, _)
        | (Some(Draft), _)
        | (Some(PendingPeerReview), _)
        | (Some(PendingFinalApproval), _)
        | (Some(Approved), _)
        | (Some(Rejected), _) => None,
    }
}

#[allow(dead_code)]
pub fn can_transition(current: ApprovalStatus, action: Action) -> bool {
    next_status(Some(current), action).is_some()
}

pub fn can_transition_from(current: Option<ApprovalStatus>, action: Action) -> bool {
    next_status(current, action).is_some()
}

/// Core fields may change only while drafting, after a rejection, or before the first save
pub fn is_editable(status: Option<ApprovalStatus>) -> bool {
    matches!(
        status,
        None | Some(ApprovalStatus::Draft) | Some(ApprovalStatus::Rejected)
    )
}

pub fn can_activate(status: Option<ApprovalStatus>) -> bool {
    status == Some(ApprovalStatus::Approved)
}

/// Actions an editor should offer for `status` to a holder of `caps`
pub fn available_actions(status: Option<ApprovalStatus>, caps: &impl Capabilities) -> Vec<Action> {
    Action::ALL
        .into_iter()
        .filter(|action| can_transition_from(status, *action) && caps.allows(action.stage()))
        .collect()
}

// =============================================================================
// APPLYING TRANSITIONS
// =============================================================================

/// Validate `action` and return an updated copy of `entity`.
///
/// The input is left untouched so callers can discard the result on cancel.
pub fn apply_transition<E>(
    entity: &E,
    action: Action,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<E, WorkflowError>
where
    E: Approvable + Clone,
{
    let current = entity.approval_status();
    let next = next_status(current, action)
        .ok_or(WorkflowError::InvalidTransition { from: current, action })?;

    if !actor.capabilities.allows(action.stage()) {
        return Err(WorkflowError::Unauthorized {
            actor: actor.name.clone(),
            action,
        });
    }

    let mut updated = entity.clone();
    let record = updated.approval_mut();
    record.approval_status = Some(next);

    match action {
        Action::Save => {
            if record.created_by.is_none() {
                record.created_by = Some(actor.name.clone());
                record.created_date = Some(now);
            }
        }
        Action::ApprovePeerReview | Action::RejectPeerReview => {
            record.peer_reviewed_by = Some(actor.name.clone());
            record.peer_reviewed_date = Some(now);
        }
        Action::FinalApprove | Action::FinalReject => {
            record.approved_by = Some(actor.name.clone());
            record.approved_date = Some(now);
        }
        Action::SubmitForPeerReview | Action::Resubmit => {}
    }

    Ok(updated)
}

// =============================================================================
// BULK
// =============================================================================

/// An entity a bulk action left untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure<K> {
    pub key: K,
    pub error: WorkflowError,
}

/// Result of applying one action across many entities
#[derive(Debug, Clone)]
pub struct BulkOutcome<E, K> {
    pub updated: Vec<E>,
    pub skipped: Vec<BulkFailure<K>>,
}

impl<E, K> BulkOutcome<E, K> {
    #[allow(dead_code)]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Apply `action` to each entity independently.
///
/// `key` identifies skipped entities in the outcome; a failure on one entity
/// never affects the others.
pub fn apply_bulk<'a, E, K, F>(
    entities: impl IntoIterator<Item = &'a E>,
    action: Action,
    actor: &Actor,
    now: DateTime<Utc>,
    key: F,
) -> BulkOutcome<E, K>
where
    E: Approvable + Clone + 'a,
    F: Fn(&E) -> K,
{
    let mut outcome = BulkOutcome {
        updated: Vec::new(),
        skipped: Vec::new(),
    };

    for entity in entities {
        match apply_transition(entity, action, actor, now) {
            Ok(updated) => outcome.updated.push(updated),
            Err(error) => outcome.skipped.push(BulkFailure {
                key: key(entity),
                error,
            }),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::approvable::ApprovalRecord;
    use crate::workflow::status::LifecycleStatus;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const TABLE: [(Option<ApprovalStatus>, Action, ApprovalStatus); 7] = [
        (None, Action::Save, ApprovalStatus::Draft),
        (Some(ApprovalStatus::Draft), Action::SubmitForPeerReview, ApprovalStatus::PendingPeerReview),
        (Some(ApprovalStatus::PendingPeerReview), Action::ApprovePeerReview, ApprovalStatus::PendingFinalApproval),
        (Some(ApprovalStatus::PendingPeerReview), Action::RejectPeerReview, ApprovalStatus::Rejected),
        (Some(ApprovalStatus::PendingFinalApproval), Action::FinalApprove, ApprovalStatus::Approved),
        (Some(ApprovalStatus::PendingFinalApproval), Action::FinalReject, ApprovalStatus::Rejected),
        (Some(ApprovalStatus::Rejected), Action::Resubmit, ApprovalStatus::Draft),
    ];

    fn all_states() -> Vec<Option<ApprovalStatus>> {
        std::iter::once(None)
            .chain(ApprovalStatus::ALL.into_iter().map(Some))
            .collect()
    }

    fn in_table(status: Option<ApprovalStatus>, action: Action) -> Option<ApprovalStatus> {
        TABLE
            .iter()
            .find(|(s, a, _)| *s == status && *a == action)
            .map(|(_, _, next)| *next)
    }

    fn admin() -> Actor {
        Actor::new(Uuid::new_v4(), "Ada Admin", CapabilitySet::all())
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0).unwrap()
    }

    fn record(status: Option<ApprovalStatus>) -> ApprovalRecord {
        ApprovalRecord {
            approval_status: status,
            ..Default::default()
        }
    }

    #[test]
    fn test_unlisted_pairs_are_rejected() {
        for status in all_states() {
            for action in Action::ALL {
                if in_table(status, action).is_some() {
                    continue;
                }
                assert!(!can_transition_from(status, action), "{:?} {:?}", status, action);
                if let Some(s) = status {
                    assert!(!can_transition(s, action));
                }
                let err = apply_transition(&record(status), action, &admin(), at(0)).unwrap_err();
                assert_eq!(err, WorkflowError::InvalidTransition { from: status, action });
            }
        }
    }

    #[test]
    fn test_listed_pairs_set_exact_stamps() {
        let actor = admin();
        let now = at(30);

        for (status, action, next) in TABLE {
            let before = record(status);
            let after = apply_transition(&before, action, &actor, now).unwrap();

            let mut expected = before.clone();
            expected.approval_status = Some(next);
            match action {
                Action::Save => {
                    expected.created_by = Some(actor.name.clone());
                    expected.created_date = Some(now);
                }
                Action::ApprovePeerReview | Action::RejectPeerReview => {
                    expected.peer_reviewed_by = Some(actor.name.clone());
                    expected.peer_reviewed_date = Some(now);
                }
                Action::FinalApprove | Action::FinalReject => {
                    expected.approved_by = Some(actor.name.clone());
                    expected.approved_date = Some(now);
                }
                _ => {}
            }
            assert_eq!(after, expected);
            // input untouched
            assert_eq!(before, record(status));
        }
    }

    #[test]
    fn test_can_transition_is_stable() {
        for status in ApprovalStatus::ALL {
            for action in Action::ALL {
                assert_eq!(can_transition(status, action), can_transition(status, action));
            }
        }
    }

    #[test]
    fn test_is_editable_exhaustive() {
        assert!(is_editable(None));
        assert!(is_editable(Some(ApprovalStatus::Draft)));
        assert!(is_editable(Some(ApprovalStatus::Rejected)));
        assert!(!is_editable(Some(ApprovalStatus::PendingPeerReview)));
        assert!(!is_editable(Some(ApprovalStatus::PendingFinalApproval)));
        assert!(!is_editable(Some(ApprovalStatus::Approved)));
    }

    #[test]
    fn test_can_activate_only_when_approved() {
        for status in all_states() {
            assert_eq!(can_activate(status), status == Some(ApprovalStatus::Approved));
        }
    }

    #[test]
    fn test_full_approval_round_trip() {
        let author = Actor::new(
            Uuid::new_v4(),
            "Eve Editor",
            CapabilitySet { author: true, ..Default::default() },
        );
        let reviewer = Actor::new(
            Uuid::new_v4(),
            "Pat Peer",
            CapabilitySet { peer_review: true, ..Default::default() },
        );
        let approver = Actor::new(
            Uuid::new_v4(),
            "Alex Approver",
            CapabilitySet { final_approval: true, ..Default::default() },
        );

        let saved = apply_transition(&ApprovalRecord::unsaved(), Action::Save, &author, at(1)).unwrap();
        let submitted = apply_transition(&saved, Action::SubmitForPeerReview, &author, at(2)).unwrap();
        let reviewed = apply_transition(&submitted, Action::ApprovePeerReview, &reviewer, at(3)).unwrap();
        let approved = apply_transition(&reviewed, Action::FinalApprove, &approver, at(4)).unwrap();

        assert_eq!(approved.approval_status, Some(ApprovalStatus::Approved));
        assert_eq!(approved.created_by.as_deref(), Some("Eve Editor"));
        assert_eq!(approved.peer_reviewed_by.as_deref(), Some("Pat Peer"));
        assert_eq!(approved.peer_reviewed_date, Some(at(3)));
        assert_eq!(approved.approved_by.as_deref(), Some("Alex Approver"));
        assert_eq!(approved.approved_date, Some(at(4)));
        assert!(!is_editable(approved.approval_status));
        assert!(can_activate(approved.approval_status));
        assert_eq!(approved.lifecycle_status, LifecycleStatus::Inactive);
    }

    #[test]
    fn test_reject_and_resubmit_keeps_last_review() {
        let actor = admin();
        let draft = record(Some(ApprovalStatus::Draft));

        let submitted = apply_transition(&draft, Action::SubmitForPeerReview, &actor, at(1)).unwrap();
        let rejected = apply_transition(&submitted, Action::RejectPeerReview, &actor, at(2)).unwrap();
        assert_eq!(rejected.approval_status, Some(ApprovalStatus::Rejected));
        assert!(is_editable(rejected.approval_status));

        let redrafted = apply_transition(&rejected, Action::Resubmit, &actor, at(3)).unwrap();
        assert_eq!(redrafted.approval_status, Some(ApprovalStatus::Draft));
        assert_eq!(redrafted.peer_reviewed_date, Some(at(2)));
        assert!(can_transition(ApprovalStatus::Draft, Action::SubmitForPeerReview));

        // second pass overwrites the stamp
        let resubmitted = apply_transition(&redrafted, Action::SubmitForPeerReview, &actor, at(4)).unwrap();
        let reviewed = apply_transition(&resubmitted, Action::ApprovePeerReview, &actor, at(5)).unwrap();
        assert_eq!(reviewed.peer_reviewed_date, Some(at(5)));
    }

    #[test]
    fn test_final_reject_records_rejecting_actor() {
        let approver = Actor::new(
            Uuid::new_v4(),
            "Rita Rejecter",
            CapabilitySet { final_approval: true, ..Default::default() },
        );
        let pending = record(Some(ApprovalStatus::PendingFinalApproval));
        let rejected = apply_transition(&pending, Action::FinalReject, &approver, at(9)).unwrap();

        assert_eq!(rejected.approval_status, Some(ApprovalStatus::Rejected));
        assert_eq!(rejected.approved_by.as_deref(), Some("Rita Rejecter"));
        assert_eq!(rejected.approved_date, Some(at(9)));
    }

    #[test]
    fn test_save_does_not_restamp_creation() {
        let original = ApprovalRecord {
            created_by: Some("First Author".to_string()),
            created_date: Some(at(0)),
            ..Default::default()
        };
        let saved = apply_transition(&original, Action::Save, &admin(), at(10)).unwrap();
        assert_eq!(saved.created_by.as_deref(), Some("First Author"));
        assert_eq!(saved.created_date, Some(at(0)));
    }

    #[test]
    fn test_unauthorized_leaves_status() {
        let editor = Actor::new(
            Uuid::new_v4(),
            "Eve Editor",
            CapabilitySet { author: true, ..Default::default() },
        );
        let pending = record(Some(ApprovalStatus::PendingPeerReview));

        let err = apply_transition(&pending, Action::ApprovePeerReview, &editor, at(0)).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Unauthorized {
                actor: "Eve Editor".to_string(),
                action: Action::ApprovePeerReview
            }
        );
        assert_eq!(pending.approval_status, Some(ApprovalStatus::PendingPeerReview));
    }

    #[test]
    fn test_invalid_transition_checked_before_role() {
        let nobody = Actor::new(Uuid::new_v4(), "Vic Viewer", CapabilitySet::default());
        let err = apply_transition(&record(Some(ApprovalStatus::Draft)), Action::FinalApprove, &nobody, at(0))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }

    #[test]
    fn test_available_actions_by_role() {
        let reviewer = CapabilitySet { peer_review: true, ..Default::default() };
        let approver = CapabilitySet { final_approval: true, ..Default::default() };

        assert_eq!(
            available_actions(Some(ApprovalStatus::PendingPeerReview), &reviewer),
            vec![Action::ApprovePeerReview, Action::RejectPeerReview]
        );
        assert!(available_actions(Some(ApprovalStatus::PendingPeerReview), &approver).is_empty());
        assert_eq!(
            available_actions(Some(ApprovalStatus::PendingFinalApproval), &approver),
            vec![Action::FinalApprove, Action::FinalReject]
        );
        assert_eq!(available_actions(None, &CapabilitySet::all()), vec![Action::Save]);
        assert!(available_actions(Some(ApprovalStatus::Approved), &CapabilitySet::all()).is_empty());
        assert!(available_actions(Some(ApprovalStatus::Draft), &CapabilitySet::default()).is_empty());
    }

    #[test]
    fn test_bulk_only_touches_eligible() {
        let mut entities: Vec<(usize, ApprovalRecord)> = (0..5)
            .map(|i| (i, record(Some(ApprovalStatus::PendingPeerReview))))
            .collect();
        entities.extend((5..7).map(|i| (i, record(Some(ApprovalStatus::PendingFinalApproval)))));

        #[derive(Clone)]
        struct Keyed(usize, ApprovalRecord);
        impl Approvable for Keyed {
            fn approval(&self) -> &ApprovalRecord {
                &self.1
            }
            fn approval_mut(&mut self) -> &mut ApprovalRecord {
                &mut self.1
            }
        }

        let keyed: Vec<Keyed> = entities.into_iter().map(|(i, r)| Keyed(i, r)).collect();
        let outcome = apply_bulk(&keyed, Action::ApprovePeerReview, &admin(), at(0), |e| e.0);

        assert_eq!(outcome.updated.len(), 5);
        assert!(outcome
            .updated
            .iter()
            .all(|e| e.1.approval_status == Some(ApprovalStatus::PendingFinalApproval)));
        assert_eq!(outcome.skipped.iter().map(|f| f.key).collect::<Vec<_>>(), vec![5, 6]);
        assert!(outcome
            .skipped
            .iter()
            .all(|f| f.error.code() == "INVALID_TRANSITION"));
        assert!(!outcome.is_complete());
        // originals unchanged
        assert!(keyed[5..]
            .iter()
            .all(|e| e.1.approval_status == Some(ApprovalStatus::PendingFinalApproval)));
    }
}
