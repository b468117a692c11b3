//! Governed entities
//!
//! Rules, rule sets, scaffolds, run controls, UI metadata and dynamic data
//! records all share one approval record through `Governed<C>`.

mod content;
mod store;

pub use content::*;
pub use store::{EntityFilter, EntityStore};

use crate::workflow::{Approvable, ApprovalRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An entity payload plus its approval state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Governed<C> {
    /// Assigned at creation, never changes
    pub id: Uuid,
    /// Bumped on every stored write
    pub version: u64,
    #[serde(flatten)]
    pub content: C,
    #[serde(flatten)]
    pub approval: ApprovalRecord,
    pub updated_at: DateTime<Utc>,
}

impl<C> Governed<C> {
    /// A new, unsaved entity
    pub fn new(content: C) -> Self {
        Self {
            id: Uuid::new_v4(),
            version: 0,
            content,
            approval: ApprovalRecord::unsaved(),
            updated_at: Utc::now(),
        }
    }
}

impl<C> Approvable for Governed<C> {
    fn approval(&self) -> &ApprovalRecord {
        &self.approval
    }

    fn approval_mut(&mut self) -> &mut ApprovalRecord {
        &mut self.approval
    }
}

// Typed views for callers that work with a single kind
#[allow(dead_code)]
pub type Rule = Governed<RuleDefinition>;
#[allow(dead_code)]
pub type RuleSet = Governed<RuleSetDefinition>;
#[allow(dead_code)]
pub type Scaffold = Governed<ScaffoldDefinition>;
#[allow(dead_code)]
pub type RunControl = Governed<RunControlDefinition>;
#[allow(dead_code)]
pub type UiMetadata = Governed<UiMetadataDefinition>;
#[allow(dead_code)]
pub type DynamicDataRecord = Governed<DynamicDataRecordContent>;

/// Any governed entity, as stored
pub type GovernedEntity = Governed<EntityContent>;

impl GovernedEntity {
    pub fn kind(&self) -> EntityKind {
        self.content.kind()
    }

    pub fn name(&self) -> &str {
        self.content.name()
    }
}
