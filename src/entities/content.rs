//! Editable payloads of each governed entity kind
//!
//! Rule and scaffold expressions are carried as opaque strings; nothing in
//! this service interprets them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Which dashboard an entity kind is reviewed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityFamily {
    /// Definitional entities, reviewed on the Approvals dashboard
    Definitions,
    /// Data records, reviewed on the Data-Workflow dashboard
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Rule,
    RuleSet,
    Scaffold,
    RunControl,
    UiMetadata,
    DynamicDataRecord,
}

impl EntityKind {
    pub fn family(&self) -> EntityFamily {
        match self {
            EntityKind::DynamicDataRecord => EntityFamily::Data,
            EntityKind::Rule
            | EntityKind::RuleSet
            | EntityKind::Scaffold
            | EntityKind::RunControl
            | EntityKind::UiMetadata => EntityFamily::Definitions,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Rule => "rule",
            EntityKind::RuleSet => "ruleSet",
            EntityKind::Scaffold => "scaffold",
            EntityKind::RunControl => "runControl",
            EntityKind::UiMetadata => "uiMetadata",
            EntityKind::DynamicDataRecord => "dynamicDataRecord",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rule" => Ok(EntityKind::Rule),
            "ruleSet" => Ok(EntityKind::RuleSet),
            "scaffold" => Ok(EntityKind::Scaffold),
            "runControl" => Ok(EntityKind::RunControl),
            "uiMetadata" => Ok(EntityKind::UiMetadata),
            "dynamicDataRecord" => Ok(EntityKind::DynamicDataRecord),
            other => Err(format!("Unknown entity kind '{}'", other)),
        }
    }
}

// =============================================================================
// DEFINITIONS
// =============================================================================

/// A transformation or validation rule bound to an integration object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    #[validate(length(min = 1, max = 255, message = "Rule name must be between 1 and 255 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Connection the rule reads from
    #[serde(default)]
    pub connection: Option<String>,
    #[serde(default)]
    pub integration_object: Option<String>,
    /// Opaque rule expression
    #[validate(length(min = 1, message = "Rule expression is required"))]
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetDefinition {
    #[validate(length(min = 1, max = 255, message = "Rule set name must be between 1 and 255 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Rules in evaluation order
    #[serde(default)]
    pub rule_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScaffoldDefinition {
    #[validate(length(min = 1, max = 255, message = "Scaffold name must be between 1 and 255 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub integration_object: Option<String>,
    /// Opaque template expression
    #[serde(default)]
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RunControlDefinition {
    #[validate(length(min = 1, max = 255, message = "Run control name must be between 1 and 255 characters"))]
    pub name: String,
    #[serde(default)]
    pub rule_set_id: Option<Uuid>,
    /// Five-field cron expression
    #[validate(custom(function = "validate_cron"))]
    pub schedule: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UiMetadataDefinition {
    #[validate(length(min = 1, max = 255, message = "Page name must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "Component is required"))]
    pub component: String,
    /// Field layout, passed through untouched
    #[serde(default)]
    pub fields: serde_json::Value,
}

/// One row of a dynamic dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DynamicDataRecordContent {
    #[validate(length(min = 1, max = 255, message = "Record name must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "Dataset is required"))]
    pub dataset: String,
    #[serde(default)]
    pub values: serde_json::Value,
}

static CRON_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z*/,\-?#LW]+$").expect("cron field pattern is valid"));

fn validate_cron(schedule: &str) -> Result<(), ValidationError> {
    let fields: Vec<&str> = schedule.split_whitespace().collect();

    if fields.len() != 5 || !fields.iter().all(|f| CRON_FIELD.is_match(f)) {
        let mut err = ValidationError::new("invalid_cron");
        err.message = Some("Schedule must be a five-field cron expression".into());
        return Err(err);
    }

    Ok(())
}

// =============================================================================
// KIND-TAGGED CONTENT
// =============================================================================

/// Editable payload of any governed entity, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EntityContent {
    Rule(RuleDefinition),
    RuleSet(RuleSetDefinition),
    Scaffold(ScaffoldDefinition),
    RunControl(RunControlDefinition),
    UiMetadata(UiMetadataDefinition),
    DynamicDataRecord(DynamicDataRecordContent),
}

impl EntityContent {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityContent::Rule(_) => EntityKind::Rule,
            EntityContent::RuleSet(_) => EntityKind::RuleSet,
            EntityContent::Scaffold(_) => EntityKind::Scaffold,
            EntityContent::RunControl(_) => EntityKind::RunControl,
            EntityContent::UiMetadata(_) => EntityKind::UiMetadata,
            EntityContent::DynamicDataRecord(_) => EntityKind::DynamicDataRecord,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            EntityContent::Rule(c) => &c.name,
            EntityContent::RuleSet(c) => &c.name,
            EntityContent::Scaffold(c) => &c.name,
            EntityContent::RunControl(c) => &c.name,
            EntityContent::UiMetadata(c) => &c.name,
            EntityContent::DynamicDataRecord(c) => &c.name,
        }
    }

    pub fn validate_content(&self) -> Result<(), ValidationErrors> {
        match self {
            EntityContent::Rule(c) => c.validate(),
            EntityContent::RuleSet(c) => c.validate(),
            EntityContent::Scaffold(c) => c.validate(),
            EntityContent::RunControl(c) => c.validate(),
            EntityContent::UiMetadata(c) => c.validate(),
            EntityContent::DynamicDataRecord(c) => c.validate(),
        }
    }
}
