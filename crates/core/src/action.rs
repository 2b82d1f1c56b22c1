//! Structured content actions and intra-plan record references.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;
use crate::types::{Record, RecordId};

/// Prefix of a placeholder standing in for the record created by an
/// earlier action of the same plan, e.g. `$action:0`.
pub const PLACEHOLDER_PREFIX: &str = "$action:";

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(CoreError::Validation(format!(
                "Invalid action type '{other}'. Must be one of: create, update, delete"
            ))),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RecordRef
// ---------------------------------------------------------------------------

/// Either a concrete record id or a reference to the record created by
/// action `n` of the same plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordRef {
    Id(RecordId),
    Placeholder(usize),
}

impl RecordRef {
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if let Some(index) = placeholder_index(s) {
            return Ok(Self::Placeholder(index));
        }
        if s.starts_with(PLACEHOLDER_PREFIX) {
            return Err(CoreError::Validation(format!(
                "Malformed placeholder '{s}': expected {PLACEHOLDER_PREFIX}<index>"
            )));
        }
        s.parse::<RecordId>()
            .map(Self::Id)
            .map_err(|_| CoreError::Validation(format!("Invalid record id '{s}'")))
    }

    /// The concrete id, or a validation error when still a placeholder.
    pub fn concrete(self) -> Result<RecordId, CoreError> {
        match self {
            Self::Id(id) => Ok(id),
            Self::Placeholder(index) => Err(CoreError::Validation(format!(
                "Unresolved reference to action {index}"
            ))),
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Placeholder(index) => write!(f, "{PLACEHOLDER_PREFIX}{index}"),
        }
    }
}

impl From<RecordId> for RecordRef {
    fn from(id: RecordId) -> Self {
        Self::Id(id)
    }
}

impl Serialize for RecordRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RecordRef::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Index referenced by a `$action:N` string, if `value` is one.
pub fn placeholder_index(value: &str) -> Option<usize> {
    value.strip_prefix(PLACEHOLDER_PREFIX)?.parse().ok()
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// One create/update/delete instruction against a single content table.
///
/// `table` is kept as the raw name so that a table outside the allow-list
/// surfaces as a per-action `ForbiddenTable` failure at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordRef>,
    #[serde(default)]
    pub data: Record,
    pub description: String,
}

impl Action {
    /// Placeholder indices this action depends on, from `record_id` and
    /// top-level string values in `data`.
    pub fn dependencies(&self) -> Vec<usize> {
        let mut deps: Vec<usize> = self
            .data
            .values()
            .filter_map(|v| v.as_str().and_then(placeholder_index))
            .collect();
        if let Some(RecordRef::Placeholder(index)) = self.record_id {
            deps.push(index);
        }
        deps.sort_unstable();
        deps.dedup();
        deps
    }

    /// Substitute placeholders with the ids produced by earlier creates.
    ///
    /// `created[i]` holds the id produced by action `i`, if it was a create
    /// that succeeded. `position` is this action's own index in the plan.
    pub fn resolve(&self, position: usize, created: &[Option<RecordId>]) -> Result<Self, CoreError> {
        let lookup = |index: usize| -> Result<RecordId, CoreError> {
            if index >= position {
                return Err(CoreError::Validation(format!(
                    "Action {position} references action {index}, which does not run before it"
                )));
            }
            created.get(index).copied().flatten().ok_or_else(|| {
                CoreError::Validation(format!(
                    "Action {position} references action {index}, which did not create a record"
                ))
            })
        };

        let record_id = match self.record_id {
            Some(RecordRef::Placeholder(index)) => Some(RecordRef::Id(lookup(index)?)),
            other => other,
        };

        let mut data = Record::new();
        for (field, value) in &self.data {
            let resolved = match value.as_str().and_then(placeholder_index) {
                Some(index) => serde_json::Value::String(lookup(index)?.to_string()),
                None => value.clone(),
            };
            data.insert(field.clone(), resolved);
        }

        Ok(Self {
            kind: self.kind,
            table: self.table.clone(),
            record_id,
            data,
            description: self.description.clone(),
        })
    }
}

/// Check that every placeholder in `actions` points at an earlier `create`.
pub fn validate_references(actions: &[Action]) -> Result<(), CoreError> {
    for (position, action) in actions.iter().enumerate() {
        for index in action.dependencies() {
            let target = actions.get(index).filter(|_| index < position);
            match target {
                Some(target) if target.kind == ActionKind::Create => {}
                _ => {
                    return Err(CoreError::Validation(format!(
                        "Action {position} references action {index}, which is not an earlier create"
                    )))
                }
            }
        }
    }
    Ok(())
}
