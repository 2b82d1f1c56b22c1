//! Content plans and their lifecycle.
//!
//! A plan moves strictly `proposed -> executed -> reverted`.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::action::{self, Action};
use crate::change::Change;
use crate::error::CoreError;
use crate::types::{PlanId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Proposed,
    Executed,
    Reverted,
}

impl PlanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Executed => "executed",
            Self::Reverted => "reverted",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "proposed" => Ok(Self::Proposed),
            "executed" => Ok(Self::Executed),
            "reverted" => Ok(Self::Reverted),
            other => Err(CoreError::Validation(format!(
                "Invalid plan status '{other}'. Must be one of: proposed, executed, reverted"
            ))),
        }
    }

    /// The only status this one may advance to.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Proposed => Some(Self::Executed),
            Self::Executed => Some(Self::Reverted),
            Self::Reverted => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

/// An ordered batch of content actions with a single lifecycle status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPlan {
    pub id: PlanId,
    pub title: String,
    pub summary: String,
    pub actions: Vec<Action>,
    pub status: PlanStatus,
    pub created_at: Timestamp,
    pub executed_at: Option<Timestamp>,
    pub reverted_at: Option<Timestamp>,
}

impl ContentPlan {
    /// Check that `target` is the next lifecycle step.
    pub fn ensure_transition(&self, target: PlanStatus) -> Result<(), CoreError> {
        if self.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Plan {} is {} and cannot become {}",
                self.id,
                self.status.as_str(),
                target.as_str()
            )))
        }
    }
}

/// A candidate plan awaiting acceptance, as produced by the proposer or
/// entered manually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PlanDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 4000))]
    pub summary: String,
    #[validate(length(min = 1, max = 100))]
    pub actions: Vec<Action>,
}

impl PlanDraft {
    /// Structural checks run before a draft is accepted as a plan.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("Plan title must not be blank".to_string()));
        }
        action::validate_references(&self.actions)
    }
}

/// A plan together with the changes it produced, for the history view.
#[derive(Debug, Clone, Serialize)]
pub struct PlanWithChanges {
    #[serde(flatten)]
    pub plan: ContentPlan,
    pub changes: Vec<Change>,
}
