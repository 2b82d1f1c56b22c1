use serde::Serialize;

use crate::store::StoreError;
use crate::types::{ChangeId, PlanId};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Table '{0}' is not an editable content table")]
    ForbiddenTable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Cannot revert change {change_id}: {reason}")]
    RevertConflict { change_id: ChangeId, reason: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A mutation was applied but its change entry could not be written.
    /// Execution of the plan stops here; the plan stays `proposed`.
    #[error("Failed to record history for plan {plan_id} after {applied} change(s): {reason}")]
    HistoryWrite {
        plan_id: PlanId,
        applied: usize,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code, shared with the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::ForbiddenTable(_) => "FORBIDDEN_TABLE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::RevertConflict { .. } => "REVERT_CONFLICT",
            Self::Conflict(_) => "CONFLICT",
            Self::HistoryWrite { .. } => "HISTORY_WRITE_FAILED",
            Self::Store(_) => "STORE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Serializable summary of a [`CoreError`] carried inside execution and
/// revert reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl From<&CoreError> for ErrorDetail {
    fn from(err: &CoreError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}
