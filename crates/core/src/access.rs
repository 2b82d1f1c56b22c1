//! Admin capability check applied at every engine entry point.

use crate::error::CoreError;

/// The identity and capability of whoever invoked an engine operation.
///
/// Authentication happens outside the core; callers arrive here with the
/// admin decision already made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Opaque actor label recorded in activity events.
    pub actor: String,
    pub is_admin: bool,
}

impl Caller {
    pub fn admin(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            is_admin: true,
        }
    }

    pub fn visitor(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            is_admin: false,
        }
    }
}

/// Reject non-admin callers before any I/O happens.
pub fn require_admin(caller: &Caller) -> Result<(), CoreError> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(CoreError::Unauthorized(format!(
            "'{}' is not allowed to manage site content",
            caller.actor
        )))
    }
}
