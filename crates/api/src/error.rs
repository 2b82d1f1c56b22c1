use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use folio_assistant::{CompletionError, ProposeError};
use folio_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`CompletionError`] for the
/// chat-completion service. Storage failures arrive as `CoreError::Store`.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `folio_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failure talking to the chat-completion service.
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<ProposeError> for AppError {
    fn from(err: ProposeError) -> Self {
        match err {
            ProposeError::Core(core) => AppError::Core(core),
            ProposeError::Completion(completion) => AppError::Completion(completion),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Completion(err) => classify_completion_error(err),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal_error() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, err.code(), msg.clone()),
        CoreError::ForbiddenTable(_) => (StatusCode::FORBIDDEN, err.code(), err.to_string()),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, err.code(), msg.clone()),
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            err.code(),
            format!("{entity} with id {id} not found"),
        ),
        CoreError::RevertConflict { .. } => (StatusCode::CONFLICT, err.code(), err.to_string()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, err.code(), msg.clone()),
        // Message names the plan and the number of applied changes.
        CoreError::HistoryWrite { .. } => {
            tracing::error!(error = %err, "Plan history write failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.code(), err.to_string())
        }
        CoreError::Store(store) => {
            tracing::error!(error = %store, "Store error");
            internal_error()
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal_error()
        }
    }
}

/// Map completion-service failures onto upstream-style statuses.
///
/// - 429 and 402 from the service are passed through with their own codes.
/// - Any other upstream failure is a 503.
/// - A reply the proposer cannot interpret is a 502.
fn classify_completion_error(err: &CompletionError) -> (StatusCode, &'static str, String) {
    match err {
        CompletionError::RateLimited => {
            (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", err.to_string())
        }
        CompletionError::PaymentRequired => {
            (StatusCode::PAYMENT_REQUIRED, "PAYMENT_REQUIRED", err.to_string())
        }
        CompletionError::Unavailable { status, body } => {
            tracing::warn!(status, body = %body, "Completion service returned an error");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "UPSTREAM_UNAVAILABLE",
                "The assistant is temporarily unavailable".to_string(),
            )
        }
        CompletionError::Request(e) => {
            tracing::warn!(error = %e, "Completion request failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "UPSTREAM_UNAVAILABLE",
                "The assistant is temporarily unavailable".to_string(),
            )
        }
        CompletionError::InvalidResponse(msg) => {
            tracing::warn!(error = %msg, "Unusable completion response");
            (StatusCode::BAD_GATEWAY, "INVALID_ASSISTANT_RESPONSE", err.to_string())
        }
    }
}
