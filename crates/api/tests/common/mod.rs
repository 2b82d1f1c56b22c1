#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use folio_api::auth::jwt::{generate_access_token, JwtConfig, ROLE_ADMIN};
use folio_api::config::{CompletionConfig, ServerConfig};
use folio_api::router::build_app_router;
use folio_api::state::AppState;
use folio_assistant::{CompletionClient, CompletionError, CompletionReply, CompletionRequest};
use folio_events::ActivityBus;

const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
        },
        completion: CompletionConfig {
            api_url: "http://127.0.0.1:0/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "test-model".to_string(),
            timeout_secs: 5,
        },
    }
}

/// Completion client that answers every request with the next queued
/// reply and remembers what it was asked.
#[derive(Default)]
pub struct ScriptedCompletionClient {
    replies: Mutex<Vec<Result<CompletionReply, CompletionError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletionClient {
    pub fn new(replies: Vec<Result<CompletionReply, CompletionError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionReply, CompletionError> {
        self.requests.lock().unwrap().push(request);
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(CompletionError::Unavailable {
                status: 500,
                body: "no scripted reply".to_string(),
            });
        }
        replies.remove(0)
    }
}

/// Build the full application router over `pool` with a completion client
/// that has nothing to say.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Arc::new(ScriptedCompletionClient::default()))
}

/// Build the full application router over `pool` and `completion`, with the
/// same middleware stack production uses.
pub fn build_test_app_with(pool: PgPool, completion: Arc<dyn CompletionClient>) -> Router {
    let config = test_config();
    let state = AppState::new(
        pool,
        Arc::new(config.clone()),
        Arc::new(ActivityBus::default()),
        completion,
    );
    build_app_router(state, &config)
}

pub fn admin_token() -> String {
    token_for("owner", ROLE_ADMIN)
}

pub fn token_for(subject: &str, role: &str) -> String {
    generate_access_token(subject, role, 15, &test_config().jwt).unwrap()
}

/// Send an unauthenticated GET.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST with an empty body, as used by the execute/revert endpoints.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
