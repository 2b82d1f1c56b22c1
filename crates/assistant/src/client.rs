//! Chat-completion client with tool calling.
//!
//! [`HttpCompletionClient`] speaks the OpenAI-compatible
//! `POST /chat/completions` protocol using [`reqwest`]. Callers depend on
//! the [`CompletionClient`] trait so tests can substitute a canned client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A function the model may call, described by a JSON schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

/// What the model answered: prose, or one structured tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionReply {
    Text(String),
    ToolCall {
        name: String,
        arguments: serde_json::Value,
    },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the completion service. Never retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Completion service rate limit reached, try again later")]
    RateLimited,

    #[error("Completion service requires payment")]
    PaymentRequired,

    /// Any other non-2xx answer.
    #[error("Completion service unavailable ({status}): {body}")]
    Unavailable { status: u16, body: String },

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected completion response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Map a non-success HTTP status to its error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => Self::RateLimited,
            402 => Self::PaymentRequired,
            _ => Self::Unavailable { status, body },
        }
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionReply, CompletionError>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// HTTP client for an OpenAI-compatible chat-completion endpoint.
pub struct HttpCompletionClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpCompletionClient {
    /// * `api_url` - Full endpoint URL, e.g. `https://host/v1/chat/completions`.
    pub fn new(
        api_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url, api_key, model))
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(
        client: reqwest::Client,
        api_url: String,
        api_key: String,
        model: String,
    ) -> Self {
        Self {
            client,
            api_url,
            api_key,
            model,
        }
    }

    fn request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut messages = vec![serde_json::json!({
            "role": ChatRole::System,
            "content": request.system,
        })];
        messages.extend(
            request
                .messages
                .iter()
                .map(|m| serde_json::json!({ "role": m.role, "content": m.content })),
        );

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        if !request.tools.is_empty() {
            let tools: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = serde_json::Value::Array(tools);
            body["tool_choice"] = serde_json::json!("auto");
        }
        body
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionReply, CompletionError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(status = status.as_u16(), "Completion request rejected");
            return Err(CompletionError::from_status(status.as_u16(), body));
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        parsed.into_reply()
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    /// JSON-encoded arguments, as a string.
    arguments: String,
}

impl ChatCompletionResponse {
    /// The first tool call if there is one, otherwise the text content.
    pub fn into_reply(self) -> Result<CompletionReply, CompletionError> {
        let message = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidResponse("no choices returned".to_string()))?
            .message;

        if let Some(call) = message.tool_calls.into_iter().next() {
            let arguments = serde_json::from_str(&call.function.arguments).map_err(|e| {
                CompletionError::InvalidResponse(format!(
                    "arguments of tool '{}' are not valid JSON: {e}",
                    call.function.name
                ))
            })?;
            return Ok(CompletionReply::ToolCall {
                name: call.function.name,
                arguments,
            });
        }

        match message.content {
            Some(text) if !text.trim().is_empty() => Ok(CompletionReply::Text(text)),
            _ => Err(CompletionError::InvalidResponse(
                "reply has neither content nor a tool call".to_string(),
            )),
        }
    }
}
