use crate::auth::jwt::JwtConfig;

/// Default OpenAI-compatible chat-completion endpoint.
const DEFAULT_COMPLETION_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long background tasks get to drain on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub completion: CompletionConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    ///
    /// See [`JwtConfig::from_env`] and [`CompletionConfig::from_env`] for
    /// the remaining variables.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            completion: CompletionConfig::from_env(),
        }
    }
}

/// Settings of the chat-completion service used by the plan proposer.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl CompletionConfig {
    /// | Env Var                   | Default                                      |
    /// |---------------------------|----------------------------------------------|
    /// | `COMPLETION_API_URL`      | `https://api.openai.com/v1/chat/completions` |
    /// | `COMPLETION_API_KEY`      | empty (requests will be rejected upstream)   |
    /// | `COMPLETION_MODEL`        | `gpt-4o-mini`                                |
    /// | `COMPLETION_TIMEOUT_SECS` | `60`                                         |
    pub fn from_env() -> Self {
        let api_url = std::env::var("COMPLETION_API_URL")
            .unwrap_or_else(|_| DEFAULT_COMPLETION_API_URL.into());
        let api_key = std::env::var("COMPLETION_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!("COMPLETION_API_KEY is not set, chat requests will fail");
        }
        let model =
            std::env::var("COMPLETION_MODEL").unwrap_or_else(|_| DEFAULT_COMPLETION_MODEL.into());
        let timeout_secs: u64 = std::env::var("COMPLETION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("COMPLETION_TIMEOUT_SECS must be a valid u64");

        Self {
            api_url,
            api_key,
            model,
            timeout_secs,
        }
    }
}
