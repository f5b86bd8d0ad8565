//! Environment-driven application configuration.
//!
//! Everything has a development-friendly default except the identity
//! provider's API key, which must be set for the server to start.

use std::env;

use thiserror::Error;

use crate::outbound::dynamodb::TableConfig;

/// Configuration errors raised at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable was absent.
    #[error("missing required environment variable {name}")]
    MissingVariable {
        /// Variable name.
        name: &'static str,
    },
    /// A variable was present but unparsable.
    #[error("invalid value for {name}: {message}")]
    InvalidVariable {
        /// Variable name.
        name: &'static str,
        /// Parse failure context.
        message: String,
    },
}

/// Runtime settings resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TCP port the HTTP server binds on `0.0.0.0`.
    pub http_port: u16,
    /// Document-store table names.
    pub tables: TableConfig,
    /// Optional endpoint override for DynamoDB Local.
    pub dynamodb_endpoint: Option<String>,
    /// Identity provider base URL.
    pub identity_base_url: String,
    /// Identity provider API key.
    pub identity_api_key: String,
    /// Optional tag-suggestion model endpoint; the feature is reported as
    /// unavailable when unset.
    pub suggest_endpoint: Option<String>,
    /// Path to the session cookie signing key.
    pub session_key_file: String,
    /// Whether a missing key file may fall back to an ephemeral key.
    pub session_allow_ephemeral: bool,
    /// Whether the session cookie carries the `Secure` flag.
    pub cookie_secure: bool,
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_port = match optional("HTTP_PORT") {
            Some(raw) => raw.parse().map_err(|err| ConfigError::InvalidVariable {
                name: "HTTP_PORT",
                message: format!("{err}"),
            })?,
            None => 8080,
        };

        let identity_api_key =
            optional("IDENTITY_API_KEY").ok_or(ConfigError::MissingVariable {
                name: "IDENTITY_API_KEY",
            })?;

        Ok(Self {
            http_port,
            tables: TableConfig::default(),
            dynamodb_endpoint: optional("DYNAMODB_ENDPOINT_URL"),
            identity_base_url: optional("IDENTITY_BASE_URL")
                .unwrap_or_else(|| "https://identitytoolkit.googleapis.com".to_owned()),
            identity_api_key,
            suggest_endpoint: optional("TAG_SUGGEST_URL"),
            session_key_file: optional("SESSION_KEY_FILE")
                .unwrap_or_else(|| "/var/run/secrets/session_key".to_owned()),
            session_allow_ephemeral: optional("SESSION_ALLOW_EPHEMERAL").as_deref() == Some("1"),
            cookie_secure: optional("SESSION_COOKIE_SECURE").map_or(true, |v| v != "0"),
        })
    }
}
