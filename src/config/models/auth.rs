//! Probe authentication configuration

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Authentication scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// No authentication
    #[default]
    None,
    /// API key in a configurable header
    ApiKey,
    /// `Authorization: Bearer <token>`
    BearerToken,
    /// `Authorization: Basic <base64(user:pass)>`
    Basic,
}

/// Credentials attached to every probe request of a server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Authentication type
    #[serde(rename = "type", default)]
    pub auth_type: AuthType,

    /// API key or token. Can use environment variable syntax: ${ENV_VAR}
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Basic auth user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Basic auth password, also accepts ${ENV_VAR}
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Header name for API key (default: Authorization)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_name: Option<String>,

    /// Header prefix for API key (e.g., "Api-Key")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_prefix: Option<String>,
}

impl AuthConfig {
    /// Create API key authentication
    pub fn api_key(value: impl Into<String>) -> Self {
        Self {
            auth_type: AuthType::ApiKey,
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Create Bearer token authentication
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            auth_type: AuthType::BearerToken,
            value: Some(token.into()),
            ..Self::default()
        }
    }

    /// Create Basic authentication
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            auth_type: AuthType::Basic,
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    /// Set custom header name
    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = Some(name.into());
        self
    }

    pub fn is_none(&self) -> bool {
        self.auth_type == AuthType::None
    }

    /// Header name and value to send, or `None` when unauthenticated
    pub fn header(&self) -> Option<(String, String)> {
        match self.auth_type {
            AuthType::None => None,
            AuthType::ApiKey => {
                let value = resolve_env(self.value.as_deref()?);
                let name = self
                    .header_name
                    .clone()
                    .unwrap_or_else(|| "Authorization".to_string());
                let value = match &self.header_prefix {
                    Some(prefix) => format!("{} {}", prefix, value),
                    None => value,
                };
                Some((name, value))
            }
            AuthType::BearerToken => {
                let token = resolve_env(self.value.as_deref()?);
                Some(("Authorization".to_string(), format!("Bearer {}", token)))
            }
            AuthType::Basic => {
                let user = resolve_env(self.username.as_deref()?);
                let password = resolve_env(self.password.as_deref().unwrap_or_default());
                let encoded = STANDARD.encode(format!("{}:{}", user, password));
                Some(("Authorization".to_string(), format!("Basic {}", encoded)))
            }
        }
    }
}

/// Expand a whole-value `${VAR}` reference; unset variables expand to empty
fn resolve_env(value: &str) -> String {
    match value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        Some(var) => std::env::var(var).unwrap_or_default(),
        None => value.to_string(),
    }
}
