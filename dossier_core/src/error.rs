// src/error.rs
use serde_json::json;

/// Failure at the HTTP boundary: the request never completed or the upstream
/// answered with a non-2xx status.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", self.describe())]
pub struct TransportError {
    pub url: String,
    /// HTTP status when the upstream answered; `None` for network failures.
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn status(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    fn describe(&self) -> String {
        match self.status {
            Some(code) => format!("HTTP {} from {}: {}", code, self.url, self.message),
            None => format!("request to {} failed: {}", self.url, self.message),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: TransportError,
    },

    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String, raw: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn transport(context: impl Into<String>, source: TransportError) -> Self {
        ClientError::Transport {
            context: context.into(),
            source,
        }
    }

    pub fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        ClientError::MalformedResponse {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// Upstream HTTP status, if this error came from a non-2xx response.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ClientError::Transport { source, .. } => source.status,
            _ => None,
        }
    }

    /// Raw payload kept for diagnostics when the response shape was unusable.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            ClientError::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            ClientError::Transport { .. } => "upstream_error",
            ClientError::MalformedResponse { .. } => "malformed_response",
            ClientError::InvalidInput(_) => "invalid_input",
            ClientError::Config(_) => "config_error",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "code": self.code_str(),
            "message": self.to_string(),
            "status": self.upstream_status(),
        })
    }
}
