//! Typed failures raised by the gateway

use thiserror::Error;

/// Message shown whenever the backend rejects the credentials
pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed. Please login again.";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// The request never reached the server or the response never arrived
    #[error("Network unreachable: {0}")]
    Network(String),

    /// 401/403 from any endpoint; the held token has already been dropped
    #[error("{}", AUTH_FAILED_MESSAGE)]
    AuthenticationFailed,

    /// Any other non-2xx status
    #[error("{}", rejection_message(*status, message.as_deref()))]
    Rejected { status: u16, message: Option<String> },

    /// The body was not the JSON shape expected
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// A record was expected but the body was empty
    #[error("Empty response body")]
    EmptyResponse,
}

fn rejection_message(status: u16, message: Option<&str>) -> String {
    match message {
        Some(m) if !m.trim().is_empty() => m.to_string(),
        _ => format!("HTTP error {}", status),
    }
}

impl ApiError {
    /// True when the session must be considered over
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Pull a human message out of an error body.
///
/// Validation failures carry `message` as an array of strings; those are
/// joined.
pub(crate) fn extract_server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("message")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}
