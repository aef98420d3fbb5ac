//! Error taxonomy for management-server API calls.

use serde::Deserialize;
use thiserror::Error;

/// One diagnostic entry inside a failure response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: String,
}

/// The structured body of a failed API call.
///
/// The server reports an overall `message` plus optional `errors` and
/// `warnings` lists; collision detection works off those lists (see
/// [`crate::classify`]).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiFailure {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    #[serde(default)]
    pub warnings: Vec<ApiMessage>,
}

impl ApiFailure {
    /// All diagnostic lines, errors first, falling back to the overall
    /// message when both lists are empty.
    pub fn lines(&self) -> Vec<&str> {
        let mut lines: Vec<&str> = self
            .errors
            .iter()
            .chain(self.warnings.iter())
            .map(|m| m.message.as_str())
            .collect();
        if lines.is_empty() && !self.message.is_empty() {
            lines.push(self.message.as_str());
        }
        lines
    }
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.lines().is_empty() {
            write!(f, "API call failed")
        } else {
            write!(f, "{}", self.lines().join("; "))
        }
    }
}

/// Errors that can occur while talking to the management server.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level failure (connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The client was built with invalid settings.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The server's response body could not be parsed.
    #[error("failed to parse server response: {0}")]
    Parse(String),

    /// Login was rejected or no session is established.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The server rejected the call with a structured failure body.
    #[error("server rejected call: {0}")]
    Call(ApiFailure),
}

impl ApiError {
    /// The structured failure body, if this error carries one.
    #[must_use]
    pub fn as_failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::Call(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Result type for management API operations.
pub type ApiResult<T> = Result<T, ApiError>;
