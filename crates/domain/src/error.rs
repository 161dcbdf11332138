//! Domain error types

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credentials::CredentialsError;

/// Error payload reported by the account service.
///
/// The server answers failures with `{"error": <value>}`. The value is kept
/// verbatim so the UI can render whatever the service sent; for the account
/// service it is usually `{"type": "...", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorValue(serde_json::Value);

impl ErrorValue {
    /// Wraps a raw JSON error value.
    #[must_use]
    pub const fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Returns the raw JSON value.
    #[must_use]
    pub const fn raw(&self) -> &serde_json::Value {
        &self.0
    }

    /// Returns the `type` field, if the payload has one.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(serde_json::Value::as_str)
    }

    /// Best-effort human readable message.
    ///
    /// Uses the `message` field when present, a bare JSON string as-is,
    /// and the compact JSON text otherwise.
    #[must_use]
    pub fn message(&self) -> String {
        if let Some(message) = self.0.get("message").and_then(serde_json::Value::as_str) {
            return message.to_string();
        }
        match &self.0 {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl From<&str> for ErrorValue {
    fn from(message: &str) -> Self {
        Self(serde_json::Value::String(message.to_string()))
    }
}

/// Why a token could not be decoded into claims.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No token was provided.
    #[error("token is empty")]
    Empty,

    /// The token does not have the `header.payload.signature` shape.
    #[error("token has {0} segments, expected 3")]
    Segments(usize),

    /// The payload segment is not valid base64url.
    #[error("token payload is not valid base64url")]
    Base64,

    /// The payload is not the expected JSON claim set.
    #[error("token payload is not a valid claim set: {0}")]
    Claims(String),

    /// The token's `exp` is at or before the current time.
    #[error("token expired at {exp}")]
    Expired {
        /// Expiry, seconds since the Unix epoch.
        exp: i64,
    },
}

fn status_suffix(status: impl Borrow<Option<u16>>) -> String {
    Borrow::<Option<u16>>::borrow(&status)
        .map(|s| format!(" ({s})"))
        .unwrap_or_default()
}

/// Normalized authentication error.
///
/// Every failure of an authentication operation ends up as one of these
/// values, both in the returned `Result` and in `Session::error`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    /// No response was received (connection, DNS, timeout).
    #[error("network error: {message}")]
    Transport {
        /// Description of the network failure.
        message: String,
    },

    /// The server answered with a structured error payload.
    #[error("server error{}: {}", status_suffix(.status), .error.message())]
    Server {
        /// HTTP status, when known.
        status: Option<u16>,
        /// Error payload as sent by the server.
        error: ErrorValue,
    },

    /// The server answered, but not in the expected shape.
    #[error("malformed response: {message}")]
    MalformedResponse {
        /// What was wrong with the response.
        message: String,
    },

    /// A token issued by the server could not be decoded.
    #[error("invalid token: {0}")]
    Decode(#[from] DecodeError),

    /// Durable token storage failed.
    #[error("token storage error: {message}")]
    Storage {
        /// Underlying storage failure.
        message: String,
    },

    /// Credentials were rejected before reaching the network.
    #[error("{0}")]
    InvalidCredentials(#[from] CredentialsError),

    /// No refresh token is available for a refresh.
    #[error("no valid refresh token available")]
    MissingRefreshToken,

    /// A newer operation started before this one finished; its result was
    /// discarded.
    #[error("operation superseded by a newer one")]
    Superseded,
}

impl AuthError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a malformed-response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Creates a storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns true if the error was produced by the network or the server.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Server { .. } | Self::MalformedResponse { .. }
        )
    }
}
