// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Error types for Freebox Exporter application

use thiserror::Error;

/// Freebox API error code for a request sent without a session
pub const ERROR_CODE_AUTH_REQUIRED: &str = "auth_required";

/// Freebox API error code for an expired or revoked session token
pub const ERROR_CODE_INVALID_TOKEN: &str = "invalid_token";

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),

    /// Address parsing error
    #[error("Address parse error")]
    AddrParse(#[from] std::net::AddrParseError),

    /// Pinned trust store could not be built
    #[error("TLS error: {0}")]
    Tls(String),

    /// Host identity could not be resolved
    #[error("Identity error: {0}")]
    Identity(String),

    /// HTTP transport error (connect, timeout, TLS handshake)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status without a Freebox API envelope
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// The device requires an authenticated session
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// The session token was rejected
    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    /// Any other Freebox API error
    #[error("Freebox API error {code}: {message}")]
    Api { code: String, message: String },

    /// Malformed JSON or unexpected response schema
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Metrics encoding error
    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl AppError {
    /// Maps a Freebox API `error_code` to an error
    pub fn from_api(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            ERROR_CODE_AUTH_REQUIRED => Self::AuthRequired(message),
            ERROR_CODE_INVALID_TOKEN => Self::InvalidToken(message),
            _ => Self::Api {
                code: code.to_string(),
                message,
            },
        }
    }

    /// Returns true for the two errors that are recovered by a session refresh
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::AuthRequired(_) | Self::InvalidToken(_))
    }
}

/// Convenient alias for Result with application error
pub type Result<T> = std::result::Result<T, AppError>;
