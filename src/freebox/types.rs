// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Freebox API wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard Freebox API response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    pub success: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

/// Result of `GET /login/`
#[derive(Debug, Deserialize)]
pub(crate) struct ChallengeResponse {
    pub challenge: String,
}

/// Body of `POST /login/session/`
#[derive(Debug, Serialize)]
pub(crate) struct SessionRequest<'a> {
    pub app_id: &'a str,
    pub password: String,
}

/// Result of `POST /login/session/`
#[derive(Debug, Deserialize)]
pub(crate) struct SessionResponse {
    pub session_token: String,
}

/// One successful login
///
/// Never mutated; a new login produces a new value.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_token: String,
    pub challenge: String,
}

impl std::fmt::Debug for SessionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionInfo")
            .field("session_token", &"[REDACTED]")
            .field("challenge", &self.challenge)
            .finish()
    }
}
