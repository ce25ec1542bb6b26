// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Freebox challenge-response login

use std::sync::Arc;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;

use crate::config::{join_url, normalize_base_url};
use crate::error::{AppError, Result};

use super::identity::ApplicationIdentity;
use super::transport::Transport;
use super::types::{ChallengeResponse, SessionInfo, SessionRequest, SessionResponse};

type HmacSha1 = Hmac<Sha1>;

/// Computes the login password: hex HMAC-SHA1 of the challenge keyed by the app token
///
/// The challenge is used byte for byte, without trimming.
pub fn derive_password(app_token: &SecretString, challenge: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(app_token.expose_secret().as_bytes())
        .map_err(|e| AppError::Config(format!("unusable app token: {e}")))?;
    mac.update(challenge.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Two-step login exchange against the Freebox
pub(crate) struct Authenticator {
    transport: Arc<dyn Transport>,
    identity: Arc<ApplicationIdentity>,
    app_token: SecretString,
    challenge_url: String,
    session_url: String,
}

impl Authenticator {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        identity: Arc<ApplicationIdentity>,
        app_token: SecretString,
        base_url: &str,
    ) -> Self {
        let base_url = normalize_base_url(base_url);
        Self {
            transport,
            identity,
            app_token,
            challenge_url: join_url(&base_url, "login/"),
            session_url: join_url(&base_url, "login/session/"),
        }
    }

    /// Fetches a fresh login challenge
    pub(crate) async fn get_challenge(&self) -> Result<String> {
        tracing::debug!("GET challenge: {}", self.challenge_url);
        let value = self.transport.get(&self.challenge_url, &[]).await?;
        let response: ChallengeResponse = serde_json::from_value(value)?;
        tracing::trace!("Challenge received, length: {}", response.challenge.len());
        Ok(response.challenge)
    }

    /// Exchanges the password derived from `challenge` for a session token
    pub(crate) async fn get_session_token(&self, challenge: &str) -> Result<String> {
        tracing::debug!("POST session token: {}", self.session_url);
        let request = SessionRequest {
            app_id: &self.identity.app_id,
            password: derive_password(&self.app_token, challenge)?,
        };
        let body = serde_json::to_value(&request)?;
        let value = self.transport.post(&self.session_url, &body, &[]).await?;
        let response: SessionResponse = serde_json::from_value(value)?;
        tracing::debug!("Session token received");
        Ok(response.session_token)
    }

    /// Full login: challenge then session token
    pub(crate) async fn login(&self) -> Result<SessionInfo> {
        let challenge = self.get_challenge().await?;
        let session_token = self.get_session_token(&challenge).await?;
        Ok(SessionInfo {
            session_token,
            challenge,
        })
    }
}
