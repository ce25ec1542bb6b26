// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! JSON transport for the Freebox API
//!
//! [`HttpTransport`] is the production implementation, built on a reqwest
//! client whose TLS trust store only holds the pinned roots from [`certs`].
//! The [`Transport`] trait is the seam the session layer is written against.

pub mod certs;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::config::TransportOptions;
use crate::error::{AppError, Result};

use super::types::ApiResponse;
use certs::PinnedRoot;

/// Callback adjusting the headers of an outgoing request
pub type RequestDecorator<'a> = dyn Fn(&mut HeaderMap) + Send + Sync + 'a;

/// Minimal JSON GET/POST capability against the Freebox API
///
/// Implementations unwrap the API envelope: `Ok` carries the `result`
/// member, API failures become [`AppError`] values.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, decorators: &[&RequestDecorator<'_>]) -> Result<Value>;

    async fn post(
        &self,
        url: &str,
        body: &Value,
        decorators: &[&RequestDecorator<'_>],
    ) -> Result<Value>;
}

/// HTTPS transport trusting only the pinned Freebox roots
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport trusting the embedded roots
    ///
    /// # Errors
    ///
    /// Returns `AppError::Tls` if the embedded certificates cannot be loaded,
    /// which means the build is corrupted and the process must not start.
    pub fn new(options: &TransportOptions) -> Result<Self> {
        Self::with_roots(options, &certs::PINNED_ROOTS)
    }

    /// Creates a transport trusting exactly `roots`
    ///
    /// # Errors
    ///
    /// Returns `AppError::Tls` if a root cannot be loaded or the client cannot be built.
    pub fn with_roots(options: &TransportOptions, roots: &[PinnedRoot<'_>]) -> Result<Self> {
        let tls = certs::client_config(roots)?;
        let client = reqwest::Client::builder()
            .use_preconfigured_tls(tls)
            .pool_max_idle_per_host(options.max_idle_per_host)
            .pool_idle_timeout(options.idle_timeout)
            .timeout(options.timeout)
            .build()
            .map_err(|e| AppError::Tls(format!("cannot build HTTP client: {e}")))?;
        tracing::debug!(
            "HTTP transport ready (timeout: {:?}, idle timeout: {:?}, max idle per host: {})",
            options.timeout,
            options.idle_timeout,
            options.max_idle_per_host
        );
        Ok(Self { client })
    }

    fn headers(decorators: &[&RequestDecorator<'_>]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for decorate in decorators {
            decorate(&mut headers);
        }
        headers
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, decorators: &[&RequestDecorator<'_>]) -> Result<Value> {
        tracing::trace!("GET {}", url);
        let response = self
            .client
            .get(url)
            .headers(Self::headers(decorators))
            .send()
            .await?;
        decode_response(response).await
    }

    async fn post(
        &self,
        url: &str,
        body: &Value,
        decorators: &[&RequestDecorator<'_>],
    ) -> Result<Value> {
        tracing::trace!("POST {}", url);
        let response = self
            .client
            .post(url)
            .headers(Self::headers(decorators))
            .json(body)
            .send()
            .await?;
        decode_response(response).await
    }
}

async fn decode_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body = response.bytes().await?;
    decode_envelope(status.as_u16(), &body)
}

/// Unwraps a Freebox API envelope
///
/// A body that is not an envelope is a `Status` error for non-2xx responses
/// and a `Decode` error otherwise.
pub(crate) fn decode_envelope(status: u16, body: &[u8]) -> Result<Value> {
    let envelope: ApiResponse = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            if (200..300).contains(&status) {
                return Err(AppError::Decode(e));
            }
            return Err(AppError::Status(status));
        }
    };

    if envelope.success {
        return Ok(envelope.result.unwrap_or(Value::Null));
    }

    let code = envelope.error_code.unwrap_or_default();
    let message = envelope.msg.unwrap_or_default();
    tracing::debug!("Freebox API error (HTTP {}): {} {}", status, code, message);
    if code.is_empty() {
        return Err(AppError::Status(status));
    }
    Err(AppError::from_api(&code, message))
}
