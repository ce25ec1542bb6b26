// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Application identity presented to the Freebox

use std::ffi::OsString;

use serde::Serialize;

use crate::config::{IdentityOverrides, defaults};
use crate::error::{AppError, Result};

/// Application id registered with the Freebox during pairing
pub const APP_ID: &str = "com.github.jesof.freebox-exporter";

/// Static identity of this exporter, computed once at startup
///
/// Serializes to the body of `POST /login/authorize/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationIdentity {
    pub app_id: String,
    pub app_name: String,
    pub app_version: String,
    pub device_name: String,
}

impl ApplicationIdentity {
    /// Resolves the identity from overrides and the host name
    ///
    /// # Errors
    ///
    /// Returns `AppError::Identity` if the host name cannot be determined.
    pub fn resolve(overrides: &IdentityOverrides) -> Result<Self> {
        Self::resolve_with(overrides, hostname::get)
    }

    /// Same as [`resolve`](Self::resolve) with an explicit host name resolver
    ///
    /// The resolver is only called when no device name override is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Identity` if the resolver fails or yields a non UTF-8 name.
    pub fn resolve_with<F>(overrides: &IdentityOverrides, resolve_host: F) -> Result<Self>
    where
        F: FnOnce() -> std::io::Result<OsString>,
    {
        let device_name = match &overrides.device_name {
            Some(name) => name.clone(),
            None => {
                let host = resolve_host().map_err(|e| {
                    AppError::Identity(format!("cannot determine host name: {e}"))
                })?;
                host.into_string().map_err(|h| {
                    AppError::Identity(format!("host name is not valid UTF-8: {h:?}"))
                })?
            }
        };

        let app_name = overrides
            .app_name
            .clone()
            .unwrap_or_else(|| defaults::APP_NAME.to_string());

        let identity = Self {
            app_id: APP_ID.to_string(),
            app_name,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            device_name,
        };
        tracing::debug!(
            "Application identity: {} ({}) on {}",
            identity.app_name,
            identity.app_version,
            identity.device_name
        );
        Ok(identity)
    }

    /// Body of the one-time authorization request
    pub fn authorization_request(&self) -> serde_json::Value {
        serde_json::json!({
            "app_id": self.app_id,
            "app_name": self.app_name,
            "app_version": self.app_version,
            "device_name": self.device_name,
        })
    }
}
