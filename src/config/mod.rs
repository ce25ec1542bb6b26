// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Configuration module for Freebox Exporter application
//!
//! Loads and parses configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{AppError, Result};

#[cfg(test)]
mod tests;

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const SERVER_ADDR: &str = "0.0.0.0:9091";
    pub const BASE_URL: &str = "https://mafreebox.freebox.fr/api/v8/";
    pub const APP_NAME: &str = "freebox-exporter";
    pub const POLL_ENDPOINTS: &str = "connection/,system/";
    pub const COLLECTION_INTERVAL_SECS: u64 = 30;

    pub const RETRY_MIN_DELAY: Duration = Duration::from_secs(5);
    pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(60);

    pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
    pub const HTTP_IDLE_TIMEOUT: Duration = Duration::from_secs(600);
    pub const HTTP_MAX_IDLE_PER_HOST: usize = 10;
}

/// Environment variable names used by the application
pub mod env_vars {
    pub const SERVER_ADDR: &str = "SERVER_ADDR";
    pub const BASE_URL: &str = "FBX_BASE_URL";
    pub const APP_TOKEN: &str = "FBX_APP_TOKEN";
    pub const APP_TOKEN_FILE: &str = "FBX_APP_TOKEN_FILE";
    pub const APP_NAME: &str = "FBX_APPNAME";
    pub const DEVICE_NAME: &str = "FBX_DEVICE_NAME";
    pub const RETRY_MIN_DELAY: &str = "FBX_RETRY_MIN_DELAY";
    pub const RETRY_MAX_DELAY: &str = "FBX_RETRY_MAX_DELAY";
    pub const HTTP_TIMEOUT: &str = "FBX_HTTP_TIMEOUT";
    pub const HTTP_IDLE_TIMEOUT: &str = "FBX_HTTP_IDLE_TIMEOUT";
    pub const HTTP_MAX_IDLE_PER_HOST: &str = "FBX_HTTP_MAX_IDLE_PER_HOST";
    pub const COLLECTION_INTERVAL: &str = "COLLECTION_INTERVAL_SECONDS";
    pub const POLL_ENDPOINTS: &str = "FBX_POLL_ENDPOINTS";
}

/// Bounds of the login failure backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: defaults::RETRY_MIN_DELAY,
            max_delay: defaults::RETRY_MAX_DELAY,
        }
    }
}

impl RetryConfig {
    /// Builds retry bounds from optional raw duration strings
    ///
    /// Invalid values fall back to the defaults.
    pub fn from_raw(min_delay: Option<&str>, max_delay: Option<&str>) -> Self {
        let min_delay = duration_or_default(
            env_vars::RETRY_MIN_DELAY,
            min_delay,
            defaults::RETRY_MIN_DELAY,
        );
        let mut max_delay = duration_or_default(
            env_vars::RETRY_MAX_DELAY,
            max_delay,
            defaults::RETRY_MAX_DELAY,
        );
        if max_delay < min_delay {
            tracing::warn!(
                "Retry max delay {:?} is below min delay {:?}, using {:?}",
                max_delay,
                min_delay,
                min_delay
            );
            max_delay = min_delay;
        }
        Self {
            min_delay,
            max_delay,
        }
    }

    fn from_env() -> Self {
        let min_delay = std::env::var(env_vars::RETRY_MIN_DELAY).ok();
        let max_delay = std::env::var(env_vars::RETRY_MAX_DELAY).ok();
        Self::from_raw(min_delay.as_deref(), max_delay.as_deref())
    }
}

/// HTTP connection reuse and timeout settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    pub timeout: Duration,
    pub idle_timeout: Duration,
    pub max_idle_per_host: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: defaults::HTTP_TIMEOUT,
            idle_timeout: defaults::HTTP_IDLE_TIMEOUT,
            max_idle_per_host: defaults::HTTP_MAX_IDLE_PER_HOST,
        }
    }
}

impl TransportOptions {
    fn from_env() -> Self {
        let timeout = duration_or_default(
            env_vars::HTTP_TIMEOUT,
            std::env::var(env_vars::HTTP_TIMEOUT).ok().as_deref(),
            defaults::HTTP_TIMEOUT,
        );
        let idle_timeout = duration_or_default(
            env_vars::HTTP_IDLE_TIMEOUT,
            std::env::var(env_vars::HTTP_IDLE_TIMEOUT).ok().as_deref(),
            defaults::HTTP_IDLE_TIMEOUT,
        );
        let max_idle_per_host = std::env::var(env_vars::HTTP_MAX_IDLE_PER_HOST)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults::HTTP_MAX_IDLE_PER_HOST);
        Self {
            timeout,
            idle_timeout,
            max_idle_per_host,
        }
    }
}

/// Optional overrides of the application identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityOverrides {
    pub app_name: Option<String>,
    pub device_name: Option<String>,
}

impl IdentityOverrides {
    fn from_env() -> Self {
        Self {
            app_name: non_empty_var(env_vars::APP_NAME),
            device_name: non_empty_var(env_vars::DEVICE_NAME),
        }
    }
}

/// Application-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub base_url: String,
    pub poll_endpoints: Vec<String>,
    pub collection_interval_secs: u64,
    pub app_token_file: Option<PathBuf>,
    pub identity: IdentityOverrides,
    pub retry: RetryConfig,
    pub transport: TransportOptions,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_addr: defaults::SERVER_ADDR.to_string(),
            base_url: defaults::BASE_URL.to_string(),
            poll_endpoints: parse_endpoints(defaults::POLL_ENDPOINTS),
            collection_interval_secs: defaults::COLLECTION_INTERVAL_SECS,
            app_token_file: None,
            identity: IdentityOverrides::default(),
            retry: RetryConfig::default(),
            transport: TransportOptions::default(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let server_addr = std::env::var(env_vars::SERVER_ADDR)
            .unwrap_or_else(|_| defaults::SERVER_ADDR.to_string());

        let base_url = normalize_base_url(
            &std::env::var(env_vars::BASE_URL).unwrap_or_else(|_| defaults::BASE_URL.to_string()),
        );

        let poll_endpoints = std::env::var(env_vars::POLL_ENDPOINTS)
            .map(|v| parse_endpoints(&v))
            .unwrap_or_else(|_| parse_endpoints(defaults::POLL_ENDPOINTS));
        if poll_endpoints.is_empty() {
            tracing::warn!(
                "No API endpoints to poll. Service will start but /metrics will only show session state."
            );
        }

        let collection_interval_secs = std::env::var(env_vars::COLLECTION_INTERVAL)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults::COLLECTION_INTERVAL_SECS);

        Config {
            server_addr,
            base_url,
            poll_endpoints,
            collection_interval_secs,
            app_token_file: std::env::var_os(env_vars::APP_TOKEN_FILE).map(PathBuf::from),
            identity: IdentityOverrides::from_env(),
            retry: RetryConfig::from_env(),
            transport: TransportOptions::from_env(),
        }
    }

    /// Loads the app token from `FBX_APP_TOKEN` or the configured token file
    ///
    /// # Errors
    ///
    /// Returns an error if no token is configured or the token file is unreadable.
    pub fn load_app_token(&self) -> Result<SecretString> {
        if let Some(token) = non_empty_var(env_vars::APP_TOKEN) {
            tracing::debug!("Using app token from {}", env_vars::APP_TOKEN);
            return Ok(SecretString::from(token));
        }

        let path = self.app_token_file.as_ref().ok_or_else(|| {
            AppError::Config(format!(
                "no app token: set {} or {}",
                env_vars::APP_TOKEN,
                env_vars::APP_TOKEN_FILE
            ))
        })?;
        tracing::debug!("Reading app token from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        parse_app_token(&contents)
    }

    /// Absolute URL of an API path relative to the base URL
    pub fn endpoint_url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

#[derive(Deserialize)]
struct TokenFile {
    app_token: String,
}

/// Parses a token file holding either the raw token or `{"app_token": "..."}`
pub(crate) fn parse_app_token(contents: &str) -> Result<SecretString> {
    let trimmed = contents.trim();
    let token = if trimmed.starts_with('{') {
        serde_json::from_str::<TokenFile>(trimmed)?.app_token
    } else {
        trimmed.to_string()
    };
    if token.is_empty() {
        return Err(AppError::Config("app token is empty".to_string()));
    }
    Ok(SecretString::from(token))
}

/// Joins an API path onto a base URL ending with `/`
pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url, path.trim_start_matches('/'))
}

/// Ensures the base URL ends with `/` so API paths can be appended
pub(crate) fn normalize_base_url(url: &str) -> String {
    let url = url.trim();
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

fn parse_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses a duration such as `5s`, `1m30s` or `300ms`; zero and invalid values fall back
fn duration_or_default(name: &str, raw: Option<&str>, default: Duration) -> Duration {
    let Some(value) = raw else {
        return default;
    };
    match humantime::parse_duration(value.trim()) {
        Ok(duration) if !duration.is_zero() => duration,
        Ok(_) => {
            tracing::warn!("Zero duration for {}, using {:?}", name, default);
            default
        }
        Err(e) => {
            tracing::warn!(
                "Invalid duration '{}' for {}: {}, using {:?}",
                value,
                name,
                e,
                default
            );
            default
        }
    }
}
