// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Authenticated Freebox session
//!
//! [`Session`] keeps the current session token, refreshes it when the device
//! rejects a request, and retries that request once with the new token.
//! Refreshes are serialized by a single lock and debounced, so a burst of
//! concurrent auth failures produces one login exchange.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::RetryConfig;
use crate::error::Result;

use super::auth::Authenticator;
use super::backoff::RetryState;
use super::identity::ApplicationIdentity;
use super::transport::{RequestDecorator, Transport};
use super::types::SessionInfo;


/// Header carrying the session token (`X-Fbx-App-Auth`)
pub const AUTH_HEADER: HeaderName = HeaderName::from_static("x-fbx-app-auth");

/// Minimum time between two real login exchanges
pub const REFRESH_DEBOUNCE: Duration = Duration::from_secs(5);

/// Current session and the one it replaced
///
/// Swapped as a unit so readers never see a half-updated pair.
#[derive(Default)]
struct SessionSlots {
    current: Option<Arc<SessionInfo>>,
    previous: Option<Arc<SessionInfo>>,
}

/// State owned by the refresh lock
struct RefreshState {
    last_refresh: Option<Instant>,
    retry: RetryState,
}

/// Point-in-time view of the session for metrics and health
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub logins: u64,
    pub login_failures: u64,
    pub consecutive_failures: u32,
    pub current_delay: Duration,
}

enum Call<'a> {
    Get(&'a str),
    Post(&'a str, &'a Value),
}

impl Call<'_> {
    fn url(&self) -> &str {
        match self {
            Call::Get(url) | Call::Post(url, _) => url,
        }
    }
}

/// Authenticated client for the Freebox API
pub struct Session {
    transport: Arc<dyn Transport>,
    auth: Authenticator,
    slots: RwLock<SessionSlots>,
    state: Mutex<RefreshState>,
    logins: AtomicU64,
    login_failures: AtomicU64,
    // Mirrors of the retry state, readable without the refresh lock
    consecutive_failures: AtomicU32,
    current_delay_ms: AtomicU64,
}

impl Session {
    /// Creates a session and performs the first login
    ///
    /// `base_url` is the API root, with or without a trailing `/`.
    ///
    /// # Errors
    ///
    /// Returns the login error if the first login fails.
    pub async fn new(
        transport: Arc<dyn Transport>,
        identity: Arc<ApplicationIdentity>,
        app_token: SecretString,
        base_url: &str,
        retry: &RetryConfig,
    ) -> Result<Self> {
        let auth = Authenticator::new(transport.clone(), identity, app_token, base_url);
        let session = Self {
            transport,
            auth,
            slots: RwLock::new(SessionSlots::default()),
            state: Mutex::new(RefreshState {
                last_refresh: None,
                retry: RetryState::new(retry),
            }),
            logins: AtomicU64::new(0),
            login_failures: AtomicU64::new(0),
            consecutive_failures: AtomicU32::new(0),
            current_delay_ms: AtomicU64::new(duration_millis(retry.min_delay)),
        };
        session.refresh().await?;
        tracing::info!("Freebox session opened");
        Ok(session)
    }

    /// GET `url` and decode the API result
    ///
    /// # Errors
    ///
    /// Returns transport, API and decoding errors. Auth errors are returned only
    /// after one refresh and one retry.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let value = self.execute(Call::Get(url)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// POST `body` to `url` and decode the API result
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub async fn post<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let value = self.execute(Call::Post(url, &body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Logs in again unless the last successful login is under 5 seconds old
    ///
    /// # Errors
    ///
    /// Returns the error of the challenge or session token request.
    pub async fn refresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        if let Some(last) = state.last_refresh {
            let since = last.elapsed();
            if since < REFRESH_DEBOUNCE {
                tracing::debug!("Session updated {:?} ago. Skipping refresh", since);
                return Ok(());
            }
        }

        let info = match self.auth.login().await {
            Ok(info) => info,
            Err(e) => {
                self.login_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Freebox login failed: {}", e);
                return Err(e);
            }
        };

        self.commit(info);
        state.last_refresh = Some(Instant::now());
        state.retry.reset();
        self.publish_backoff(&state.retry);
        self.logins.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Session token refreshed");
        Ok(())
    }

    /// The session used for new requests
    pub fn current(&self) -> Option<Arc<SessionInfo>> {
        self.read_slots().current.clone()
    }

    /// The session replaced by the last refresh
    ///
    /// Kept only as a read-only grace slot; requests always use [`current`](Self::current).
    pub fn previous(&self) -> Option<Arc<SessionInfo>> {
        self.read_slots().previous.clone()
    }

    /// Counters and backoff state, readable while a refresh is in flight
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            logins: self.logins.load(Ordering::Relaxed),
            login_failures: self.login_failures.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            current_delay: Duration::from_millis(self.current_delay_ms.load(Ordering::Relaxed)),
        }
    }

    async fn execute(&self, call: Call<'_>) -> Result<Value> {
        match self.send(&call).await {
            Err(e) if e.is_auth_error() => {
                tracing::debug!("{} rejected ({}), refreshing session", call.url(), e);
                self.wait_for_backoff().await;

                if let Err(refresh_err) = self.refresh().await {
                    let mut state = self.state.lock().await;
                    state.retry.record_failure();
                    self.publish_backoff(&state.retry);
                    return Err(refresh_err);
                }
                {
                    let mut state = self.state.lock().await;
                    state.retry.reset();
                    self.publish_backoff(&state.retry);
                }

                // Single retry: a second auth failure goes back to the caller
                self.send(&call).await
            }
            other => other,
        }
    }

    async fn send(&self, call: &Call<'_>) -> Result<Value> {
        let session_header = |headers: &mut HeaderMap| self.attach_session_header(headers);
        let decorators: [&RequestDecorator<'_>; 1] = [&session_header];
        match call {
            Call::Get(url) => self.transport.get(url, &decorators).await,
            Call::Post(url, body) => self.transport.post(url, body, &decorators).await,
        }
    }

    async fn wait_for_backoff(&self) {
        let (delay, failures) = {
            let state = self.state.lock().await;
            if !state.retry.should_wait_before_retry() {
                return;
            }
            (state.retry.current_delay(), state.retry.failure_count())
        };
        tracing::warn!(
            "Login failure backoff: waiting {:?} before retry (failure count: {})",
            delay,
            failures
        );
        tokio::time::sleep(delay).await;
    }

    /// Called with the refresh lock held after every change to `retry`
    fn publish_backoff(&self, retry: &RetryState) {
        self.consecutive_failures
            .store(retry.failure_count(), Ordering::Relaxed);
        self.current_delay_ms
            .store(duration_millis(retry.current_delay()), Ordering::Relaxed);
    }

    fn attach_session_header(&self, headers: &mut HeaderMap) {
        let Some(info) = self.current() else {
            return;
        };
        match HeaderValue::from_str(&info.session_token) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTH_HEADER, value);
            }
            Err(e) => tracing::warn!("Session token is not a valid header value: {}", e),
        }
    }

    fn commit(&self, info: SessionInfo) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let previous = slots.current.take();
        *slots = SessionSlots {
            current: Some(Arc::new(info)),
            previous,
        };
    }

    fn read_slots(&self) -> std::sync::RwLockReadGuard<'_, SessionSlots> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
