// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Freebox API client
//!
//! - [`transport`]: HTTPS JSON transport with pinned roots
//! - [`identity`]: application identity sent at registration and login
//! - [`session`]: authenticated session with refresh, retry and backoff

mod auth;
pub mod backoff;
pub mod identity;
pub mod session;
pub mod transport;
pub mod types;

pub use auth::derive_password;
pub use backoff::RetryState;
pub use identity::{APP_ID, ApplicationIdentity};
pub use session::{AUTH_HEADER, REFRESH_DEBOUNCE, Session, SessionStats};
pub use transport::{HttpTransport, RequestDecorator, Transport, certs};
pub use types::SessionInfo;
