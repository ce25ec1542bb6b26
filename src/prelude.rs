// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Prelude module for convenient imports
//!
//! ```rust
//! use freebox_exporter::prelude::*;
//! ```

// Core types
pub use crate::config::{Config, IdentityOverrides, RetryConfig, TransportOptions};
pub use crate::error::{AppError, Result};

// Metrics types
pub use crate::metrics::{EndpointLabels, MetricsRegistry};

// Freebox client
pub use crate::freebox::{
    AUTH_HEADER, ApplicationIdentity, HttpTransport, RequestDecorator, Session, SessionInfo,
    SessionStats, Transport, derive_password,
};
