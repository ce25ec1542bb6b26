// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! # Freebox Exporter
//!
//! Prometheus exporter for Freebox routers.
//!
//! This library polls the Freebox local HTTP API through an authenticated
//! session and exposes the exporter state in Prometheus format.
//!
//! ## Main modules
//! - `api`: HTTP API handlers
//! - `collector`: periodic polling of API endpoints
//! - `config`: configuration management
//! - `error`: error types
//! - `freebox`: Freebox API client (transport, login, session)
//! - `metrics`: Prometheus metrics registry
//! - `prelude`: commonly used types and traits

mod api;
mod collector;
mod config;
mod error;
pub mod freebox;
mod metrics;
pub mod prelude;

// Re-export commonly used types
/// Application configuration
pub use config::{Config, IdentityOverrides, RetryConfig, TransportOptions};

/// Application error and result type
pub use error::{AppError, Result};

/// HTTP API router and state
pub use api::{AppState, create_router};

/// Metrics collection loop
pub use collector::{collect_once, start_collection_loop};

/// Metrics registry and labels
pub use metrics::{EndpointLabels, MetricsRegistry};

/// Freebox session and transport
pub use freebox::{ApplicationIdentity, HttpTransport, Session, SessionStats, Transport};
