// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Metrics registry for Freebox Exporter
//!
//! Holds the scrape bookkeeping series per polled API endpoint and the
//! session health gauges.

mod labels;
mod registry;


/// Labels for polled API endpoints
pub use labels::EndpointLabels;

/// Prometheus metrics registry
pub use registry::MetricsRegistry;
