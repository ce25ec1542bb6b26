// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Metrics registry and update logic

mod init;
mod scrape;

use crate::metrics::labels::EndpointLabels;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Arc<Mutex<Registry>>,
    // scrape status counters
    scrape_success: Family<EndpointLabels, Counter>,
    scrape_errors: Family<EndpointLabels, Counter>,
    // scrape timing metrics
    scrape_duration_milliseconds: Family<EndpointLabels, Gauge>,
    scrape_last_success_timestamp_seconds: Family<EndpointLabels, Gauge>,
    collection_cycle_duration_milliseconds: Gauge,
    // session state
    session_logins: Gauge,
    session_login_failures: Gauge,
    session_consecutive_failures: Gauge,
    session_backoff_delay_milliseconds: Gauge,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
