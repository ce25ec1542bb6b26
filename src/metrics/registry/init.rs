// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Registry initialization and metric registration

use crate::metrics::labels::EndpointLabels;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::MetricsRegistry;

impl MetricsRegistry {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let scrape_success = Family::<EndpointLabels, Counter>::default();
        registry.register(
            "freebox_scrape_success",
            "Successful polls per API endpoint",
            scrape_success.clone(),
        );
        let scrape_errors = Family::<EndpointLabels, Counter>::default();
        registry.register(
            "freebox_scrape_errors",
            "Failed polls per API endpoint",
            scrape_errors.clone(),
        );
        let scrape_duration_milliseconds = Family::<EndpointLabels, Gauge>::default();
        registry.register(
            "freebox_scrape_duration_milliseconds",
            "Duration of last poll in milliseconds",
            scrape_duration_milliseconds.clone(),
        );
        let scrape_last_success_timestamp_seconds = Family::<EndpointLabels, Gauge>::default();
        registry.register(
            "freebox_scrape_last_success_timestamp_seconds",
            "Unix timestamp of last successful poll",
            scrape_last_success_timestamp_seconds.clone(),
        );
        let collection_cycle_duration_milliseconds = Gauge::default();
        registry.register(
            "freebox_collection_cycle_duration_milliseconds",
            "Duration of last full collection cycle in milliseconds",
            collection_cycle_duration_milliseconds.clone(),
        );

        let session_logins = Gauge::default();
        registry.register(
            "freebox_session_logins",
            "Successful login exchanges since start",
            session_logins.clone(),
        );
        let session_login_failures = Gauge::default();
        registry.register(
            "freebox_session_login_failures",
            "Failed login exchanges since start",
            session_login_failures.clone(),
        );
        let session_consecutive_failures = Gauge::default();
        registry.register(
            "freebox_session_consecutive_failures",
            "Consecutive failed session refreshes",
            session_consecutive_failures.clone(),
        );
        let session_backoff_delay_milliseconds = Gauge::default();
        registry.register(
            "freebox_session_backoff_delay_milliseconds",
            "Delay applied before the next session refresh after a failure",
            session_backoff_delay_milliseconds.clone(),
        );

        Self {
            registry: Arc::new(Mutex::new(registry)),
            scrape_success,
            scrape_errors,
            scrape_duration_milliseconds,
            scrape_last_success_timestamp_seconds,
            collection_cycle_duration_milliseconds,
            session_logins,
            session_login_failures,
            session_consecutive_failures,
            session_backoff_delay_milliseconds,
        }
    }
}
