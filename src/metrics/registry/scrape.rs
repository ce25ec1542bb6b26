// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Scrape and session bookkeeping helpers

use crate::error::{AppError, Result};
use crate::freebox::SessionStats;
use crate::metrics::labels::EndpointLabels;
use prometheus_client::encoding::text::encode;

use super::MetricsRegistry;

impl MetricsRegistry {
    pub async fn encode_metrics(&self) -> Result<String> {
        let registry = self.registry.lock().await;
        let mut buffer = String::new();
        encode(&mut buffer, &registry).map_err(|e| AppError::Metrics(e.to_string()))?;
        Ok(buffer)
    }

    pub fn record_scrape_success(&self, labels: &EndpointLabels) {
        self.scrape_success.get_or_create(labels).inc();
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        #[allow(clippy::cast_possible_wrap)]
        self.scrape_last_success_timestamp_seconds
            .get_or_create(labels)
            .set(now as i64);
    }

    pub fn record_scrape_error(&self, labels: &EndpointLabels) {
        self.scrape_errors.get_or_create(labels).inc();
    }

    /// Initialize metrics for an endpoint to zero
    ///
    /// Lets Prometheus compute rates before the first success or error.
    pub fn initialize_endpoint_metrics(&self, labels: &EndpointLabels) {
        let _ = self.scrape_success.get_or_create(labels);
        let _ = self.scrape_errors.get_or_create(labels);
        let _ = self.scrape_duration_milliseconds.get_or_create(labels);
    }

    pub fn record_scrape_duration(&self, labels: &EndpointLabels, duration_secs: f64) {
        #[allow(clippy::cast_possible_truncation)]
        let millis = (duration_secs * 1000.0).round() as i64;
        self.scrape_duration_milliseconds
            .get_or_create(labels)
            .set(millis);
    }

    pub fn record_collection_cycle_duration(&self, duration_secs: f64) {
        #[allow(clippy::cast_possible_truncation)]
        let millis = (duration_secs * 1000.0).round() as i64;
        self.collection_cycle_duration_milliseconds.set(millis);
    }

    /// Mirrors the session counters into the session gauges
    pub fn update_session_stats(&self, stats: &SessionStats) {
        #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
        {
            self.session_logins.set(stats.logins as i64);
            self.session_login_failures.set(stats.login_failures as i64);
            self.session_backoff_delay_milliseconds
                .set(stats.current_delay.as_millis() as i64);
        }
        self.session_consecutive_failures
            .set(i64::from(stats.consecutive_failures));
    }

    /// Get scrape success count for an endpoint
    pub fn get_scrape_success_count(&self, labels: &EndpointLabels) -> u64 {
        self.scrape_success.get_or_create(labels).get()
    }

    /// Get scrape error count for an endpoint
    pub fn get_scrape_error_count(&self, labels: &EndpointLabels) -> u64 {
        self.scrape_errors.get_or_create(labels).get()
    }
}
