// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Per-endpoint collection task

use std::sync::Arc;

use serde_json::Value;

use crate::freebox::Session;
use crate::metrics::{EndpointLabels, MetricsRegistry};

/// Polls one API endpoint; resolves to `true` on success
pub(super) fn spawn_endpoint_collection(
    endpoint: String,
    url: String,
    session: Arc<Session>,
    metrics: MetricsRegistry,
) -> tokio::task::JoinHandle<bool> {
    tokio::spawn(async move {
        let label = EndpointLabels::new(endpoint.clone());

        tracing::trace!("Polling endpoint {} ({})", endpoint, url);
        let start = std::time::Instant::now();
        match session.get::<Value>(&url).await {
            Ok(result) => {
                let duration = start.elapsed().as_secs_f64();
                metrics.record_scrape_success(&label);
                metrics.record_scrape_duration(&label, duration);

                tracing::debug!("Polled endpoint {} in {:.3}s", endpoint, duration);
                tracing::trace!(
                    "Endpoint {} returned {} top-level fields",
                    endpoint,
                    result.as_object().map_or(0, serde_json::Map::len)
                );
                true
            }
            Err(e) => {
                let duration = start.elapsed().as_secs_f64();
                metrics.record_scrape_error(&label);
                metrics.record_scrape_duration(&label, duration);

                tracing::warn!(
                    "Failed to poll endpoint {} in {:.3}s: {}",
                    endpoint,
                    duration,
                    e
                );
                tracing::trace!("Error details for {}: {:?}", endpoint, e);
                false
            }
        }
    })
}
