// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Metrics collection orchestration
//!
//! Periodically polls the configured Freebox API endpoints through the shared
//! session and records scrape and session metrics.

mod endpoint_task;

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::freebox::Session;
use crate::metrics::{EndpointLabels, MetricsRegistry};

/// Runs one collection cycle and returns the number of endpoints polled successfully
///
/// Endpoints are polled concurrently; they share the session, so an expired
/// token is refreshed once for the whole cycle.
pub async fn collect_once(
    config: &Config,
    metrics: &MetricsRegistry,
    session: &Arc<Session>,
) -> usize {
    let cycle_start = std::time::Instant::now();

    let tasks = config.poll_endpoints.iter().map(|endpoint| {
        endpoint_task::spawn_endpoint_collection(
            endpoint.clone(),
            config.endpoint_url(endpoint),
            session.clone(),
            metrics.clone(),
        )
    });

    let mut succeeded = 0;
    for result in join_all(tasks).await {
        match result {
            Ok(true) => succeeded += 1,
            Ok(false) => {}
            Err(e) => tracing::error!("Endpoint collection task failed: {}", e),
        }
    }

    metrics.update_session_stats(&session.stats());
    metrics.record_collection_cycle_duration(cycle_start.elapsed().as_secs_f64());
    tracing::debug!(
        "Collection cycle done: {}/{} endpoints in {:.3}s",
        succeeded,
        config.poll_endpoints.len(),
        cycle_start.elapsed().as_secs_f64()
    );
    succeeded
}

/// Starts the background metrics collection loop
///
/// Spawns a task that runs [`collect_once`] every
/// `Config::collection_interval_secs` until the shutdown flag flips to `true`.
pub fn start_collection_loop(
    mut shutdown_rx: watch::Receiver<bool>,
    config: Arc<Config>,
    metrics: MetricsRegistry,
    session: Arc<Session>,
) -> JoinHandle<()> {
    let interval = config.collection_interval_secs;
    tracing::info!("Starting background collection loop every {}s", interval);

    for endpoint in &config.poll_endpoints {
        metrics.initialize_endpoint_metrics(&EndpointLabels::new(endpoint.clone()));
    }
    tracing::trace!(
        "Collection loop initialized with {} endpoints",
        config.poll_endpoints.len()
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval));
        loop {
            tokio::select! {
                _ = ticker.tick() => {},
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Stopping collection loop");
                        break;
                    }
                }
            }

            collect_once(&config, &metrics, &session).await;
        }
    })
}
