// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Login failure backoff

use std::time::Duration;
use tokio::time::Instant;

use crate::config::RetryConfig;

/// Tracks consecutive login failures and the delay before the next attempt
///
/// The delay after the k-th consecutive failure is
/// `min(min_delay * 2^(k-1), max_delay)`.
#[derive(Debug, Clone)]
pub struct RetryState {
    min_delay: Duration,
    max_delay: Duration,
    current_delay: Duration,
    failure_count: u32,
    last_failure: Option<Instant>,
}

impl RetryState {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            min_delay: config.min_delay,
            max_delay: config.max_delay,
            current_delay: config.min_delay,
            failure_count: 0,
            last_failure: None,
        }
    }

    /// True while a recent failure should delay the next refresh
    ///
    /// The window is twice the current delay, so a burst of failures all wait.
    pub fn should_wait_before_retry(&self) -> bool {
        if self.failure_count == 0 {
            return false;
        }
        self.last_failure
            .is_some_and(|last| last.elapsed() < self.current_delay.saturating_mul(2))
    }

    pub fn record_failure(&mut self) {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure = Some(Instant::now());
        if self.failure_count > 1 {
            self.current_delay = self.current_delay.saturating_mul(2).min(self.max_delay);
        }
        tracing::warn!(
            "Login failure recorded (count: {}, next delay: {:?})",
            self.failure_count,
            self.current_delay
        );
    }

    pub fn reset(&mut self) {
        if self.failure_count > 0 {
            tracing::info!(
                "Login successful, resetting retry state (was {} failures)",
                self.failure_count
            );
        }
        self.failure_count = 0;
        self.current_delay = self.min_delay;
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }
}
