// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::CIRCUIT_BREAKER_MAX_FAILURES;
use crate::domain::error::SniperError;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Orchestrator-level circuit breaker. Trips on the Nth consecutive failure
/// and stays open until an explicit re-arm; there is no timed auto-reset, the
/// user has to restart the session deliberately.
pub struct CircuitBreaker {
    consecutive_failures: AtomicUsize,
    max_failures: usize,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CIRCUIT_BREAKER_MAX_FAILURES)
    }
}

impl CircuitBreaker {
    pub fn new(max_failures: usize) -> Self {
        Self {
            consecutive_failures: AtomicUsize::new(0),
            max_failures,
        }
    }

    pub fn check(&self) -> Result<(), SniperError> {
        let failures = self.consecutive_failures.load(Ordering::Relaxed);
        if failures >= self.max_failures {
            return Err(SniperError::CircuitOpen { failures });
        }
        Ok(())
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    /// Returns true when this failure is the one that trips the breaker.
    pub fn record_failure(&self) -> bool {
        let count = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if count == self.max_failures {
            tracing::error!(target: "watcher", failures = count, "Circuit breaker tripped");
            return true;
        }
        false
    }

    pub fn reset(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        tracing::info!(target: "watcher", "Circuit breaker re-armed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifth_failure_trips_not_fourth() {
        let breaker = CircuitBreaker::default();
        for _ in 0..4 {
            assert!(!breaker.record_failure());
            assert!(breaker.check().is_ok());
        }
        assert!(breaker.record_failure());
        assert!(matches!(
            breaker.check(),
            Err(SniperError::CircuitOpen { failures: 5 })
        ));
    }

    #[test]
    fn success_resets_the_run() {
        let breaker = CircuitBreaker::default();
        for _ in 0..4 {
            breaker.record_failure();
        }
        breaker.record_success();
        for _ in 0..4 {
            assert!(!breaker.record_failure());
        }
        assert!(breaker.check().is_ok());
    }

    #[test]
    fn only_explicit_reset_clears_open_state() {
        let breaker = CircuitBreaker::default();
        for _ in 0..5 {
            breaker.record_failure();
        }
        assert!(breaker.check().is_err());
        breaker.reset();
        assert!(breaker.check().is_ok());
    }
}
