// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::{RPC_COOLDOWN_MULTIPLIER, RPC_ERRORS_BEFORE_COOLDOWN};
use crate::domain::error::SniperError;
use crate::infrastructure::network::fees::FeeData;
use crate::infrastructure::network::provider::{ChainClient, TxReceipt};
use alloy::primitives::{Address, B256, Bytes};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use async_trait::async_trait;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout};

#[derive(Default)]
struct MethodState {
    next_allowed: Option<Instant>,
    consecutive_errors: u32,
}

/// Rate-limiting decorator over a raw `ChainClient`. Read methods get minimum
/// inter-call spacing (delayed, never dropped), every call gets a timeout, and
/// a method that keeps failing enters an extended cooldown. Transaction
/// submission and receipt waiting are passed through with a timeout only;
/// delaying a mint submission would defeat the point.
pub struct ThrottledChainClient {
    inner: Arc<dyn ChainClient>,
    min_spacing: Duration,
    call_timeout: Duration,
    methods: DashMap<&'static str, MethodState>,
}

impl ThrottledChainClient {
    pub fn new(inner: Arc<dyn ChainClient>, min_spacing: Duration, call_timeout: Duration) -> Self {
        Self {
            inner,
            min_spacing,
            call_timeout,
            methods: DashMap::new(),
        }
    }

    /// Reserve the next slot for `method`, serializing callers per method.
    async fn gate(&self, method: &'static str) {
        let wait = {
            let mut entry = self.methods.entry(method).or_default();
            let now = Instant::now();
            let spacing = if entry.consecutive_errors > RPC_ERRORS_BEFORE_COOLDOWN {
                self.min_spacing * RPC_COOLDOWN_MULTIPLIER
            } else {
                self.min_spacing
            };
            let start = match entry.next_allowed {
                Some(at) if at > now => at,
                _ => now,
            };
            entry.next_allowed = Some(start + spacing);
            start.saturating_duration_since(now)
        };
        if !wait.is_zero() {
            tracing::trace!(target: "throttle", method, wait_ms = wait.as_millis() as u64, "Delaying call");
            sleep(wait).await;
        }
    }

    fn record(&self, method: &'static str, ok: bool) {
        let mut entry = self.methods.entry(method).or_default();
        if ok {
            entry.consecutive_errors = entry.consecutive_errors.saturating_sub(1);
        } else {
            entry.consecutive_errors += 1;
            if entry.consecutive_errors > RPC_ERRORS_BEFORE_COOLDOWN {
                tracing::warn!(
                    target: "throttle",
                    method,
                    errors = entry.consecutive_errors,
                    "Method degraded, extended cooldown active"
                );
            }
        }
    }

    async fn spaced<T, F>(&self, method: &'static str, fut: F) -> Result<T, SniperError>
    where
        F: Future<Output = Result<T, SniperError>>,
    {
        self.gate(method).await;
        self.timed(method, fut).await
    }

    async fn timed<T, F>(&self, method: &'static str, fut: F) -> Result<T, SniperError>
    where
        F: Future<Output = Result<T, SniperError>>,
    {
        match timeout(self.call_timeout, fut).await {
            Ok(res) => {
                self.record(method, res.is_ok());
                res
            }
            Err(_) => {
                self.record(method, false);
                Err(SniperError::Timeout {
                    method,
                    elapsed_ms: self.call_timeout.as_millis() as u64,
                })
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn consecutive_errors(&self, method: &'static str) -> u32 {
        self.methods
            .get(method)
            .map(|e| e.consecutive_errors)
            .unwrap_or(0)
    }
}

#[async_trait]
impl ChainClient for ThrottledChainClient {
    async fn get_code(&self, address: Address) -> Result<Bytes, SniperError> {
        self.spaced("getCode", self.inner.get_code(address)).await
    }

    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes, SniperError> {
        self.spaced("call", self.inner.call(tx)).await
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, SniperError> {
        // Timeout only: probes fire several estimates per cycle and spacing
        // them two seconds apart would starve the watch cadence.
        self.timed("estimateGas", self.inner.estimate_gas(tx)).await
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, SniperError> {
        self.timed("sendTransaction", self.inner.send_transaction(tx))
            .await
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TxReceipt, SniperError> {
        // The inner client owns the receipt poll/timeout loop.
        self.inner.wait_for_receipt(hash).await
    }

    async fn get_fee_data(&self) -> Result<FeeData, SniperError> {
        self.spaced("getFeeData", self.inner.get_fee_data()).await
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, SniperError> {
        self.spaced("getLogs", self.inner.get_logs(filter)).await
    }

    async fn get_block_number(&self) -> Result<u64, SniperError> {
        self.spaced("blockNumber", self.inner.get_block_number())
            .await
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64, SniperError> {
        self.spaced(
            "getTransactionCount",
            self.inner.get_transaction_count(address),
        )
        .await
    }
}
