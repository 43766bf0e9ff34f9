// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>
#![allow(dead_code)]

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use async_trait::async_trait;
use mintworx::domain::error::SniperError;
use mintworx::infrastructure::network::fees::FeeData;
use mintworx::infrastructure::network::provider::{ChainClient, ReceiptLog, TxReceipt};
use mintworx::services::sniper::watcher::NotificationSink;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Notify;

pub const GWEI: u128 = 1_000_000_000;

/// Scriptable in-memory `ChainClient`. Deployed bytecode, accessible
/// selectors, receipt logs and failure modes are all settable mid-test.
pub struct MockChainClient {
    code: Mutex<Bytes>,
    fail_get_code: AtomicBool,
    hang_get_code: AtomicBool,
    /// Selectors whose trial gas estimation succeeds; everything else reverts.
    accessible: Mutex<Vec<[u8; 4]>>,
    fail_estimate_transport: AtomicBool,
    owner_of: Mutex<Address>,
    receipt_logs: Mutex<Vec<ReceiptLog>>,
    receipt_success: AtomicBool,
    tx_count: AtomicU64,
    /// Transactions are recorded, then the send never resolves.
    hang_send: AtomicBool,

    pub sent: Mutex<Vec<TransactionRequest>>,
    pub get_code_calls: AtomicUsize,
    pub estimate_calls: AtomicUsize,
    pub transaction_count_calls: AtomicUsize,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self {
            code: Mutex::new(Bytes::new()),
            fail_get_code: AtomicBool::new(false),
            hang_get_code: AtomicBool::new(false),
            accessible: Mutex::new(Vec::new()),
            fail_estimate_transport: AtomicBool::new(false),
            owner_of: Mutex::new(Address::ZERO),
            receipt_logs: Mutex::new(Vec::new()),
            receipt_success: AtomicBool::new(true),
            tx_count: AtomicU64::new(0),
            hang_send: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            get_code_calls: AtomicUsize::new(0),
            estimate_calls: AtomicUsize::new(0),
            transaction_count_calls: AtomicUsize::new(0),
        }
    }
}

impl MockChainClient {
    pub fn set_code(&self, code: impl Into<Bytes>) {
        *self.code.lock().unwrap() = code.into();
    }

    pub fn set_get_code_failing(&self, failing: bool) {
        self.fail_get_code.store(failing, Ordering::SeqCst);
    }

    pub fn set_get_code_hanging(&self, hanging: bool) {
        self.hang_get_code.store(hanging, Ordering::SeqCst);
    }

    pub fn set_accessible(&self, selectors: &[[u8; 4]]) {
        *self.accessible.lock().unwrap() = selectors.to_vec();
    }

    pub fn set_estimate_transport_failing(&self, failing: bool) {
        self.fail_estimate_transport.store(failing, Ordering::SeqCst);
    }

    pub fn set_owner_of(&self, owner: Address) {
        *self.owner_of.lock().unwrap() = owner;
    }

    pub fn set_transaction_count(&self, count: u64) {
        self.tx_count.store(count, Ordering::SeqCst);
    }

    pub fn set_send_hanging(&self, hanging: bool) {
        self.hang_send.store(hanging, Ordering::SeqCst);
    }

    pub fn set_receipt_success(&self, success: bool) {
        self.receipt_success.store(success, Ordering::SeqCst);
    }

    pub fn set_receipt_logs(&self, logs: Vec<ReceiptLog>) {
        *self.receipt_logs.lock().unwrap() = logs;
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn get_code(&self, _address: Address) -> Result<Bytes, SniperError> {
        if self.hang_get_code.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.get_code_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get_code.load(Ordering::SeqCst) {
            return Err(SniperError::Connection("getCode failed: mock outage".into()));
        }
        Ok(self.code.lock().unwrap().clone())
    }

    async fn call(&self, _tx: &TransactionRequest) -> Result<Bytes, SniperError> {
        // Answers as `ownerOf`: a single ABI-encoded address word.
        let owner = *self.owner_of.lock().unwrap();
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(owner.as_slice());
        Ok(Bytes::from(word.to_vec()))
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, SniperError> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_estimate_transport.load(Ordering::SeqCst) {
            return Err(SniperError::Connection(
                "estimateGas failed: mock outage".into(),
            ));
        }
        let input = tx.input.input().cloned().unwrap_or_default();
        let accessible = self.accessible.lock().unwrap();
        let open = input.len() >= 4 && accessible.iter().any(|s| s[..] == input[..4]);
        if open {
            Ok(80_000)
        } else {
            Err(SniperError::TransactionReverted("execution reverted".into()))
        }
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, SniperError> {
        let hash = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(tx);
            B256::from(U256::from(sent.len()))
        };
        if self.hang_send.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TxReceipt, SniperError> {
        Ok(TxReceipt {
            tx_hash: hash,
            success: self.receipt_success.load(Ordering::SeqCst),
            logs: self.receipt_logs.lock().unwrap().clone(),
        })
    }

    async fn get_fee_data(&self) -> Result<FeeData, SniperError> {
        Ok(FeeData {
            base_fee_per_gas: 100 * GWEI,
            max_priority_fee_per_gas: 2 * GWEI,
            legacy_gas_price: None,
        })
    }

    async fn get_logs(&self, _filter: &Filter) -> Result<Vec<Log>, SniperError> {
        Ok(Vec::new())
    }

    async fn get_block_number(&self) -> Result<u64, SniperError> {
        Ok(1)
    }

    async fn get_transaction_count(&self, _address: Address) -> Result<u64, SniperError> {
        self.transaction_count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tx_count.load(Ordering::SeqCst))
    }
}

/// Sink that records every signal and wakes waiters on a terminal one.
#[derive(Default)]
pub struct RecordingSink {
    pub watching: AtomicUsize,
    pub successes: Mutex<Vec<Option<U256>>>,
    pub errors: Mutex<Vec<String>>,
    terminal: Notify,
}

impl RecordingSink {
    pub async fn wait_terminal(&self) {
        self.terminal.notified().await;
    }
}

impl NotificationSink for RecordingSink {
    fn on_watching(&self) {
        self.watching.fetch_add(1, Ordering::SeqCst);
    }

    fn on_success(&self, token_id: Option<U256>) {
        self.successes.lock().unwrap().push(token_id);
        self.terminal.notify_one();
    }

    fn on_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
        self.terminal.notify_one();
    }
}
