// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::{RECEIPT_POLL_MS, RECEIPT_TIMEOUT_MS};
use crate::domain::error::SniperError;
use crate::infrastructure::network::fees::{FeeData, FeeOracle};
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, B256, Bytes};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::RpcError;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

pub struct ConnectionFactory;

impl ConnectionFactory {
    /// Read-only HTTP provider.
    pub fn http(rpc_url: &str) -> Result<DynProvider, SniperError> {
        let url = Url::parse(rpc_url)
            .map_err(|e| SniperError::Config(format!("Invalid RPC URL: {}", e)))?;
        Ok(ProviderBuilder::new().connect_http(url).erased())
    }

    /// HTTP provider with a wallet filler so `send_transaction` signs locally.
    pub fn http_with_wallet(
        rpc_url: &str,
        signer: PrivateKeySigner,
    ) -> Result<DynProvider, SniperError> {
        let url = Url::parse(rpc_url)
            .map_err(|e| SniperError::Config(format!("Invalid RPC URL: {}", e)))?;
        let wallet = EthereumWallet::from(signer);
        Ok(ProviderBuilder::new().wallet(wallet).connect_http(url).erased())
    }
}

/// A mined-transaction receipt reduced to what the sniper needs. Kept small so
/// test doubles can construct it directly.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub success: bool,
    pub logs: Vec<ReceiptLog>,
}

#[derive(Debug, Clone)]
pub struct ReceiptLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// The chain capability consumed by the sniper core. The signer behind
/// `send_transaction` is owned by the client, never by callers.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_code(&self, address: Address) -> Result<Bytes, SniperError>;
    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes, SniperError>;
    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, SniperError>;
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, SniperError>;
    async fn wait_for_receipt(&self, hash: B256) -> Result<TxReceipt, SniperError>;
    async fn get_fee_data(&self) -> Result<FeeData, SniperError>;
    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, SniperError>;
    async fn get_block_number(&self) -> Result<u64, SniperError>;
    async fn get_transaction_count(&self, address: Address) -> Result<u64, SniperError>;
}

/// Production `ChainClient` backed by an alloy provider.
pub struct RpcChainClient {
    provider: DynProvider,
    fee_oracle: FeeOracle,
}

impl RpcChainClient {
    pub fn new(provider: DynProvider, chain_id: u64) -> Self {
        let fee_oracle = FeeOracle::new(provider.clone(), chain_id);
        Self {
            provider,
            fee_oracle,
        }
    }
}

/// Distinguish an execution revert (the node evaluated the call and rejected
/// it) from a transport failure. Callers treat the former as "inaccessible"
/// and the latter as a retryable connection problem.
fn classify(method: &'static str, e: alloy::transports::TransportError) -> SniperError {
    match e {
        // -32005 is the de-facto "request rate exceeded" code (Infura et al).
        RpcError::ErrorResp(payload) if payload.code == -32005 => {
            SniperError::RateLimited(format!("{method}: {payload}"))
        }
        RpcError::ErrorResp(payload) => SniperError::TransactionReverted(payload.to_string()),
        other => SniperError::Connection(format!("{method} failed: {other}")),
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn get_code(&self, address: Address) -> Result<Bytes, SniperError> {
        self.provider
            .get_code_at(address)
            .await
            .map_err(|e| SniperError::Connection(format!("getCode failed: {e}")))
    }

    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes, SniperError> {
        self.provider
            .call(tx.clone())
            .await
            .map_err(|e| classify("call", e))
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, SniperError> {
        self.provider
            .estimate_gas(tx.clone())
            .await
            .map_err(|e| classify("estimateGas", e))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, SniperError> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| SniperError::Connection(format!("sendTransaction failed: {e}")))?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TxReceipt, SniperError> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(RECEIPT_TIMEOUT_MS);
        loop {
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    let logs = receipt
                        .inner
                        .logs()
                        .iter()
                        .map(|log| ReceiptLog {
                            address: log.address(),
                            topics: log.topics().to_vec(),
                            data: log.data().data.clone(),
                        })
                        .collect();
                    return Ok(TxReceipt {
                        tx_hash: hash,
                        success: receipt.status(),
                        logs,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(target: "rpc", error = %e, "Receipt poll failed, retrying");
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(SniperError::Timeout {
                    method: "waitForReceipt",
                    elapsed_ms: RECEIPT_TIMEOUT_MS,
                });
            }
            tokio::time::sleep(Duration::from_millis(RECEIPT_POLL_MS)).await;
        }
    }

    async fn get_fee_data(&self) -> Result<FeeData, SniperError> {
        self.fee_oracle.estimate().await
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, SniperError> {
        self.provider
            .get_logs(filter)
            .await
            .map_err(|e| SniperError::Connection(format!("getLogs failed: {e}")))
    }

    async fn get_block_number(&self) -> Result<u64, SniperError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| SniperError::Connection(format!("blockNumber failed: {e}")))
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64, SniperError> {
        self.provider
            .get_transaction_count(address)
            .await
            .map_err(|e| SniperError::Connection(format!("getTransactionCount failed: {e}")))
    }
}
