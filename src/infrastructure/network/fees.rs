// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::retry::retry_async;
use crate::domain::constants::CHAIN_ETHEREUM;
use crate::domain::error::SniperError;
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::BlockNumberOrTag;
use alloy::rpc::types::eth::FeeHistory;
use serde::Deserialize;
use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Network fee snapshot consumed by the gas policy. `legacy_gas_price` is set
/// on chains/nodes that do not expose a base fee.
#[derive(Debug, Clone)]
pub struct FeeData {
    pub base_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub legacy_gas_price: Option<u128>,
}

impl FeeData {
    /// The market price the user's ceiling percentage is applied against.
    pub fn market_price(&self) -> u128 {
        self.legacy_gas_price.unwrap_or(self.base_fee_per_gas)
    }
}

#[derive(Clone)]
pub struct FeeOracle {
    provider: DynProvider,
    chain_id: u64,
    last_good: Arc<Mutex<Option<FeeData>>>,
}

impl FeeOracle {
    pub fn new(provider: DynProvider, chain_id: u64) -> Self {
        Self {
            provider,
            chain_id,
            last_good: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn estimate(&self) -> Result<FeeData, SniperError> {
        match self.with_retry_history().await {
            Ok(history) => {
                let fees = Self::fees_from_history(history)?;
                if let Ok(mut guard) = self.last_good.lock() {
                    *guard = Some(fees.clone());
                }
                Ok(fees)
            }
            Err(_) => {
                if let Ok(guard) = self.last_good.lock() {
                    if let Some(fees) = guard.clone() {
                        return Ok(fees);
                    }
                }
                self.fallback_estimate().await
            }
        }
    }

    async fn with_retry_history(&self) -> Result<FeeHistory, SniperError> {
        let provider = self.provider.clone();
        retry_async(
            move |_| {
                let provider = provider.clone();
                async move {
                    provider
                        .get_fee_history(5, BlockNumberOrTag::Latest, &[50.0f64])
                        .await
                }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| SniperError::Connection(format!("Fee history failed: {}", e)))
    }

    fn fees_from_history(history: FeeHistory) -> Result<FeeData, SniperError> {
        let latest_base_fee = history
            .latest_block_base_fee()
            .or_else(|| history.base_fee_per_gas.iter().rev().nth(1).copied())
            .ok_or(SniperError::Initialization("No base fee history".into()))?;

        let raw_next_base = history.next_block_base_fee().unwrap_or(latest_base_fee);

        // Keep a 12.5% buffer as a fallback for nodes that return zeroes.
        let next_base_fee = if raw_next_base == 0 {
            (latest_base_fee.saturating_mul(1125)) / 1000
        } else {
            raw_next_base
        };

        let mut p50_sum = 0u128;
        let mut p50_count = 0u128;
        if let Some(rewards) = &history.reward {
            for block_reward in rewards {
                if let Some(r) = block_reward.first() {
                    p50_sum = p50_sum.saturating_add(*r);
                    p50_count = p50_count.saturating_add(1);
                }
            }
        }
        let avg_p50 = if p50_count > 0 {
            p50_sum / p50_count
        } else {
            2_000_000_000
        };

        Ok(FeeData {
            base_fee_per_gas: next_base_fee,
            max_priority_fee_per_gas: avg_p50,
            legacy_gas_price: None,
        })
    }

    async fn fallback_estimate(&self) -> Result<FeeData, SniperError> {
        // 1) Etherscan gas oracle if an API key is present (mainnet only)
        if self.chain_id == CHAIN_ETHEREUM {
            if let Ok(key) = env::var("ETHERSCAN_API_KEY") {
                if !key.is_empty() {
                    if let Ok(fees) = self.etherscan_gas_oracle(&key).await {
                        return Ok(fees);
                    }
                }
            }
        }

        // 2) Latest block base fee, for nodes that disable feeHistory.
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| SniperError::Connection(format!("Latest block fetch failed: {}", e)))?;

        let base = block.as_ref().and_then(|b| b.header.base_fee_per_gas);

        let priority: u128 = self
            .provider
            .get_max_priority_fee_per_gas()
            .await
            .unwrap_or(2_000_000_000u128); // 2 gwei floor

        match base {
            Some(base) => {
                let next_base = ((base as u128).saturating_mul(1125)) / 1000;
                Ok(FeeData {
                    base_fee_per_gas: next_base,
                    max_priority_fee_per_gas: priority,
                    legacy_gas_price: None,
                })
            }
            None => {
                // Pre-1559 chain: fall back to the legacy gas price.
                let gas_price = self
                    .provider
                    .get_gas_price()
                    .await
                    .map_err(|e| SniperError::Connection(format!("gasPrice failed: {}", e)))?;
                Ok(FeeData {
                    base_fee_per_gas: gas_price,
                    max_priority_fee_per_gas: 0,
                    legacy_gas_price: Some(gas_price),
                })
            }
        }
    }

    async fn etherscan_gas_oracle(&self, api_key: &str) -> Result<FeeData, SniperError> {
        let url = format!(
            "https://api.etherscan.io/v2/api?chainid=1&module=gastracker&action=gasoracle&apikey={api_key}"
        );
        let resp = reqwest::get(&url)
            .await
            .map_err(|e| SniperError::Connection(format!("Etherscan gasoracle failed: {}", e)))?;
        if !resp.status().is_success() {
            return Err(SniperError::ApiCall {
                provider: "Etherscan gasoracle".into(),
                status: resp.status().as_u16(),
            });
        }
        let parsed: EtherscanGasOracleResponse = resp.json().await.map_err(|e| {
            SniperError::Initialization(format!("Etherscan gasoracle decode failed: {e}"))
        })?;

        let result = parsed.result.ok_or_else(|| {
            SniperError::Initialization("Etherscan gasoracle missing result".into())
        })?;

        // Values are strings in gwei per docs.
        let base_gwei: f64 = result.suggest_base_fee.parse().map_err(|_| {
            SniperError::Initialization("Invalid suggestBaseFee from Etherscan".into())
        })?;
        let tip_gwei: f64 = result.propose_gas_price.parse().map_err(|_| {
            SniperError::Initialization("Invalid ProposeGasPrice from Etherscan".into())
        })?;

        Ok(FeeData {
            base_fee_per_gas: (base_gwei * 1e9_f64) as u128,
            max_priority_fee_per_gas: (tip_gwei * 1e9_f64) as u128,
            legacy_gas_price: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct EtherscanGasOracleResponse {
    result: Option<EtherscanGasOracleResult>,
}

#[derive(Debug, Deserialize)]
struct EtherscanGasOracleResult {
    #[serde(rename = "suggestBaseFee")]
    suggest_base_fee: String,
    #[serde(rename = "ProposeGasPrice")]
    propose_gas_price: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_price_prefers_legacy_when_present() {
        let eip1559 = FeeData {
            base_fee_per_gas: 100,
            max_priority_fee_per_gas: 2,
            legacy_gas_price: None,
        };
        assert_eq!(eip1559.market_price(), 100);

        let legacy = FeeData {
            base_fee_per_gas: 100,
            max_priority_fee_per_gas: 0,
            legacy_gas_price: Some(37),
        };
        assert_eq!(legacy.market_price(), 37);
    }
}
