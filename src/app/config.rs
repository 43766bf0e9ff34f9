// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::data_path::resolve_data_dir;
use crate::domain::constants;
use crate::domain::error::SniperError;
use alloy::primitives::{Address, U256};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_chain")]
    pub chain_id: u64,
    pub http_provider: String,

    // Identity
    pub wallet_key: String,
    pub wallet_address: Address,
    /// End-user wallet the minted token is forwarded to. Defaults to the
    /// bot wallet itself (no forwarding needed).
    pub recipient_address: Option<Address>,

    // Protocol fee
    pub fee_recipient: Option<Address>,
    #[serde(default = "default_fee_bps")]
    pub fee_bps: u64,
    pub fee_min_wei: Option<u128>,
    pub fee_max_wei: Option<u128>,

    // Sniping
    #[serde(default = "default_gas_ceiling")]
    pub gas_ceiling_percentage: u16,
    pub expected_mint_price_wei: Option<u128>,
    #[serde(default = "default_deploy_poll")]
    pub deploy_poll_secs: u64,

    // RPC throttling
    #[serde(default = "default_rpc_spacing")]
    pub rpc_min_spacing_ms: u64,
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout_ms: u64,

    // Marketplace metadata (best-effort, never authoritative)
    pub metadata_api_url: Option<String>,
    pub metadata_api_key: Option<String>,

    pub data_dir: Option<String>,
}

fn default_chain() -> u64 {
    constants::CHAIN_ETHEREUM
}
fn default_fee_bps() -> u64 {
    constants::DEFAULT_FEE_BPS
}
fn default_gas_ceiling() -> u16 {
    100
}
fn default_deploy_poll() -> u64 {
    constants::DEFAULT_DEPLOY_POLL_SECS
}
fn default_rpc_spacing() -> u64 {
    constants::DEFAULT_RPC_MIN_SPACING_MS
}
fn default_rpc_timeout() -> u64 {
    constants::DEFAULT_RPC_TIMEOUT_MS
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, SniperError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Precedence: CLI (in main) > env/.env > config file.
        builder = builder.add_source(Environment::with_prefix("MINTWORX"));

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;

        if settings.wallet_key.is_empty() {
            return Err(SniperError::Config("MINTWORX_WALLET_KEY is missing".to_string()));
        }
        if settings.http_provider.is_empty() {
            return Err(SniperError::Config("http_provider is missing".to_string()));
        }

        Ok(settings)
    }

    pub fn load() -> Result<Self, SniperError> {
        Self::load_with_path(None)
    }

    pub fn recipient(&self) -> Address {
        self.recipient_address.unwrap_or(self.wallet_address)
    }

    pub fn fee_min(&self) -> U256 {
        self.fee_min_wei
            .map(U256::from)
            .unwrap_or(*constants::DEFAULT_MIN_FEE_WEI)
    }

    pub fn fee_max(&self) -> U256 {
        self.fee_max_wei
            .map(U256::from)
            .unwrap_or(*constants::DEFAULT_MAX_FEE_WEI)
    }

    /// Deployment poll interval clamped to the supported window.
    pub fn deploy_poll_interval(&self) -> std::time::Duration {
        let secs = self
            .deploy_poll_secs
            .clamp(constants::MIN_DEPLOY_POLL_SECS, constants::MAX_DEPLOY_POLL_SECS);
        std::time::Duration::from_secs(secs)
    }

    pub fn data_path(&self) -> PathBuf {
        resolve_data_dir(self.data_dir.as_deref())
    }
}
