// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentStatus {
    NotDeployed,
    Deployed,
    Unknown,
    Error,
}

/// A candidate NFT contract being watched. Deployment state is not stored
/// here: the `DeploymentMonitor` is its single source of truth.
#[derive(Debug, Clone)]
pub struct Target {
    pub address: Address,
    pub display_name: String,
    /// Best-known mint price; may be a marketplace guess.
    pub expected_mint_price_wei: U256,
    pub expected_launch_time: Option<u64>,
}

impl Target {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            display_name: format!("{address:#x}"),
            expected_mint_price_wei: U256::ZERO,
            expected_launch_time: None,
        }
    }
}

/// Argument layout of a guessed mint entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterShape {
    None,
    Quantity,
    RecipientQuantity,
}

/// One guessed callable entry point on a target, re-derived each probe cycle.
#[derive(Debug, Clone)]
pub struct MintCandidate {
    pub function_name: &'static str,
    pub parameter_shape: ParameterShape,
    pub payable: bool,
    pub selector: [u8; 4],
    pub detected_in_bytecode: bool,
    pub is_currently_accessible: bool,
}

/// Outcome of one probe cycle against a target.
#[derive(Debug, Clone)]
pub enum ProbeResult {
    /// `getCode` returned empty bytecode.
    NotDeployed,
    /// Transient RPC failure; retry rather than treat as "not live".
    Unknown,
    Deployed { candidates: Vec<MintCandidate> },
}

impl ProbeResult {
    /// First accessible candidate in catalog order, if any.
    pub fn first_accessible(&self) -> Option<&MintCandidate> {
        match self {
            ProbeResult::Deployed { candidates } => {
                candidates.iter().find(|c| c.is_currently_accessible)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Watching,
    Minting,
    Success,
    Failed,
}

/// The unit of persisted watcher state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnipeSession {
    pub contract_address: Address,
    pub wallet_address: Address,
    pub network: u64,
    pub status: SessionStatus,
    pub started_at: u64,
    pub updated_at: u64,
    pub last_error: Option<String>,
}

impl SnipeSession {
    pub fn new(contract_address: Address, wallet_address: Address, network: u64) -> Self {
        let now = unix_now();
        Self {
            contract_address,
            wallet_address,
            network,
            status: SessionStatus::Watching,
            started_at: now,
            updated_at: now,
            last_error: None,
        }
    }

    pub fn touch(&mut self, status: SessionStatus) {
        self.status = status;
        self.updated_at = unix_now();
    }
}

/// Ephemeral per-attempt gas bound. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasQuote {
    pub base_fee_wei: U256,
    pub ceiling_percentage: u16,
    pub effective_max_fee_wei: U256,
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
