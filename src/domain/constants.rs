// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::U256;
use lazy_static::lazy_static;

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_ETHEREUM: u64 = 1;
pub const CHAIN_OPTIMISM: u64 = 10;
pub const CHAIN_BSC: u64 = 56;
pub const CHAIN_POLYGON: u64 = 137;
pub const CHAIN_ARBITRUM: u64 = 42161;

// =============================================================================
// WATCH / POLL CONSTANTS
// =============================================================================

/// Default deployment poll interval when the target has no bytecode yet.
pub const DEFAULT_DEPLOY_POLL_SECS: u64 = 20;
pub const MIN_DEPLOY_POLL_SECS: u64 = 15;
pub const MAX_DEPLOY_POLL_SECS: u64 = 30;

/// Consecutive deployment-poll failures before a target is written off as
/// unpollable and marked Error.
pub const DEPLOY_POLL_MAX_FAILURES: u32 = 10;

/// Gas ceiling percentage accepted from the user (percentage of market price).
pub const MIN_GAS_CEILING_PCT: u16 = 1;
pub const MAX_GAS_CEILING_PCT: u16 = 200;

/// Orchestrator-level consecutive failures before the session is halted.
pub const CIRCUIT_BREAKER_MAX_FAILURES: usize = 5;

/// Minimum spacing between calls to the same RPC method.
pub const DEFAULT_RPC_MIN_SPACING_MS: u64 = 2_000;
/// Per-call RPC timeout.
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 15_000;
/// Consecutive per-method errors tolerated before an extended cooldown.
pub const RPC_ERRORS_BEFORE_COOLDOWN: u32 = 2;
/// Cooldown is spacing multiplied by this once a method is degraded.
pub const RPC_COOLDOWN_MULTIPLIER: u32 = 4;

/// Sessions untouched for this long are discarded on load.
pub const SESSION_EXPIRY_SECS: u64 = 24 * 60 * 60;

/// Transaction-count delta considered "significant activity". Advisory only;
/// never outranks the accessibility simulation.
pub const ACTIVITY_TX_DELTA_HINT: u64 = 5;

// =============================================================================
// GAS & TRANSACTION CONSTANTS
// =============================================================================

/// Hard cap on the gas limit attached to a mint transaction, estimate or not.
pub const MAX_GAS_LIMIT: u64 = 1_000_000;

pub const RECEIPT_POLL_MS: u64 = 1_500;
pub const RECEIPT_TIMEOUT_MS: u64 = 180_000;

// =============================================================================
// FEE CONSTANTS (U256 for precise Wei math)
// =============================================================================

/// Protocol fee in basis points of the mint price (5%).
pub const DEFAULT_FEE_BPS: u64 = 500;

lazy_static! {
    // 0.001 ETH
    pub static ref DEFAULT_MIN_FEE_WEI: U256 = U256::from(1_000_000_000_000_000u64);

    // 0.05 ETH
    pub static ref DEFAULT_MAX_FEE_WEI: U256 = U256::from(50_000_000_000_000_000u64);
}
