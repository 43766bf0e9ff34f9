// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SniperError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Address {0} is invalid or not checksummed")]
    InvalidAddress(String),

    #[error("RPC method {method} timed out after {elapsed_ms}ms")]
    Timeout { method: &'static str, elapsed_ms: u64 },

    #[error("Rate limited by RPC endpoint: {0}")]
    RateLimited(String),

    #[error("Circuit breaker open after {failures} consecutive failures; explicit re-arm required")]
    CircuitOpen { failures: usize },

    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    #[error("Transaction failed: {hash}, reason: {reason}")]
    TransactionFailed { hash: String, reason: String },

    #[error("Token transfer failed: {0}")]
    TransferFailed(String),

    #[error("Ownership unverified for token {token_id}: expected {expected}, read back {actual}")]
    OwnershipUnverified {
        token_id: String,
        expected: String,
        actual: String,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("External API error: {provider} responded with {status}")]
    ApiCall { provider: String, status: u16 },

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl From<config::ConfigError> for SniperError {
    fn from(err: config::ConfigError) -> Self {
        SniperError::Config(err.to_string())
    }
}

impl SniperError {
    /// Terminal errors end a snipe session and surface to the user; everything
    /// else is absorbed internally and retried.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SniperError::CircuitOpen { .. }
                | SniperError::TransactionReverted(_)
                | SniperError::TransactionFailed { .. }
                | SniperError::TransferFailed(_)
                | SniperError::OwnershipUnverified { .. }
                | SniperError::Validation { .. }
                | SniperError::InvalidAddress(_)
        )
    }
}
