// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::SniperError;
use alloy::primitives::{Address, U256};
use std::str::FromStr;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub fn parse_hex_bytes(s: &str) -> Option<Vec<u8>> {
    hex::decode(strip_0x(s)).ok()
}

pub fn parse_u256_hex(s: &str) -> Option<U256> {
    U256::from_str_radix(strip_0x(s), 16).ok()
}

/// Parse a user-supplied contract address. Rejects malformed input before any
/// chain call is made.
pub fn parse_target_address(raw: &str) -> Result<Address, SniperError> {
    let trimmed = raw.trim();
    if strip_0x(trimmed).len() != 40 {
        return Err(SniperError::InvalidAddress(trimmed.to_string()));
    }
    Address::from_str(trimmed).map_err(|_| SniperError::InvalidAddress(trimmed.to_string()))
}
