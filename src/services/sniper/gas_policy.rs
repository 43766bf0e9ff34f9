// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::{MAX_GAS_CEILING_PCT, MIN_GAS_CEILING_PCT};
use crate::domain::error::SniperError;
use crate::domain::types::GasQuote;
use crate::infrastructure::network::fees::FeeData;
use alloy::primitives::U256;
use std::time::Duration;

pub fn validate_percentage(percentage: u16) -> Result<(), SniperError> {
    if !(MIN_GAS_CEILING_PCT..=MAX_GAS_CEILING_PCT).contains(&percentage) {
        return Err(SniperError::Validation {
            field: "gas_ceiling_percentage".into(),
            message: format!(
                "{percentage} is outside [{MIN_GAS_CEILING_PCT},{MAX_GAS_CEILING_PCT}]"
            ),
        });
    }
    Ok(())
}

/// Bounded gas price: `market * percentage / 100`, integer wei math only.
/// Truncating division, so the result never rounds up past the ceiling.
pub fn compute_ceiling(fee_data: &FeeData, percentage: u16) -> Result<GasQuote, SniperError> {
    validate_percentage(percentage)?;
    let base = U256::from(fee_data.market_price());
    let effective = base
        .saturating_mul(U256::from(percentage))
        .checked_div(U256::from(100u64))
        .unwrap_or(U256::ZERO);
    Ok(GasQuote {
        base_fee_wei: base,
        ceiling_percentage: percentage,
        effective_max_fee_wei: effective,
    })
}

/// Higher willingness-to-pay implies tighter polling: the user has already
/// accepted more spend, so more frequent RPC traffic is an acceptable trade.
pub fn poll_interval(percentage: u16) -> Duration {
    let secs = if percentage > 150 {
        1
    } else if percentage >= 100 {
        2
    } else if percentage >= 50 {
        3
    } else {
        5
    };
    Duration::from_secs(secs)
}
