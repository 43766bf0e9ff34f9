// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::infrastructure::network::provider::ChainClient;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use std::sync::Arc;

/// Computes and transmits the protocol fee after a successful mint. The fee
/// transfer is strictly secondary: its failure is logged and swallowed, the
/// user keeps the minted asset regardless of fee-collection outcome.
pub struct FeeSettlement {
    client: Arc<dyn ChainClient>,
    recipient: Option<Address>,
    fee_bps: u64,
    min_fee_wei: U256,
    max_fee_wei: U256,
    dry_run: bool,
}

impl FeeSettlement {
    pub fn new(
        client: Arc<dyn ChainClient>,
        recipient: Option<Address>,
        fee_bps: u64,
        min_fee_wei: U256,
        max_fee_wei: U256,
        dry_run: bool,
    ) -> Self {
        Self {
            client,
            recipient,
            fee_bps,
            min_fee_wei,
            max_fee_wei,
            dry_run,
        }
    }

    /// `clamp(amount * fee_bps / 10_000, min, max)`, integer wei math.
    pub fn compute_fee(amount: U256, fee_bps: u64, min: U256, max: U256) -> U256 {
        let raw = amount
            .saturating_mul(U256::from(fee_bps))
            .checked_div(U256::from(10_000u64))
            .unwrap_or(U256::ZERO);
        raw.clamp(min, max)
    }

    /// Best-effort fee transfer from the bot wallet. Never fails the caller.
    pub async fn settle(&self, wallet: Address, mint_amount: U256) {
        let Some(recipient) = self.recipient else {
            tracing::debug!(target: "settlement", "No fee recipient configured, skipping");
            return;
        };
        let fee = Self::compute_fee(mint_amount, self.fee_bps, self.min_fee_wei, self.max_fee_wei);
        if fee.is_zero() {
            return;
        }
        if self.dry_run {
            tracing::info!(target: "settlement", fee = %fee, recipient = %recipient, "Dry-run: would transfer protocol fee");
            return;
        }

        let tx = TransactionRequest::default()
            .with_from(wallet)
            .with_to(recipient)
            .with_value(fee);

        match self.client.send_transaction(tx).await {
            Ok(hash) => match self.client.wait_for_receipt(hash).await {
                Ok(receipt) if receipt.success => {
                    tracing::info!(target: "settlement", fee = %fee, tx = %hash, "Protocol fee settled");
                }
                Ok(_) => {
                    tracing::warn!(target: "settlement", tx = %hash, "Fee transfer reverted; mint outcome unaffected");
                }
                Err(e) => {
                    tracing::warn!(target: "settlement", error = %e, "Fee receipt wait failed; mint outcome unaffected");
                }
            },
            Err(e) => {
                tracing::warn!(target: "settlement", error = %e, "Fee transfer failed; mint outcome unaffected");
            }
        }
    }
}
