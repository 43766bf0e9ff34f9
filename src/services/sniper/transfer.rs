// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::SniperError;
use crate::infrastructure::network::provider::ChainClient;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::SolCall;
use std::sync::Arc;

sol! {
    interface IERC721 {
        function safeTransferFrom(address from, address to, uint256 tokenId);
        function transferFrom(address from, address to, uint256 tokenId);
        function ownerOf(uint256 tokenId) external view returns (address);
    }
}

/// Forwards a freshly minted token from the bot wallet to the end-user wallet
/// and verifies the hand-off by reading ownership back.
pub struct PostMintTransfer {
    client: Arc<dyn ChainClient>,
    dry_run: bool,
}

impl PostMintTransfer {
    pub fn new(client: Arc<dyn ChainClient>, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    /// `safeTransferFrom` with a `transferFrom` fallback, then an `ownerOf`
    /// read-back. `TransferFailed` means no transfer landed;
    /// `OwnershipUnverified` means a transfer landed but the read-back
    /// disagrees. Both are terminal and surfaced, never swallowed.
    pub async fn forward(
        &self,
        contract: Address,
        token_id: U256,
        holder: Address,
        recipient: Address,
    ) -> Result<(), SniperError> {
        if holder == recipient {
            tracing::debug!(target: "transfer", token_id = %token_id, "Recipient is the minting wallet, nothing to forward");
            return Ok(());
        }
        if self.dry_run {
            tracing::info!(target: "transfer", token_id = %token_id, recipient = %recipient, "Dry-run: would forward token");
            return Ok(());
        }

        let safe_call = IERC721::safeTransferFromCall {
            from: holder,
            to: recipient,
            tokenId: token_id,
        }
        .abi_encode();

        if let Err(safe_err) = self.transfer_with(contract, holder, safe_call.into()).await {
            tracing::warn!(target: "transfer", error = %safe_err, "safeTransferFrom failed, falling back to transferFrom");
            let fallback_call = IERC721::transferFromCall {
                from: holder,
                to: recipient,
                tokenId: token_id,
            }
            .abi_encode();
            self.transfer_with(contract, holder, fallback_call.into())
                .await
                .map_err(|e| SniperError::TransferFailed(e.to_string()))?;
        }

        self.verify_ownership(contract, token_id, recipient).await
    }

    async fn transfer_with(
        &self,
        contract: Address,
        holder: Address,
        input: Bytes,
    ) -> Result<(), SniperError> {
        let tx = TransactionRequest::default()
            .with_from(holder)
            .with_to(contract)
            .with_input(input);
        let hash = self.client.send_transaction(tx).await?;
        let receipt = self.client.wait_for_receipt(hash).await?;
        if !receipt.success {
            return Err(SniperError::TransactionFailed {
                hash: format!("{hash:#x}"),
                reason: "transfer reverted on-chain".into(),
            });
        }
        Ok(())
    }

    async fn verify_ownership(
        &self,
        contract: Address,
        token_id: U256,
        expected: Address,
    ) -> Result<(), SniperError> {
        let call = IERC721::ownerOfCall { tokenId: token_id }.abi_encode();
        let tx = TransactionRequest::default()
            .with_to(contract)
            .with_input(call);
        let raw = self
            .client
            .call(&tx)
            .await
            .map_err(|e| SniperError::OwnershipUnverified {
                token_id: token_id.to_string(),
                expected: format!("{expected:#x}"),
                actual: format!("ownerOf unavailable: {e}"),
            })?;
        let owner = IERC721::ownerOfCall::abi_decode_returns(&raw).map_err(|e| {
            SniperError::OwnershipUnverified {
                token_id: token_id.to_string(),
                expected: format!("{expected:#x}"),
                actual: format!("undecodable ownerOf response: {e}"),
            }
        })?;
        if owner != expected {
            return Err(SniperError::OwnershipUnverified {
                token_id: token_id.to_string(),
                expected: format!("{expected:#x}"),
                actual: format!("{owner:#x}"),
            });
        }
        tracing::info!(target: "transfer", token_id = %token_id, owner = %owner, "Ownership verified");
        Ok(())
    }
}
