// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::ACTIVITY_TX_DELTA_HINT;
use crate::domain::error::SniperError;
use crate::domain::types::{MintCandidate, ProbeResult};
use crate::infrastructure::network::provider::ChainClient;
use crate::services::sniper::catalog::{self, SignatureCandidate};
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use std::collections::HashMap;
use std::sync::Arc;

/// Heuristic mint-function detector. Bytecode matching is a syntactic
/// substring scan over the deployed code: it can false-positive on selector
/// bytes that appear incidentally and false-negative on proxies or unusual
/// compilers. Accessibility is then decided by a side-effect-free gas
/// estimation; any revert, including access control, counts as "not yet".
pub struct ContractProbe {
    client: Arc<dyn ChainClient>,
    caller: Address,
}

impl ContractProbe {
    pub fn new(client: Arc<dyn ChainClient>, caller: Address) -> Self {
        Self { client, caller }
    }

    /// Probe a target. Never mutates chain state.
    pub async fn probe(&self, target: Address, trial_value_wei: U256) -> ProbeResult {
        let code = match self.client.get_code(target).await {
            Ok(code) => code,
            Err(e) => {
                tracing::debug!(target: "probe", contract = %target, error = %e, "getCode failed");
                return ProbeResult::Unknown;
            }
        };
        if code.is_empty() {
            return ProbeResult::NotDeployed;
        }

        // Payable and free variants share a selector; with a zero trial value
        // their trial calls are byte-identical, so each distinct
        // (selector, value) pair is estimated once per cycle.
        let mut verdicts: HashMap<([u8; 4], U256), bool> = HashMap::new();
        let mut candidates = Vec::new();
        for entry in catalog::catalog() {
            let detected = contains_selector(&code, &entry.selector);
            let mut candidate = MintCandidate {
                function_name: entry.name,
                parameter_shape: entry.shape,
                payable: entry.payable,
                selector: entry.selector,
                detected_in_bytecode: detected,
                is_currently_accessible: false,
            };
            if detected {
                let value = if entry.payable {
                    trial_value_wei
                } else {
                    U256::ZERO
                };
                let accessible = match verdicts.get(&(entry.selector, value)) {
                    Some(&known) => known,
                    None => match self.simulate(target, entry, value).await {
                        Ok(accessible) => {
                            verdicts.insert((entry.selector, value), accessible);
                            accessible
                        }
                        // Transport failure mid-probe: report Unknown so the
                        // caller retries instead of concluding "not live".
                        Err(e) => {
                            tracing::debug!(target: "probe", contract = %target, signature = entry.signature, error = %e, "Simulation errored");
                            return ProbeResult::Unknown;
                        }
                    },
                };
                candidate.is_currently_accessible = accessible;
            }
            candidates.push(candidate);
        }

        ProbeResult::Deployed { candidates }
    }

    /// Side-effect-free accessibility check via gas estimation.
    /// Ok(false) = the node evaluated the call and it reverts right now.
    /// Err = transport problem, nothing learned.
    async fn simulate(
        &self,
        target: Address,
        entry: &SignatureCandidate,
        value: U256,
    ) -> Result<bool, SniperError> {
        let mut tx = TransactionRequest::default()
            .with_from(self.caller)
            .with_to(target)
            .with_input(catalog::encode_call(entry, self.caller, 1));
        if !value.is_zero() {
            tx = tx.with_value(value);
        }

        match self.client.estimate_gas(&tx).await {
            Ok(_) => Ok(true),
            Err(SniperError::TransactionReverted(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Secondary, low-confidence launch signal: a jump in the deployer-side
    /// transaction count. Advisory only; never outranks the simulation above.
    pub async fn significant_activity(
        &self,
        account: Address,
        last_count: u64,
    ) -> Option<(u64, bool)> {
        match self.client.get_transaction_count(account).await {
            Ok(count) => {
                let significant = count.saturating_sub(last_count) > ACTIVITY_TX_DELTA_HINT;
                Some((count, significant))
            }
            Err(_) => None,
        }
    }
}

fn contains_selector(code: &[u8], selector: &[u8; 4]) -> bool {
    code.windows(4).any(|w| w == selector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_substring_match() {
        let code = [0x60, 0x80, 0xa0, 0x71, 0x2d, 0x68, 0x00];
        assert!(contains_selector(&code, &[0xa0, 0x71, 0x2d, 0x68]));
        assert!(!contains_selector(&code, &[0x12, 0x49, 0xc5, 0x8b]));
        assert!(!contains_selector(&[0xa0, 0x71], &[0xa0, 0x71, 0x2d, 0x68]));
    }
}
