// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::types::ParameterShape;
use alloy::primitives::{Address, Bytes, U256, keccak256};
use lazy_static::lazy_static;

/// One guessable mint entry point. Payability is not part of the selector, so
/// the same function appears twice: once tried with value attached, once
/// without. Catalog order is the only tie-break; the first structurally valid,
/// currently accessible entry wins.
#[derive(Debug, Clone)]
pub struct SignatureCandidate {
    pub name: &'static str,
    pub signature: &'static str,
    pub shape: ParameterShape,
    pub payable: bool,
    pub selector: [u8; 4],
}

fn candidate(
    name: &'static str,
    signature: &'static str,
    shape: ParameterShape,
    payable: bool,
) -> SignatureCandidate {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[..4]);
    SignatureCandidate {
        name,
        signature,
        shape,
        payable,
        selector,
    }
}

lazy_static! {
    /// Ordered catalog of common non-standard mint entry points. Read-only.
    static ref CATALOG: Vec<SignatureCandidate> = {
        use ParameterShape::*;
        let mut v = Vec::new();
        for payable in [true, false] {
            v.push(candidate("mint", "mint()", None, payable));
            v.push(candidate("mint", "mint(uint256)", Quantity, payable));
            v.push(candidate("mint", "mint(address,uint256)", RecipientQuantity, payable));
        }
        for payable in [true, false] {
            v.push(candidate("publicMint", "publicMint()", None, payable));
            v.push(candidate("publicMint", "publicMint(uint256)", Quantity, payable));
            v.push(candidate("publicSaleMint", "publicSaleMint(uint256)", Quantity, payable));
            v.push(candidate("mintPublic", "mintPublic(uint256)", Quantity, payable));
        }
        for payable in [true, false] {
            v.push(candidate("claim", "claim()", None, payable));
            v.push(candidate("claim", "claim(uint256)", Quantity, payable));
            v.push(candidate("purchase", "purchase(uint256)", Quantity, payable));
            v.push(candidate("buy", "buy(uint256)", Quantity, payable));
        }
        v
    };
}

/// The full catalog in probe order.
pub fn catalog() -> &'static [SignatureCandidate] {
    &CATALOG
}

/// ABI-encode a trial call for a candidate: quantity 1, recipient = caller.
pub fn encode_call(candidate: &SignatureCandidate, caller: Address, quantity: u64) -> Bytes {
    encode_raw(&candidate.selector, candidate.shape, caller, quantity)
}

/// Same encoding from a bare selector and shape, for callers holding a
/// derived `MintCandidate` rather than a catalog entry.
pub fn encode_raw(
    selector: &[u8; 4],
    shape: ParameterShape,
    caller: Address,
    quantity: u64,
) -> Bytes {
    let mut data = selector.to_vec();
    match shape {
        ParameterShape::None => {}
        ParameterShape::Quantity => {
            data.extend_from_slice(&U256::from(quantity).to_be_bytes::<32>());
        }
        ParameterShape::RecipientQuantity => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(caller.as_slice());
            data.extend_from_slice(&word);
            data.extend_from_slice(&U256::from(quantity).to_be_bytes::<32>());
        }
    }
    Bytes::from(data)
}
