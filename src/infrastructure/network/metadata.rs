// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::SniperError;
use alloy::primitives::{Address, U256};
use serde::Deserialize;

/// Best-effort upcoming-drop metadata from a marketplace aggregator API.
/// Never authoritative for on-chain state; failures degrade to placeholders.
#[derive(Debug, Clone, Default)]
pub struct DropMetadata {
    pub name: Option<String>,
    pub mint_price_wei: Option<U256>,
    pub launch_time: Option<u64>,
    pub image_url: Option<String>,
}

pub struct MarketplaceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl MarketplaceClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub async fn collection(&self, address: Address) -> Result<Option<DropMetadata>, SniperError> {
        let url = format!("{}/collections/v7?id={:#x}", self.base_url, address);
        let mut req = self.http.get(&url);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| SniperError::Connection(format!("Metadata fetch failed: {}", e)))?;
        if !resp.status().is_success() {
            return Err(SniperError::ApiCall {
                provider: "marketplace metadata".into(),
                status: resp.status().as_u16(),
            });
        }

        let parsed: CollectionsResponse = resp
            .json()
            .await
            .map_err(|e| SniperError::Initialization(format!("Metadata decode failed: {e}")))?;

        let Some(entry) = parsed.collections.into_iter().next() else {
            return Ok(None);
        };

        let mint_price_wei = entry
            .mint_stages
            .iter()
            .filter_map(|s| s.price.as_ref())
            .filter_map(|p| p.amount.as_ref())
            .filter_map(|a| a.raw.as_deref())
            .filter_map(|raw| raw.parse::<U256>().ok())
            .next();
        let launch_time = entry
            .mint_stages
            .iter()
            .filter_map(|s| s.start_time)
            .min();

        Ok(Some(DropMetadata {
            name: entry.name,
            mint_price_wei,
            launch_time,
            image_url: entry.image,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct CollectionsResponse {
    #[serde(default)]
    collections: Vec<CollectionEntry>,
}

#[derive(Debug, Deserialize)]
struct CollectionEntry {
    name: Option<String>,
    image: Option<String>,
    #[serde(rename = "mintStages", default)]
    mint_stages: Vec<MintStage>,
}

#[derive(Debug, Deserialize)]
struct MintStage {
    price: Option<StagePrice>,
    #[serde(rename = "startTime")]
    start_time: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct StagePrice {
    amount: Option<StageAmount>,
}

#[derive(Debug, Deserialize)]
struct StageAmount {
    raw: Option<String>,
}
