// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::SESSION_EXPIRY_SECS;
use crate::domain::error::SniperError;
use crate::domain::types::{DeploymentStatus, SnipeSession, unix_now};
use crate::infrastructure::data::store::BlobStore;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const WATCH_STATE_KEY: &str = "mintworx.watch_state";
pub const TARGETS_KEY: &str = "mintworx.targets";

/// Watcher state that survives a restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
    pub sessions: Vec<SnipeSession>,
    pub network: u64,
    pub bot_active: bool,
    pub last_updated: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PersistedTarget {
    pub address: Address,
    pub status: DeploymentStatus,
}

/// Typed schema over the blob store. All consumers go through this; nothing
/// else touches raw keys.
pub struct StatePersistence {
    store: Arc<dyn BlobStore>,
}

impl StatePersistence {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub fn save_state(
        &self,
        sessions: &[SnipeSession],
        network: u64,
        bot_active: bool,
    ) -> Result<(), SniperError> {
        let state = PersistedState {
            sessions: sessions.to_vec(),
            network,
            bot_active,
            last_updated: unix_now(),
        };
        let blob = serde_json::to_string(&state)
            .map_err(|e| SniperError::Persistence(format!("Serialize state failed: {}", e)))?;
        self.store.set(WATCH_STATE_KEY, &blob)
    }

    /// Load persisted state, discarding sessions idle for more than 24 hours.
    pub fn load_state(&self) -> Result<PersistedState, SniperError> {
        let Some(blob) = self.store.get(WATCH_STATE_KEY)? else {
            return Ok(PersistedState::default());
        };
        let mut state: PersistedState = serde_json::from_str(&blob)
            .map_err(|e| SniperError::Persistence(format!("Decode state failed: {}", e)))?;

        let now = unix_now();
        let before = state.sessions.len();
        state
            .sessions
            .retain(|s| now.saturating_sub(s.updated_at) <= SESSION_EXPIRY_SECS);
        let dropped = before - state.sessions.len();
        if dropped > 0 {
            tracing::info!(target: "persistence", dropped, "Discarded stale snipe sessions");
        }
        Ok(state)
    }

    pub fn clear_state(&self) -> Result<(), SniperError> {
        self.store.remove(WATCH_STATE_KEY)
    }

    pub fn save_targets(&self, targets: &[PersistedTarget]) -> Result<(), SniperError> {
        let blob = serde_json::to_string(targets)
            .map_err(|e| SniperError::Persistence(format!("Serialize targets failed: {}", e)))?;
        self.store.set(TARGETS_KEY, &blob)
    }

    pub fn load_targets(&self) -> Result<Vec<PersistedTarget>, SniperError> {
        let Some(blob) = self.store.get(TARGETS_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&blob)
            .map_err(|e| SniperError::Persistence(format!("Decode targets failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SessionStatus;
    use crate::infrastructure::data::store::MemoryStore;

    fn persistence() -> StatePersistence {
        StatePersistence::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn session_round_trip_preserves_fields() {
        let p = persistence();
        let session = SnipeSession::new(Address::from([0xAB; 20]), Address::from([0x01; 20]), 1);
        p.save_state(&[session.clone()], 1, true).unwrap();

        let loaded = p.load_state().unwrap();
        assert!(loaded.bot_active);
        assert_eq!(loaded.network, 1);
        assert_eq!(loaded.sessions.len(), 1);
        let restored = &loaded.sessions[0];
        assert_eq!(restored.contract_address, session.contract_address);
        assert_eq!(restored.status, SessionStatus::Watching);
        assert_eq!(restored.network, session.network);
    }

    #[test]
    fn stale_sessions_are_discarded_on_load() {
        let p = persistence();
        let mut fresh = SnipeSession::new(Address::from([0x11; 20]), Address::from([0x01; 20]), 1);
        fresh.updated_at = unix_now();
        let mut stale = SnipeSession::new(Address::from([0x22; 20]), Address::from([0x01; 20]), 1);
        stale.updated_at = unix_now() - SESSION_EXPIRY_SECS - 60;

        p.save_state(&[fresh, stale], 1, true).unwrap();
        let loaded = p.load_state().unwrap();
        assert_eq!(loaded.sessions.len(), 1);
        assert_eq!(
            loaded.sessions[0].contract_address,
            Address::from([0x11; 20])
        );
    }

    #[test]
    fn clear_state_removes_the_blob() {
        let p = persistence();
        let session = SnipeSession::new(Address::from([0xAB; 20]), Address::from([0x01; 20]), 1);
        p.save_state(&[session], 1, true).unwrap();
        p.clear_state().unwrap();
        let loaded = p.load_state().unwrap();
        assert!(loaded.sessions.is_empty());
        assert!(!loaded.bot_active);
    }

    #[test]
    fn missing_blob_loads_default() {
        let p = persistence();
        let loaded = p.load_state().unwrap();
        assert!(loaded.sessions.is_empty());
        assert!(!loaded.bot_active);
    }

    #[test]
    fn targets_round_trip() {
        let p = persistence();
        let targets = vec![
            PersistedTarget {
                address: Address::from([0x33; 20]),
                status: DeploymentStatus::NotDeployed,
            },
            PersistedTarget {
                address: Address::from([0x44; 20]),
                status: DeploymentStatus::Deployed,
            },
        ];
        p.save_targets(&targets).unwrap();
        let loaded = p.load_targets().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].status, DeploymentStatus::NotDeployed);
        assert_eq!(loaded[1].status, DeploymentStatus::Deployed);
    }
}
