// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::DEPLOY_POLL_MAX_FAILURES;
use crate::domain::types::DeploymentStatus;
use crate::infrastructure::data::persistence::{PersistedTarget, StatePersistence};
use crate::infrastructure::network::provider::ChainClient;
use alloy::primitives::Address;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub type DeployCallback = Box<dyn Fn(Address) + Send + Sync>;

struct TargetEntry {
    status: DeploymentStatus,
    callbacks: Vec<DeployCallback>,
    cancel: CancellationToken,
    consecutive_failures: u32,
}

/// Tracks not-yet-deployed contracts, polling each on its own interval until
/// bytecode appears. An explicit, constructible instance owned by the
/// application root; nothing here is global state.
pub struct DeploymentMonitor {
    client: Arc<dyn ChainClient>,
    poll_interval: Duration,
    targets: DashMap<Address, TargetEntry>,
    persistence: Option<Arc<StatePersistence>>,
    shutdown: CancellationToken,
}

impl DeploymentMonitor {
    pub fn new(
        client: Arc<dyn ChainClient>,
        poll_interval: Duration,
        persistence: Option<Arc<StatePersistence>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            client,
            poll_interval,
            targets: DashMap::new(),
            persistence,
            shutdown: CancellationToken::new(),
        })
    }

    /// Begin watching an address. Idempotent: an address already tracked keeps
    /// its state and timer.
    pub fn watch(self: &Arc<Self>, address: Address) {
        if self.targets.contains_key(&address) {
            return;
        }
        let cancel = self.shutdown.child_token();
        self.targets.insert(
            address,
            TargetEntry {
                status: DeploymentStatus::NotDeployed,
                callbacks: Vec::new(),
                cancel: cancel.clone(),
                consecutive_failures: 0,
            },
        );
        self.persist();
        tracing::info!(target: "monitor", contract = %address, "Watching for deployment");

        let monitor = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(monitor.poll_interval) => {}
                }
                if monitor.check_target(address).await {
                    break;
                }
            }
        });
    }

    pub fn status(&self, address: &Address) -> Option<DeploymentStatus> {
        self.targets.get(address).map(|e| e.status)
    }

    /// Register a deployment callback. If the target already transitioned, the
    /// callback fires immediately; otherwise it fires exactly once on the
    /// transition, in registration order. Duplicate registrations are
    /// independent callbacks.
    pub fn on_deployment(&self, address: Address, callback: DeployCallback) {
        let already_deployed = match self.targets.get_mut(&address) {
            Some(mut entry) => {
                if entry.status == DeploymentStatus::Deployed {
                    true
                } else {
                    entry.callbacks.push(callback);
                    return;
                }
            }
            None => true,
        };
        // No missed notifications: unknown or already-deployed targets notify
        // the caller right away.
        if already_deployed {
            callback(address);
        }
    }

    /// Out-of-band check of every pending target, used when the host UI
    /// regains focus.
    pub async fn force_check_all(self: &Arc<Self>) {
        let pending: Vec<Address> = self
            .targets
            .iter()
            .filter(|e| e.status == DeploymentStatus::NotDeployed)
            .map(|e| *e.key())
            .collect();
        for address in pending {
            self.check_target(address).await;
        }
    }

    /// Stop watching one target. Its poll timer is cancelled synchronously.
    pub fn stop(&self, address: &Address) {
        if let Some((_, entry)) = self.targets.remove(address) {
            entry.cancel.cancel();
            self.persist();
        }
    }

    /// Cancel every poll timer. Safe to call from any state.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Resume monitoring from persisted state after a restart.
    pub fn restore(self: &Arc<Self>) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        match persistence.load_targets() {
            Ok(saved) => {
                for target in saved {
                    match target.status {
                        DeploymentStatus::NotDeployed | DeploymentStatus::Unknown => {
                            self.watch(target.address)
                        }
                        status => {
                            self.targets.insert(
                                target.address,
                                TargetEntry {
                                    status,
                                    callbacks: Vec::new(),
                                    cancel: self.shutdown.child_token(),
                                    consecutive_failures: 0,
                                },
                            );
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(target: "monitor", error = %e, "Target restore failed, starting empty");
            }
        }
    }

    /// Poll one target. Returns true when the target reached a terminal state.
    async fn check_target(self: &Arc<Self>, address: Address) -> bool {
        match self.client.get_code(address).await {
            Ok(code) if !code.is_empty() => {
                self.mark_deployed(address);
                true
            }
            Ok(_) => {
                if let Some(mut entry) = self.targets.get_mut(&address) {
                    entry.consecutive_failures = 0;
                }
                false
            }
            Err(e) => {
                tracing::debug!(target: "monitor", contract = %address, error = %e, "Deployment poll failed");
                let unpollable = {
                    let Some(mut entry) = self.targets.get_mut(&address) else {
                        return true;
                    };
                    entry.consecutive_failures += 1;
                    entry.consecutive_failures >= DEPLOY_POLL_MAX_FAILURES
                };
                if unpollable {
                    self.mark_error(address);
                }
                unpollable
            }
        }
    }

    fn mark_deployed(&self, address: Address) {
        let callbacks = {
            let Some(mut entry) = self.targets.get_mut(&address) else {
                return;
            };
            if entry.status == DeploymentStatus::Deployed {
                return;
            }
            entry.status = DeploymentStatus::Deployed;
            entry.cancel.cancel();
            std::mem::take(&mut entry.callbacks)
        };
        tracing::info!(target: "monitor", contract = %address, "Bytecode detected, contract deployed");
        for callback in &callbacks {
            callback(address);
        }
        self.persist();
    }

    /// Terminal give-up: every poll in a row failed, so the target is treated
    /// as unpollable rather than retried forever. Its queued deployment
    /// callbacks will never fire.
    fn mark_error(&self, address: Address) {
        let dropped = {
            let Some(mut entry) = self.targets.get_mut(&address) else {
                return;
            };
            entry.status = DeploymentStatus::Error;
            entry.cancel.cancel();
            std::mem::take(&mut entry.callbacks).len()
        };
        tracing::warn!(
            target: "monitor",
            contract = %address,
            dropped_callbacks = dropped,
            "Target unpollable after repeated failures, giving up"
        );
        self.persist();
    }

    fn persist(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let targets: Vec<PersistedTarget> = self
            .targets
            .iter()
            .map(|e| PersistedTarget {
                address: *e.key(),
                status: e.status,
            })
            .collect();
        if let Err(e) = persistence.save_targets(&targets) {
            tracing::warn!(target: "monitor", error = %e, "Target persistence failed");
        }
    }
}
