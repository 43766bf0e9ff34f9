// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::{CIRCUIT_BREAKER_MAX_FAILURES, MAX_GAS_LIMIT};
use crate::domain::error::SniperError;
use crate::domain::types::{MintCandidate, ProbeResult, SessionStatus, SnipeSession, Target};
use crate::infrastructure::data::persistence::StatePersistence;
use crate::infrastructure::network::provider::{ChainClient, TxReceipt};
use crate::services::sniper::breaker::CircuitBreaker;
use crate::services::sniper::catalog;
use crate::services::sniper::gas_policy;
use crate::services::sniper::monitor::DeploymentMonitor;
use crate::services::sniper::probe::ContractProbe;
use crate::services::sniper::settlement::FeeSettlement;
use crate::services::sniper::transfer::PostMintTransfer;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, B256, U256, keccak256};
use alloy::rpc::types::TransactionRequest;
use lazy_static::lazy_static;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

lazy_static! {
    static ref TRANSFER_TOPIC: B256 = keccak256(b"Transfer(address,address,uint256)");
}

/// Signals the watcher fires toward the UI. The UI is a pure consumer; the
/// core never calls back into it for anything else.
pub trait NotificationSink: Send + Sync {
    fn on_watching(&self);
    fn on_success(&self, token_id: Option<U256>);
    fn on_error(&self, message: &str);
}

#[derive(Clone)]
pub struct SnipeSettings {
    pub target: Target,
    /// Bot wallet the mint fires from. Owned by the chain client; only the
    /// address is held here.
    pub wallet: Address,
    /// End-user wallet the token is forwarded to.
    pub recipient: Address,
    pub network: u64,
    pub gas_ceiling_percentage: u16,
    pub dry_run: bool,
}

enum CycleOutcome {
    /// Nothing actionable this cycle; poll again after the cadence interval.
    Continue,
    /// Target has no bytecode; deployment polling is the monitor's job now.
    Deferred,
    /// Session reached Success or Failed.
    Terminal,
}

/// Central orchestrator: Idle → Watching → Minting → {Success | Failed}.
/// `Failed` re-arms back to `Watching` only on explicit user action, never
/// automatically, so a revert cannot quietly stack paid attempts.
pub struct MintWatcher {
    client: Arc<dyn ChainClient>,
    monitor: Arc<DeploymentMonitor>,
    probe: ContractProbe,
    settlement: FeeSettlement,
    transfer: PostMintTransfer,
    persistence: Arc<StatePersistence>,
    sink: Arc<dyn NotificationSink>,
    breaker: CircuitBreaker,
    settings: SnipeSettings,
    session: Mutex<Option<SnipeSession>>,
    /// At-most-one mint transaction in flight per (contract, wallet).
    in_flight: AtomicBool,
    registered_with_monitor: AtomicBool,
    /// Last observed target transaction count, for the advisory activity hint.
    last_activity_count: AtomicU64,
    deployed: Arc<Notify>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl MintWatcher {
    pub fn new(
        client: Arc<dyn ChainClient>,
        monitor: Arc<DeploymentMonitor>,
        settlement: FeeSettlement,
        transfer: PostMintTransfer,
        persistence: Arc<StatePersistence>,
        sink: Arc<dyn NotificationSink>,
        settings: SnipeSettings,
    ) -> Arc<Self> {
        let probe = ContractProbe::new(client.clone(), settings.wallet);
        Arc::new(Self {
            client,
            monitor,
            probe,
            settlement,
            transfer,
            persistence,
            sink,
            breaker: CircuitBreaker::default(),
            settings,
            session: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            registered_with_monitor: AtomicBool::new(false),
            last_activity_count: AtomicU64::new(0),
            deployed: Arc::new(Notify::new()),
            cancel: Mutex::new(None),
        })
    }

    pub fn status(&self) -> Option<SessionStatus> {
        self.session.lock().unwrap().as_ref().map(|s| s.status)
    }

    /// Arm the sniper. Validation failures reject before any chain call and
    /// schedule no timers. Re-activating an already live session is a no-op.
    pub fn activate(self: &Arc<Self>) -> Result<(), SniperError> {
        gas_policy::validate_percentage(self.settings.gas_ceiling_percentage)?;

        // An interrupted session for the same (contract, wallet) keeps its
        // original start time across a restart.
        let prior_start = self
            .persistence
            .load_state()
            .ok()
            .and_then(|state| {
                state.sessions.into_iter().find(|s| {
                    s.contract_address == self.settings.target.address
                        && s.wallet_address == self.settings.wallet
                        && matches!(s.status, SessionStatus::Watching | SessionStatus::Minting)
                })
            })
            .map(|s| s.started_at);

        {
            let mut guard = self.session.lock().unwrap();
            if matches!(
                guard.as_ref().map(|s| s.status),
                Some(SessionStatus::Watching) | Some(SessionStatus::Minting)
            ) {
                tracing::debug!(target: "watcher", "Session already active, activation ignored");
                return Ok(());
            }
            let mut session = SnipeSession::new(
                self.settings.target.address,
                self.settings.wallet,
                self.settings.network,
            );
            if let Some(started_at) = prior_start {
                tracing::info!(
                    target: "watcher",
                    contract = %self.settings.target.address,
                    started_at,
                    "Resuming interrupted snipe session"
                );
                session.started_at = started_at;
            }
            *guard = Some(session);
        }
        self.persist();

        tracing::info!(
            target: "watcher",
            contract = %self.settings.target.address,
            gas_ceiling_pct = self.settings.gas_ceiling_percentage,
            "Snipe session armed"
        );
        self.sink.on_watching();
        self.spawn_loop();
        Ok(())
    }

    /// Re-arm a failed session. The breaker and in-flight guard reset, then
    /// the watch loop starts over; the next cycle may legitimately pick a
    /// different candidate signature.
    pub fn rearm(self: &Arc<Self>) -> Result<(), SniperError> {
        {
            let mut guard = self.session.lock().unwrap();
            match guard.as_mut() {
                Some(session) if session.status == SessionStatus::Failed => {
                    session.touch(SessionStatus::Watching);
                    session.last_error = None;
                }
                _ => {
                    return Err(SniperError::Validation {
                        field: "state".into(),
                        message: "only a failed session can be re-armed".into(),
                    });
                }
            }
        }
        self.breaker.reset();
        self.in_flight.store(false, Ordering::SeqCst);
        self.persist();
        self.sink.on_watching();
        self.spawn_loop();
        Ok(())
    }

    /// Stop the bot. Pending timers are cancelled synchronously; an in-flight
    /// mint transaction completes or fails on its own but nothing further is
    /// scheduled. Safe to call from any state.
    pub fn deactivate(&self) {
        if let Some(token) = self.cancel.lock().unwrap().take() {
            token.cancel();
        }
        let discarded = self.session.lock().unwrap().take().is_some();
        if discarded {
            if let Err(e) = self
                .persistence
                .save_state(&[], self.settings.network, false)
            {
                tracing::warn!(target: "watcher", error = %e, "State write on deactivate failed");
            }
            tracing::info!(target: "watcher", contract = %self.settings.target.address, "Snipe session deactivated");
        }
    }

    /// Flush current state, used by the host's shutdown path.
    pub fn flush(&self) {
        self.persist();
    }

    fn spawn_loop(self: &Arc<Self>) {
        let token = CancellationToken::new();
        *self.cancel.lock().unwrap() = Some(token.clone());
        let watcher = self.clone();
        tokio::spawn(async move { watcher.run_loop(token).await });
    }

    async fn run_loop(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                break;
            }
            if let Err(e) = self.breaker.check() {
                self.fail(&e.to_string());
                break;
            }

            match self.cycle().await {
                Ok(CycleOutcome::Continue) => {
                    self.breaker.record_success();
                }
                Ok(CycleOutcome::Deferred) => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = self.deployed.notified() => continue,
                    }
                }
                Ok(CycleOutcome::Terminal) => break,
                Err(e) if e.is_terminal() => {
                    self.fail(&e.to_string());
                    break;
                }
                Err(e) => {
                    // Transient (Unknown probe, RPC trouble): absorbed unless
                    // the run of failures trips the breaker.
                    tracing::debug!(target: "watcher", error = %e, "Watch cycle errored");
                    if self.breaker.record_failure() {
                        self.fail(
                            &SniperError::CircuitOpen {
                                failures: CIRCUIT_BREAKER_MAX_FAILURES,
                            }
                            .to_string(),
                        );
                        break;
                    }
                }
            }

            let cadence = gas_policy::poll_interval(self.settings.gas_ceiling_percentage);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(cadence) => {}
            }
        }
    }

    async fn cycle(&self) -> Result<CycleOutcome, SniperError> {
        let target = self.settings.target.address;
        let result = self
            .probe
            .probe(target, self.settings.target.expected_mint_price_wei)
            .await;

        match result {
            ProbeResult::NotDeployed => {
                if !self.registered_with_monitor.swap(true, Ordering::SeqCst) {
                    self.monitor_register(target);
                }
                Ok(CycleOutcome::Deferred)
            }
            ProbeResult::Unknown => Err(SniperError::Connection(format!(
                "probe of {target:#x} failed"
            ))),
            ProbeResult::Deployed { .. } => match result.first_accessible() {
                Some(candidate) => {
                    let candidate = candidate.clone();
                    tracing::info!(
                        target: "watcher",
                        contract = %target,
                        signature = candidate.function_name,
                        payable = candidate.payable,
                        "Mint path open, attempting snipe"
                    );
                    self.execute_mint(candidate).await
                }
                None => {
                    self.observe_activity(target).await;
                    Ok(CycleOutcome::Continue)
                }
            },
        }
    }

    /// Low-confidence launch hint while every detected mint path stays gated.
    /// Logged only; never promotes a candidate past the simulation verdict.
    async fn observe_activity(&self, target: Address) {
        let last = self.last_activity_count.load(Ordering::Relaxed);
        if let Some((count, significant)) = self.probe.significant_activity(target, last).await {
            self.last_activity_count.store(count, Ordering::Relaxed);
            if significant && last > 0 {
                tracing::info!(
                    target: "watcher",
                    contract = %target,
                    tx_delta = count.saturating_sub(last),
                    "Activity spike on target, launch may be imminent"
                );
            }
        }
    }

    fn monitor_register(&self, target: Address) {
        self.monitor.watch(target);
        let notify = self.deployed.clone();
        self.monitor
            .on_deployment(target, Box::new(move |_| notify.notify_one()));
    }

    async fn execute_mint(&self, candidate: MintCandidate) -> Result<CycleOutcome, SniperError> {
        // Re-entrant trigger while Minting is a no-op; never two paid calls.
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(CycleOutcome::Continue);
        }

        self.transition(SessionStatus::Minting, None);
        let outcome = self.submit(&candidate).await;
        self.in_flight.store(false, Ordering::SeqCst);

        match outcome {
            Ok(token_id) => {
                self.settlement
                    .settle(self.settings.wallet, self.settings.target.expected_mint_price_wei)
                    .await;

                let forwarded = match token_id {
                    Some(id) => {
                        self.transfer
                            .forward(
                                self.settings.target.address,
                                id,
                                self.settings.wallet,
                                self.settings.recipient,
                            )
                            .await
                    }
                    // No Transfer event decoded: nothing to forward, not an error.
                    None => Ok(()),
                };

                match forwarded {
                    Ok(()) => {
                        self.transition(SessionStatus::Success, None);
                        self.sink.on_success(token_id);
                    }
                    Err(e) => {
                        // The mint itself landed; the token may need manual
                        // recovery, so the failure is surfaced verbatim.
                        let message = format!("mint succeeded but forwarding failed: {e}");
                        self.transition(SessionStatus::Failed, Some(message.clone()));
                        self.sink.on_error(&message);
                    }
                }
                Ok(CycleOutcome::Terminal)
            }
            Err(e) => {
                self.fail(&e.to_string());
                Ok(CycleOutcome::Terminal)
            }
        }
    }

    async fn submit(&self, candidate: &MintCandidate) -> Result<Option<U256>, SniperError> {
        let fee_data = self.client.get_fee_data().await?;
        let quote =
            gas_policy::compute_ceiling(&fee_data, self.settings.gas_ceiling_percentage)?;
        let max_fee: u128 = quote
            .effective_max_fee_wei
            .try_into()
            .unwrap_or(u128::MAX);
        let priority = fee_data.max_priority_fee_per_gas.min(max_fee);

        let mut tx = TransactionRequest::default()
            .with_from(self.settings.wallet)
            .with_to(self.settings.target.address)
            .with_input(catalog::encode_raw(
                &candidate.selector,
                candidate.parameter_shape,
                self.settings.wallet,
                1,
            ))
            .with_max_fee_per_gas(max_fee)
            .with_max_priority_fee_per_gas(priority);
        if candidate.payable {
            tx = tx.with_value(self.settings.target.expected_mint_price_wei);
        }

        let gas = self.client.estimate_gas(&tx).await?;
        let gas_limit = gas.saturating_add(gas / 5).min(MAX_GAS_LIMIT);
        let tx = tx.with_gas_limit(gas_limit);

        if self.settings.dry_run {
            tracing::info!(
                target: "watcher",
                contract = %self.settings.target.address,
                signature = candidate.function_name,
                max_fee_wei = max_fee,
                gas_limit,
                "Dry-run: would submit mint transaction"
            );
            return Ok(None);
        }

        let hash = self.client.send_transaction(tx).await?;
        tracing::info!(target: "watcher", tx = %hash, "Mint transaction submitted");
        let receipt = self.client.wait_for_receipt(hash).await?;
        if !receipt.success {
            return Err(SniperError::TransactionFailed {
                hash: format!("{hash:#x}"),
                reason: "mint reverted on-chain".into(),
            });
        }
        Ok(extract_token_id(
            &receipt,
            self.settings.target.address,
            self.settings.wallet,
        ))
    }

    fn fail(&self, message: &str) {
        self.transition(SessionStatus::Failed, Some(message.to_string()));
        self.sink.on_error(message);
    }

    fn transition(&self, status: SessionStatus, error: Option<String>) {
        {
            let mut guard = self.session.lock().unwrap();
            if let Some(session) = guard.as_mut() {
                session.touch(status);
                if error.is_some() {
                    session.last_error = error;
                }
            }
        }
        self.persist();
    }

    /// Written on every state transition so a reload resumes cleanly.
    fn persist(&self) {
        let (sessions, active) = {
            let guard = self.session.lock().unwrap();
            match guard.as_ref() {
                Some(session) => {
                    let active = matches!(
                        session.status,
                        SessionStatus::Watching | SessionStatus::Minting
                    );
                    (vec![session.clone()], active)
                }
                None => (Vec::new(), false),
            }
        };
        if let Err(e) = self
            .persistence
            .save_state(&sessions, self.settings.network, active)
        {
            tracing::warn!(target: "watcher", error = %e, "State persistence failed");
        }
    }
}

/// Best-effort token id extraction from a mint receipt: the first ERC-721
/// `Transfer` event on the target whose `to` is our wallet. Absence is fine.
fn extract_token_id(receipt: &TxReceipt, contract: Address, wallet: Address) -> Option<U256> {
    receipt.logs.iter().find_map(|log| {
        if log.address != contract || log.topics.len() != 4 || log.topics[0] != *TRANSFER_TOPIC {
            return None;
        }
        let to = Address::from_word(log.topics[2]);
        if to != wallet {
            return None;
        }
        Some(U256::from_be_bytes(log.topics[3].0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Bytes;

    fn transfer_log(contract: Address, to: Address, token_id: u64) -> crate::infrastructure::network::provider::ReceiptLog {
        let mut to_word = [0u8; 32];
        to_word[12..].copy_from_slice(to.as_slice());
        crate::infrastructure::network::provider::ReceiptLog {
            address: contract,
            topics: vec![
                *TRANSFER_TOPIC,
                B256::ZERO,
                B256::from(to_word),
                B256::from(U256::from(token_id)),
            ],
            data: Bytes::new(),
        }
    }

    #[test]
    fn token_id_extracted_from_transfer_to_wallet() {
        let contract = Address::from([0xC0; 20]);
        let wallet = Address::from([0xA1; 20]);
        let receipt = TxReceipt {
            tx_hash: B256::ZERO,
            success: true,
            logs: vec![
                transfer_log(contract, Address::from([0xEE; 20]), 7),
                transfer_log(contract, wallet, 42),
            ],
        };
        assert_eq!(
            extract_token_id(&receipt, contract, wallet),
            Some(U256::from(42))
        );
    }

    #[test]
    fn missing_transfer_event_is_not_an_error() {
        let contract = Address::from([0xC0; 20]);
        let wallet = Address::from([0xA1; 20]);
        let receipt = TxReceipt {
            tx_hash: B256::ZERO,
            success: true,
            logs: vec![],
        };
        assert_eq!(extract_token_id(&receipt, contract, wallet), None);
    }

    #[test]
    fn foreign_contract_logs_are_ignored() {
        let contract = Address::from([0xC0; 20]);
        let wallet = Address::from([0xA1; 20]);
        let receipt = TxReceipt {
            tx_hash: B256::ZERO,
            success: true,
            logs: vec![transfer_log(Address::from([0xDD; 20]), wallet, 9)],
        };
        assert_eq!(extract_token_id(&receipt, contract, wallet), None);
    }
}
