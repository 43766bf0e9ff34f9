// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::U256;
use alloy::signers::local::PrivateKeySigner;
use clap::Parser;
use mintworx::app::config::GlobalSettings;
use mintworx::app::logging::setup_logging;
use mintworx::common::parsing::parse_target_address;
use mintworx::domain::error::SniperError;
use mintworx::domain::types::Target;
use mintworx::infrastructure::data::persistence::StatePersistence;
use mintworx::infrastructure::data::store::FileStore;
use mintworx::infrastructure::network::metadata::MarketplaceClient;
use mintworx::infrastructure::network::provider::{ChainClient, ConnectionFactory, RpcChainClient};
use mintworx::infrastructure::network::throttle::ThrottledChainClient;
use mintworx::services::sniper::monitor::DeploymentMonitor;
use mintworx::services::sniper::settlement::FeeSettlement;
use mintworx::services::sniper::transfer::PostMintTransfer;
use mintworx::services::sniper::watcher::{MintWatcher, NotificationSink, SnipeSettings};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Parser, Debug)]
#[command(author, version, about = "mintworx sniper")]
struct Cli {
    /// NFT contract address to snipe
    address: String,

    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    /// Do not submit transactions, only simulate/log
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Gas ceiling as a percentage of market price (overrides config)
    #[arg(long)]
    gas_ceiling: Option<u16>,

    /// Expected mint price in wei (overrides config/marketplace metadata)
    #[arg(long)]
    mint_price_wei: Option<u128>,

    /// Emit JSON logs
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

/// Terminal-signal sink for the CLI: logs the three watcher signals and wakes
/// the main task once the session reaches a terminal state.
struct CliSink {
    done: Arc<Notify>,
}

impl NotificationSink for CliSink {
    fn on_watching(&self) {
        tracing::info!(target: "ui", "Watching for mint window");
    }

    fn on_success(&self, token_id: Option<U256>) {
        match token_id {
            Some(id) => tracing::info!(target: "ui", token_id = %id, "Mint sniped"),
            None => tracing::info!(target: "ui", "Mint sniped (token id not decoded)"),
        }
        self.done.notify_one();
    }

    fn on_error(&self, message: &str) {
        tracing::error!(target: "ui", message, "Snipe session failed");
        self.done.notify_one();
    }
}

#[tokio::main]
async fn main() -> Result<(), SniperError> {
    let cli = Cli::parse();

    let settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(if settings.debug { "debug" } else { "info" }, cli.json_logs);

    let wallet_signer = PrivateKeySigner::from_str(&settings.wallet_key)
        .map_err(|e| SniperError::Config(format!("Invalid wallet key: {}", e)))?;
    let wallet_address = wallet_signer.address();
    if wallet_address != settings.wallet_address {
        return Err(SniperError::Config(format!(
            "wallet_address {} does not match wallet_key address {}",
            settings.wallet_address, wallet_address
        )));
    }

    let target_address = parse_target_address(&cli.address)?;

    let provider = ConnectionFactory::http_with_wallet(&settings.http_provider, wallet_signer)?;
    let raw_client = RpcChainClient::new(provider, settings.chain_id);
    let client: Arc<dyn ChainClient> = Arc::new(ThrottledChainClient::new(
        Arc::new(raw_client),
        Duration::from_millis(settings.rpc_min_spacing_ms),
        Duration::from_millis(settings.rpc_timeout_ms),
    ));

    let store = FileStore::new(settings.data_path())?;
    let persistence = Arc::new(StatePersistence::new(Arc::new(store)));

    // Restore any pre-existing watch state before arming a new session.
    let restored = persistence.load_state()?;
    if !restored.sessions.is_empty() {
        tracing::info!(
            target: "persistence",
            sessions = restored.sessions.len(),
            was_active = restored.bot_active,
            "Restored previous watch state"
        );
    }

    let mut target = Target::new(target_address);
    if let Some(price) = cli.mint_price_wei.or(settings.expected_mint_price_wei) {
        target.expected_mint_price_wei = U256::from(price);
    } else if let Some(api_url) = settings.metadata_api_url.clone() {
        // Marketplace metadata is a best-effort prefill, never authoritative.
        let marketplace = MarketplaceClient::new(api_url, settings.metadata_api_key.clone());
        match marketplace.collection(target_address).await {
            Ok(Some(meta)) => {
                if let Some(name) = meta.name {
                    target.display_name = name;
                }
                if let Some(price) = meta.mint_price_wei {
                    target.expected_mint_price_wei = price;
                }
                target.expected_launch_time = meta.launch_time;
                tracing::info!(
                    target: "metadata",
                    name = %target.display_name,
                    price_wei = %target.expected_mint_price_wei,
                    "Prefilled target from marketplace metadata"
                );
            }
            Ok(None) => {
                tracing::debug!(target: "metadata", "No marketplace entry for target");
            }
            Err(e) => {
                tracing::warn!(target: "metadata", error = %e, "Metadata fetch failed, continuing without");
            }
        }
    }

    let monitor = DeploymentMonitor::new(
        client.clone(),
        settings.deploy_poll_interval(),
        Some(persistence.clone()),
    );
    monitor.restore();

    let settlement = FeeSettlement::new(
        client.clone(),
        settings.fee_recipient,
        settings.fee_bps,
        settings.fee_min(),
        settings.fee_max(),
        cli.dry_run,
    );
    let transfer = PostMintTransfer::new(client.clone(), cli.dry_run);

    let done = Arc::new(Notify::new());
    let sink = Arc::new(CliSink { done: done.clone() });

    let watcher = MintWatcher::new(
        client,
        monitor.clone(),
        settlement,
        transfer,
        persistence,
        sink,
        SnipeSettings {
            target,
            wallet: wallet_address,
            recipient: settings.recipient(),
            network: settings.chain_id,
            gas_ceiling_percentage: cli.gas_ceiling.unwrap_or(settings.gas_ceiling_percentage),
            dry_run: cli.dry_run,
        },
    );
    watcher.activate()?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            watcher.flush();
            watcher.deactivate();
        }
        _ = done.notified() => {
            watcher.flush();
        }
    }
    monitor.shutdown();
    Ok(())
}
