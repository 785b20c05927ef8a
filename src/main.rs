// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use clap::Parser;
use oxidity_farmer::app::config::GlobalSettings;
use oxidity_farmer::app::logging::setup_logging;
use oxidity_farmer::common::retry::retry_async;
use oxidity_farmer::domain::account::Account;
use oxidity_farmer::domain::error::AppError;
use oxidity_farmer::infrastructure::data::keys::load_accounts;
use oxidity_farmer::infrastructure::network::chain::RpcChainClient;
use oxidity_farmer::infrastructure::network::provider::{ConnectionFactory, build_http_client};
use oxidity_farmer::infrastructure::network::proxy::{ProxyDiscoveryConfig, fastest_proxy};
use oxidity_farmer::services::orchestrator::Orchestrator;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "oxidity farmer")]
struct Cli {
    /// Path to config file (default: config.toml if present)
    #[arg(long)]
    config: Option<String>,

    /// Private key file (overrides config/env)
    #[arg(long)]
    keys: Option<String>,

    /// Log level or tracing directive string (overrides `debug`)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Never fall back to public proxy discovery
    #[arg(long, default_value_t = false)]
    no_free_proxies: bool,
}

/// Configured proxy, else the fastest public one (when allowed), else direct.
async fn select_proxy(settings: &GlobalSettings, allow_discovery: bool) -> Option<String> {
    if let Some(proxy) = settings.proxy_url() {
        tracing::info!(target: "proxy", proxy, "Using configured proxy");
        return Some(proxy.to_string());
    }
    if !allow_discovery {
        tracing::info!(target: "proxy", "Proxy discovery disabled; connecting directly");
        return None;
    }
    match fastest_proxy(&ProxyDiscoveryConfig::default()).await {
        Ok(Some(found)) => {
            tracing::info!(
                target: "proxy",
                proxy = %found.url,
                latency_ms = found.latency.as_millis() as u64,
                "Using discovered proxy"
            );
            Some(found.url)
        }
        Ok(None) => {
            tracing::warn!(target: "proxy", "No working public proxy; connecting directly");
            None
        }
        Err(e) => {
            tracing::warn!(target: "proxy", error = %e, "Proxy discovery failed; connecting directly");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let settings = GlobalSettings::load_with_path(cli.config.as_deref())?.with_keys_path(cli.keys);
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| if settings.debug { "debug" } else { "info" }.to_string());
    setup_logging(&level, cli.json_logs || settings.log_json);

    let accounts = load_accounts(&settings.private_keys_path, settings.private_keys_range)?;
    let funder = Account::from_private_key(&settings.funder_private_key)
        .map_err(|_| AppError::Config("Invalid FUNDER_PRIVATE_KEY".into()))?;

    let allow_discovery = settings.use_free_proxies && !cli.no_free_proxies;
    let proxy = select_proxy(&settings, allow_discovery).await;
    let http = build_http_client(proxy.as_deref())?;

    let provider = ConnectionFactory::http(&settings.rpc_url, http.clone())?;
    let chain_id = settings.chain_id;
    let chain = retry_async(
        |attempt| {
            let provider = provider.clone();
            async move {
                if attempt > 1 {
                    tracing::warn!(target: "rpc", attempt, "Retrying RPC connection");
                }
                RpcChainClient::connect(provider, chain_id).await
            }
        },
        3,
        Duration::from_secs(1),
    )
    .await?;
    tracing::info!(
        target: "config",
        rpc = %settings.rpc_url,
        chain_id = settings.chain_id,
        accounts = accounts.len(),
        funder = funder.label(),
        "Connected"
    );

    let orchestrator = Orchestrator::new(
        Arc::new(chain),
        Arc::new(settings),
        http,
        accounts,
        funder,
    );
    orchestrator.install_ctrl_c();
    orchestrator.run().await?;
    tracing::info!(target: "shutdown", "Stopped by user");
    Ok(())
}
