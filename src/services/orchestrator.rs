// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::app::config::GlobalSettings;
use crate::common::error::AppError;
use crate::common::parsing::format_native;
use crate::domain::account::Account;
use crate::network::chain::ChainClient;
use crate::services::activity::ActivityContext;
use crate::services::execution::{Funder, TransactionExecutor};
use crate::services::runner::ActivityRunner;
use futures::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs one [`ActivityRunner`] per account and a shared funding actor until
/// shutdown is requested.
pub struct Orchestrator<C> {
    chain: Arc<C>,
    settings: Arc<GlobalSettings>,
    http: reqwest::Client,
    accounts: Vec<Account>,
    funder: Account,
    shutdown: CancellationToken,
}

impl<C: ChainClient> Orchestrator<C> {
    pub fn new(
        chain: Arc<C>,
        settings: Arc<GlobalSettings>,
        http: reqwest::Client,
        accounts: Vec<Account>,
        funder: Account,
    ) -> Self {
        Self {
            chain,
            settings,
            http,
            accounts,
            funder,
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancel everything on Ctrl+C.
    pub fn install_ctrl_c(&self) {
        let shutdown_on_ctrlc = self.shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!(target: "shutdown", "Ctrl+C received; stopping after in-flight transactions");
                shutdown_on_ctrlc.cancel();
            }
        });
    }

    pub async fn run(self) -> Result<(), AppError> {
        if self.accounts.is_empty() {
            return Err(AppError::Config("No accounts to run".into()));
        }
        let settings = self.settings;
        let policy = settings.execution.policy();
        let fund_amount = settings.fund_amount_wei();

        let funder_executor = TransactionExecutor::new(self.chain.clone(), policy.clone())
            .with_explorer(settings.explorer_url.clone());
        let funder = Funder::new(self.funder, fund_amount, funder_executor);
        let funder_address = funder.address();
        let (funder_handle, funder_task) = funder.spawn(self.shutdown.clone());

        let executor = Arc::new(
            TransactionExecutor::new(self.chain.clone(), policy)
                .with_funder(funder_handle)
                .with_explorer(settings.explorer_url.clone()),
        );

        let referral = Some(settings.aicraft.referral_code.clone());
        let mut tasks = Vec::with_capacity(self.accounts.len());
        for account in self.accounts {
            let context = ActivityContext::new(
                self.chain.clone(),
                self.http.clone(),
                referral.clone(),
                settings.aicraft.daily_votes,
            );
            let runner = ActivityRunner::new(
                account,
                executor.clone(),
                context,
                settings.clone(),
                self.shutdown.clone(),
            );
            tasks.push(tokio::spawn(runner.run()));
        }
        tracing::info!(
            target: "orchestrator",
            accounts = tasks.len(),
            funder = %funder_address,
            fund_amount = %format_native(fund_amount),
            chain_id = self.chain.chain_id(),
            "Runners started"
        );

        for result in join_all(tasks).await {
            if let Err(e) = result {
                tracing::error!(target: "orchestrator", error = %e, "Runner task failed");
            }
        }

        // Last handle lives in the executor; dropping it lets the actor drain.
        drop(executor);
        if let Err(e) = funder_task.await {
            tracing::error!(target: "orchestrator", error = %e, "Funding actor failed");
        }
        tracing::info!(target: "orchestrator", "All runners stopped");
        Ok(())
    }
}
