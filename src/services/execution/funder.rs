// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::format_native;
use crate::domain::account::Account;
use crate::domain::constants::TRANSFER_GAS_LIMIT;
use crate::network::chain::ChainClient;
use crate::services::execution::executor::TransactionExecutor;
use crate::services::execution::intent::{TransactionIntent, TransactionOutcome};
use alloy::primitives::{Address, U256};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Fails with [`AppError::FunderDepleted`] unless `balance` covers the top-up
/// plus its worst-case gas.
pub fn ensure_funder_covers(balance: U256, amount: U256, gas_cost: U256) -> Result<(), AppError> {
    let required = amount.saturating_add(gas_cost);
    if balance < required {
        return Err(AppError::FunderDepleted {
            required: format_native(required),
            available: format_native(balance),
        });
    }
    Ok(())
}

struct FundingRequest {
    target: Address,
    reply: oneshot::Sender<Result<TransactionOutcome, AppError>>,
}

/// Cloneable entry point to the funding actor.
#[derive(Clone)]
pub struct FunderHandle {
    tx: mpsc::Sender<FundingRequest>,
    amount: U256,
}

impl FunderHandle {
    pub fn amount(&self) -> U256 {
        self.amount
    }

    /// Queue a top-up for `target` and wait for its outcome. Requests are served
    /// one at a time, so the funder never has two transfers in flight.
    pub async fn top_up(&self, target: Address) -> Result<TransactionOutcome, AppError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(FundingRequest { target, reply })
            .await
            .map_err(|_| AppError::Initialization("funding actor is not running".into()))?;
        rx.await
            .map_err(|_| AppError::Initialization("funding actor dropped the request".into()))?
    }
}

/// Reserve account that tops up under-funded accounts with a fixed amount.
pub struct Funder<C> {
    account: Account,
    amount: U256,
    executor: TransactionExecutor<C>,
}

impl<C: ChainClient> Funder<C> {
    /// `executor` must not carry a funder handle of its own.
    pub fn new(account: Account, amount: U256, executor: TransactionExecutor<C>) -> Self {
        Self {
            account,
            amount,
            executor,
        }
    }

    pub fn address(&self) -> Address {
        self.account.address()
    }

    pub async fn top_up(&self, target: Address) -> Result<TransactionOutcome, AppError> {
        let chain = self.executor.chain();
        let balance = chain.get_balance(self.account.address()).await?;
        let fees = self.executor.gas_oracle().estimate_eip1559_fees().await?;
        let gas_cost = U256::from(TRANSFER_GAS_LIMIT) * U256::from(fees.max_fee_per_gas);
        if let Err(e) = ensure_funder_covers(balance, self.amount, gas_cost) {
            tracing::error!(
                target: "funder",
                funder = self.account.label(),
                balance = %format_native(balance),
                amount = %format_native(self.amount),
                "Funder balance too low; top-up refused"
            );
            return Err(e);
        }

        tracing::info!(
            target: "funder",
            funder = self.account.label(),
            target_account = %target,
            amount = %format_native(self.amount),
            "Sending top-up"
        );
        let intent = TransactionIntent::transfer(target, self.amount)
            .with_gas_limit(TRANSFER_GAS_LIMIT)
            .with_fees(fees.max_fee_per_gas, fees.max_priority_fee_per_gas);
        let outcome = self.executor.execute(&self.account, &intent).await?;
        if !outcome.success {
            return Err(AppError::Transaction {
                hash: format!("{:#x}", outcome.hash),
                reason: "top-up transfer reverted".into(),
            });
        }
        Ok(outcome)
    }

    /// Move the funder into its own task. The task exits when every handle is
    /// dropped or `shutdown` fires.
    pub fn spawn(self, shutdown: CancellationToken) -> (FunderHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<FundingRequest>(64);
        let handle = FunderHandle {
            tx,
            amount: self.amount,
        };
        let task = tokio::spawn(async move {
            loop {
                let request = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    next = rx.recv() => match next {
                        Some(request) => request,
                        None => break,
                    },
                };
                let result = self.top_up(request.target).await;
                if let Err(e) = &result {
                    tracing::warn!(target: "funder", target_account = %request.target, error = %e, "Top-up failed");
                }
                let _ = request.reply.send(result);
            }
            tracing::info!(target: "funder", "Funding actor stopped");
        });
        (handle, task)
    }
}
