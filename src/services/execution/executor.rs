// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::format_native;
use crate::common::retry::BackoffPolicy;
use crate::domain::account::Account;
use crate::domain::error::ChainErrorKind;
use crate::network::chain::{ChainClient, ReceiptSummary};
use crate::network::gas::{GasFees, GasOracle, scale_bps};
use crate::services::execution::funder::FunderHandle;
use crate::services::execution::intent::{AttemptParams, TransactionIntent, TransactionOutcome};
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{B256, Bytes, TxKind};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPolicy {
    pub receipt_timeout: Duration,
    pub receipt_poll: Duration,
    /// Multiplier applied to `eth_estimateGas`, in basis points.
    pub gas_limit_buffer_bps: u64,
    /// Per-retry multiplier for gas limit and fee caps, in basis points.
    pub gas_bump_bps: u64,
    pub max_funding_retries: u32,
    pub rate_limit: BackoffPolicy,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            receipt_timeout: Duration::from_secs(120),
            receipt_poll: Duration::from_millis(1500),
            gas_limit_buffer_bps: 11_000,
            gas_bump_bps: 12_000,
            max_funding_retries: 2,
            rate_limit: BackoffPolicy::new(Duration::from_secs(2), 3),
        }
    }
}

/// Drives a [`TransactionIntent`] to a mined receipt.
///
/// Each attempt re-reads the nonce, quotes fees, estimates gas, signs and
/// broadcasts exactly one transaction, then polls for the receipt. Two failure
/// classes are recovered here: insufficient funds (top-up through the funder,
/// then retry) and rate limiting (exponential backoff). Everything else is
/// returned to the caller untouched.
pub struct TransactionExecutor<C> {
    chain: Arc<C>,
    gas: GasOracle<C>,
    policy: ExecutionPolicy,
    funder: Option<FunderHandle>,
    explorer_url: Option<String>,
}

impl<C: ChainClient> TransactionExecutor<C> {
    pub fn new(chain: Arc<C>, policy: ExecutionPolicy) -> Self {
        Self {
            gas: GasOracle::new(chain.clone()),
            chain,
            policy,
            funder: None,
            explorer_url: None,
        }
    }

    pub fn with_funder(mut self, funder: FunderHandle) -> Self {
        self.funder = Some(funder);
        self
    }

    pub fn with_explorer(mut self, explorer_url: impl Into<String>) -> Self {
        let url = explorer_url.into();
        self.explorer_url = (!url.trim().is_empty()).then_some(url);
        self
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    pub fn gas_oracle(&self) -> &GasOracle<C> {
        &self.gas
    }

    pub async fn execute(
        &self,
        account: &Account,
        intent: &TransactionIntent,
    ) -> Result<TransactionOutcome, AppError> {
        let mut funding_retries = 0u32;
        let mut rate_limit_retries = 0u32;
        let mut broadcasts = 0u32;

        loop {
            let retry = funding_retries + rate_limit_retries;
            let err = match self.attempt(account, intent, retry, &mut broadcasts).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) => err,
            };

            match err.chain_kind() {
                Some(ChainErrorKind::InsufficientFunds) => {
                    let Some(funder) = &self.funder else {
                        return Err(err);
                    };
                    if funding_retries >= self.policy.max_funding_retries {
                        tracing::warn!(
                            target: "executor",
                            account = account.label(),
                            top_ups = funding_retries,
                            "Still underfunded after top-ups; giving up"
                        );
                        return Err(AppError::FundingExhausted {
                            attempts: funding_retries,
                        });
                    }
                    funding_retries += 1;
                    tracing::warn!(
                        target: "executor",
                        account = account.label(),
                        amount = %format_native(funder.amount()),
                        attempt = funding_retries,
                        "Insufficient balance; requesting top-up from funder"
                    );
                    funder.top_up(account.address()).await?;
                }
                Some(ChainErrorKind::RateLimited) => {
                    let Some(delay) = self.policy.rate_limit.delay_for(rate_limit_retries) else {
                        tracing::warn!(
                            target: "executor",
                            account = account.label(),
                            retries = rate_limit_retries,
                            "Rate limit persisted; giving up"
                        );
                        return Err(AppError::RateLimited {
                            attempts: rate_limit_retries + 1,
                        });
                    };
                    rate_limit_retries += 1;
                    tracing::warn!(
                        target: "executor",
                        account = account.label(),
                        delay_ms = delay.as_millis() as u64,
                        retry = rate_limit_retries,
                        "Rate limited; backing off"
                    );
                    sleep(delay).await;
                }
                _ => return Err(err),
            }
        }
    }

    async fn attempt(
        &self,
        account: &Account,
        intent: &TransactionIntent,
        retry: u32,
        broadcasts: &mut u32,
    ) -> Result<TransactionOutcome, AppError> {
        let address = account.address();
        let nonce = self.chain.get_transaction_count(address).await?;
        let fees = self.fees_for(intent).await?.bumped(self.policy.gas_bump_bps, retry);

        let base_gas_limit = match intent.gas_limit {
            Some(limit) => limit,
            None => {
                let request = TransactionRequest::default()
                    .from(address)
                    .to(intent.to)
                    .value(intent.value)
                    .input(TransactionInput::new(intent.data.clone()));
                let estimate = self.chain.estimate_gas(request).await?;
                scale_bps(estimate as u128, self.policy.gas_limit_buffer_bps) as u64
            }
        };
        let mut gas_limit = base_gas_limit;
        for _ in 0..retry {
            gas_limit = scale_bps(gas_limit as u128, self.policy.gas_bump_bps) as u64;
        }

        let params = AttemptParams {
            nonce,
            gas_limit,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        };
        let (raw, local_hash) = self.sign(account, intent, &params)?;

        tracing::debug!(
            target: "executor",
            account = account.label(),
            to = %intent.to,
            value = %format_native(intent.value),
            nonce,
            gas_limit,
            max_fee = fees.max_fee_per_gas,
            max_gas_cost = %format_native(params.max_gas_cost()),
            retry,
            "Submitting transaction"
        );
        let hash = self.chain.send_raw_transaction(raw).await?;
        *broadcasts += 1;
        if hash != local_hash {
            tracing::warn!(
                target: "executor",
                local = %local_hash,
                remote = %hash,
                "Node returned a different transaction hash"
            );
        }
        tracing::info!(
            target: "executor",
            account = account.label(),
            nonce,
            hash = %format!("{hash:#x}"),
            "Transaction sent"
        );

        let receipt = self.await_receipt(hash).await?;
        let outcome = TransactionOutcome::from_receipt(hash, nonce, &receipt, *broadcasts);
        let link = self.explorer_link(&hash);
        if outcome.success {
            tracing::info!(
                target: "executor",
                account = account.label(),
                nonce,
                block = ?outcome.block_number,
                gas_used = outcome.gas_used,
                fee = %format_native(outcome.fee_paid),
                link = %link,
                "Transaction confirmed"
            );
        } else {
            tracing::warn!(
                target: "executor",
                account = account.label(),
                nonce,
                gas_used = outcome.gas_used,
                fee = %format_native(outcome.fee_paid),
                link = %link,
                "Transaction reverted"
            );
        }
        Ok(outcome)
    }

    async fn fees_for(&self, intent: &TransactionIntent) -> Result<GasFees, AppError> {
        if let (Some(max_fee), Some(priority)) =
            (intent.max_fee_per_gas, intent.max_priority_fee_per_gas)
        {
            return Ok(GasFees {
                max_fee_per_gas: max_fee,
                max_priority_fee_per_gas: priority.min(max_fee),
                base_fee_per_gas: None,
            });
        }
        Ok(self.gas.estimate_eip1559_fees().await?)
    }

    fn sign(
        &self,
        account: &Account,
        intent: &TransactionIntent,
        params: &AttemptParams,
    ) -> Result<(Bytes, B256), AppError> {
        let mut tx = TxEip1559 {
            chain_id: self.chain.chain_id(),
            nonce: params.nonce,
            gas_limit: params.gas_limit,
            max_fee_per_gas: params.max_fee_per_gas,
            max_priority_fee_per_gas: params.max_priority_fee_per_gas,
            to: TxKind::Call(intent.to),
            value: intent.value,
            access_list: Default::default(),
            input: intent.data.clone(),
        };
        let sig = TxSignerSync::sign_transaction_sync(account.signer(), &mut tx)
            .map_err(|e| AppError::Transaction {
                hash: String::new(),
                reason: format!("Sign tx failed: {e}"),
            })?;
        let signed: TxEnvelope = tx.into_signed(sig).into();
        let hash = *signed.tx_hash();
        Ok((signed.encoded_2718().into(), hash))
    }

    async fn await_receipt(&self, hash: B256) -> Result<ReceiptSummary, AppError> {
        let timeout = self.policy.receipt_timeout;
        let poll = self.policy.receipt_poll.max(Duration::from_millis(1));
        let started = Instant::now();

        loop {
            match self.chain.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        target: "executor",
                        error = %e,
                        hash = %format!("{hash:#x}"),
                        "Receipt lookup error; retrying"
                    );
                }
            }
            if started.elapsed() >= timeout {
                return Err(AppError::ReceiptTimeout {
                    hash: format!("{hash:#x}"),
                });
            }
            sleep(poll).await;
        }
    }

    pub fn explorer_link(&self, hash: &B256) -> String {
        match &self.explorer_url {
            Some(base) => format!("{base}{hash:#x}"),
            None => format!("{hash:#x}"),
        }
    }
}
