// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::BPS_DENOMINATOR;
use crate::domain::error::ChainError;
use crate::network::chain::ChainClient;
use std::sync::{Arc, Mutex};

/// Floor for the priority tip when the node quotes a tiny gas price.
const MIN_PRIORITY_FEE_WEI: u128 = 1_000_000_000;

pub struct GasOracle<C> {
    chain: Arc<C>,
    last_good: Arc<Mutex<Option<GasFees>>>,
}

impl<C> Clone for GasOracle<C> {
    fn clone(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            last_good: self.last_good.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasFees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    /// Latest block base fee, when the chain reports one.
    pub base_fee_per_gas: Option<u128>,
}

impl GasFees {
    /// Derive EIP-1559 caps from the latest base fee and the node's gas price quote.
    /// The cap leaves 50% headroom over the base fee for the next few blocks.
    pub fn from_quotes(base_fee: Option<u128>, gas_price: u128) -> Self {
        let priority = (gas_price / 10).max(MIN_PRIORITY_FEE_WEI);
        let max_fee = match base_fee {
            Some(base) => base
                .saturating_mul(3)
                .saturating_div(2)
                .saturating_add(priority)
                .max(gas_price),
            None => gas_price.saturating_add(priority),
        };
        Self {
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: priority.min(max_fee),
            base_fee_per_gas: base_fee,
        }
    }

    /// Scale both caps by `bump_bps / 10_000` once per prior attempt.
    pub fn bumped(&self, bump_bps: u64, times: u32) -> Self {
        let mut out = *self;
        for _ in 0..times {
            out.max_fee_per_gas = scale_bps(out.max_fee_per_gas, bump_bps);
            out.max_priority_fee_per_gas = scale_bps(out.max_priority_fee_per_gas, bump_bps);
        }
        out
    }
}

pub fn scale_bps(value: u128, bps: u64) -> u128 {
    value.saturating_mul(bps as u128) / BPS_DENOMINATOR
}

impl<C: ChainClient> GasOracle<C> {
    pub fn new(chain: Arc<C>) -> Self {
        Self {
            chain,
            last_good: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn estimate_eip1559_fees(&self) -> Result<GasFees, ChainError> {
        match self.fetch().await {
            Ok(fees) => {
                if let Ok(mut guard) = self.last_good.lock() {
                    *guard = Some(fees);
                }
                Ok(fees)
            }
            Err(e) => {
                if let Ok(guard) = self.last_good.lock()
                    && let Some(fees) = *guard
                {
                    tracing::debug!(target: "rpc", error = %e, "Fee quote failed; reusing last good fees");
                    return Ok(fees);
                }
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<GasFees, ChainError> {
        let base_fee = self.chain.get_base_fee().await?;
        let gas_price = self.chain.get_gas_price().await?;
        Ok(GasFees::from_quotes(base_fee, gas_price))
    }
}
