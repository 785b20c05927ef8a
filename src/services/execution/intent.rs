// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, B256, Bytes, U256};

pub use crate::network::chain::ReceiptSummary;

/// What to send, independent of nonce and fees. Built once per activity step;
/// nonce, gas and fee fields are recomputed on every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: Option<u64>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

impl TransactionIntent {
    pub fn call(to: Address, value: U256, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            value,
            data: data.into(),
            gas_limit: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
        }
    }

    /// Plain native-value transfer.
    pub fn transfer(to: Address, value: U256) -> Self {
        Self::call(to, value, Bytes::new())
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn with_fees(mut self, max_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> Self {
        self.max_fee_per_gas = Some(max_fee_per_gas);
        self.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        self
    }
}

/// Concrete parameters of a single broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptParams {
    pub nonce: u64,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl AttemptParams {
    /// Upper bound of what the attempt can cost on top of `value`.
    pub fn max_gas_cost(&self) -> U256 {
        U256::from(self.gas_limit) * U256::from(self.max_fee_per_gas)
    }
}

/// Terminal result of an executed intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub hash: B256,
    pub success: bool,
    pub nonce: u64,
    pub gas_used: u64,
    pub fee_paid: U256,
    pub block_number: Option<u64>,
    /// Broadcasts made for this intent, including the final one.
    pub broadcasts: u32,
}

impl TransactionOutcome {
    pub fn from_receipt(hash: B256, nonce: u64, receipt: &ReceiptSummary, broadcasts: u32) -> Self {
        Self {
            hash,
            success: receipt.success,
            nonce,
            gas_used: receipt.gas_used,
            fee_paid: U256::from(receipt.gas_used) * U256::from(receipt.effective_gas_price),
            block_number: receipt.block_number,
            broadcasts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_paid_is_gas_times_price() {
        let receipt = ReceiptSummary {
            success: true,
            gas_used: 21_000,
            effective_gas_price: 2_000_000_000,
            block_number: Some(5),
        };
        let outcome = TransactionOutcome::from_receipt(B256::ZERO, 3, &receipt, 1);
        assert_eq!(outcome.fee_paid, U256::from(42_000_000_000_000u64));
        assert!(outcome.success);
        assert_eq!(outcome.nonce, 3);
    }

    #[test]
    fn builders_set_overrides() {
        let intent = TransactionIntent::transfer(Address::ZERO, U256::from(1))
            .with_gas_limit(21_000)
            .with_fees(10, 1);
        assert_eq!(intent.gas_limit, Some(21_000));
        assert_eq!(intent.max_fee_per_gas, Some(10));
        assert!(intent.data.is_empty());
    }

    #[test]
    fn max_gas_cost_multiplies_limit_and_cap() {
        let params = AttemptParams {
            nonce: 0,
            gas_limit: 21_000,
            max_fee_per_gas: 100,
            max_priority_fee_per_gas: 1,
        };
        assert_eq!(params.max_gas_cost(), U256::from(2_100_000u64));
    }
}
