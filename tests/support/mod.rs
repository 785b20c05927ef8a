// SPDX-License-Identifier: MIT
// In-memory chain used by the integration tests. Decodes the signed EIP-1559
// envelopes the executor broadcasts, recovers the sender, enforces nonces and
// balances, and can be scripted to fail specific calls with node-style errors.
#![allow(dead_code)]

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, B256, Bytes, TxKind, U256};
use alloy::rpc::types::TransactionRequest;
use oxidity_farmer::app::config::{
    AiCraftSettings, DailyCycles, ExecutionSettings, GlobalSettings, PacingSettings,
};
use oxidity_farmer::common::pacing::DelayRange;
use oxidity_farmer::common::parsing::parse_native;
use oxidity_farmer::domain::account::Account;
use oxidity_farmer::domain::error::ChainError;
use oxidity_farmer::network::chain::{ChainClient, ReceiptSummary, classify_rpc_error};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

pub const CHAIN_ID: u64 = 10143;
pub const GWEI: u128 = 1_000_000_000;

// anvil dev keys
pub const USER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const FUNDER_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const EXTRA_KEYS: [&str; 3] = [
    "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    "7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
    "47e179ec197488593b187f80a00eb0da91f1b9d0b13f8733639f19c30a34926a",
];

pub fn account(key: &str) -> Account {
    Account::from_private_key(key).expect("dev key")
}

pub fn native(amount: &str) -> U256 {
    parse_native(amount).expect("amount")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub nonce: u64,
    pub value: U256,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
}

#[derive(Default)]
struct State {
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    nonce_reads: HashMap<Address, u32>,
    estimate_errors: VecDeque<String>,
    send_errors: VecDeque<String>,
    send_attempts: u32,
    broadcasts: Vec<Broadcast>,
    receipts: HashMap<B256, ReceiptSummary>,
    reverting: HashSet<Address>,
    withhold_receipts: bool,
    block: u64,
}

pub struct MockChain {
    chain_id: u64,
    gas_price: u128,
    base_fee: Option<u128>,
    state: Mutex<State>,
}

fn node_error(message: impl Into<String>) -> ChainError {
    let message = message.into();
    ChainError::new(classify_rpc_error(&message), message)
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            chain_id: CHAIN_ID,
            gas_price: GWEI,
            base_fee: Some(GWEI),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn fund(&self, address: Address, amount: U256) {
        *self.state().balances.entry(address).or_default() += amount;
    }

    pub fn balance_of(&self, address: Address) -> U256 {
        self.state()
            .balances
            .get(&address)
            .copied()
            .unwrap_or_default()
    }

    /// Next `eth_estimateGas` calls fail with these node messages, in order.
    pub fn fail_estimates(&self, messages: &[&str]) {
        let mut state = self.state();
        state
            .estimate_errors
            .extend(messages.iter().map(|m| m.to_string()));
    }

    /// Next `eth_sendRawTransaction` calls fail with these node messages, in order.
    pub fn fail_sends(&self, messages: &[&str]) {
        let mut state = self.state();
        state
            .send_errors
            .extend(messages.iter().map(|m| m.to_string()));
    }

    pub fn revert_calls_to(&self, target: Address) {
        self.state().reverting.insert(target);
    }

    pub fn withhold_receipts(&self) {
        self.state().withhold_receipts = true;
    }

    pub fn broadcasts(&self) -> Vec<Broadcast> {
        self.state().broadcasts.clone()
    }

    pub fn broadcasts_from(&self, address: Address) -> Vec<Broadcast> {
        self.broadcasts()
            .into_iter()
            .filter(|b| b.from == address)
            .collect()
    }

    pub fn send_attempts(&self) -> u32 {
        self.state().send_attempts
    }

    pub fn nonce_reads(&self, address: Address) -> u32 {
        self.state()
            .nonce_reads
            .get(&address)
            .copied()
            .unwrap_or_default()
    }

    fn intrinsic_gas(input: &[u8]) -> u64 {
        if input.is_empty() { 21_000 } else { 60_000 }
    }
}

impl ChainClient for MockChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn get_balance(&self, address: Address) -> Result<U256, ChainError> {
        Ok(self.balance_of(address))
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64, ChainError> {
        let mut state = self.state();
        *state.nonce_reads.entry(address).or_default() += 1;
        Ok(state.nonces.get(&address).copied().unwrap_or_default())
    }

    async fn get_gas_price(&self) -> Result<u128, ChainError> {
        Ok(self.gas_price)
    }

    async fn get_base_fee(&self) -> Result<Option<u128>, ChainError> {
        Ok(self.base_fee)
    }

    async fn get_block_timestamp(&self) -> Result<u64, ChainError> {
        Ok(1_700_000_000)
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64, ChainError> {
        let mut state = self.state();
        if let Some(message) = state.estimate_errors.pop_front() {
            return Err(node_error(message));
        }
        let from = request.from.unwrap_or_default();
        let value = request.value.unwrap_or_default();
        let balance = state.balances.get(&from).copied().unwrap_or_default();
        if value > balance {
            return Err(node_error(format!(
                "insufficient funds for transfer: have {balance} want {value}"
            )));
        }
        let input = request.input.input().cloned().unwrap_or_default();
        Ok(Self::intrinsic_gas(&input))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ChainError> {
        let mut state = self.state();
        state.send_attempts += 1;
        if let Some(message) = state.send_errors.pop_front() {
            return Err(node_error(message));
        }

        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref())
            .map_err(|e| node_error(format!("rlp: {e}")))?;
        let TxEnvelope::Eip1559(signed) = &envelope else {
            return Err(node_error("unsupported transaction type"));
        };
        let from = signed
            .recover_signer()
            .map_err(|e| node_error(format!("invalid signature: {e}")))?;
        let tx = signed.tx();
        if tx.chain_id != self.chain_id {
            return Err(node_error("invalid chain id"));
        }

        let expected = state.nonces.get(&from).copied().unwrap_or_default();
        if tx.nonce < expected {
            return Err(node_error(format!("nonce too low: next {expected}, tx {}", tx.nonce)));
        }
        if tx.nonce > expected {
            return Err(node_error(format!("nonce too high: next {expected}, tx {}", tx.nonce)));
        }

        let balance = state.balances.get(&from).copied().unwrap_or_default();
        let worst_case = tx.value + U256::from(tx.gas_limit) * U256::from(tx.max_fee_per_gas);
        if balance < worst_case {
            return Err(node_error(format!(
                "insufficient funds for gas * price + value: have {balance} want {worst_case}"
            )));
        }

        let to = match tx.to {
            TxKind::Call(to) => Some(to),
            TxKind::Create => None,
        };
        let base_fee = self.base_fee.unwrap_or_default();
        let effective_gas_price = tx
            .max_fee_per_gas
            .min(base_fee + tx.max_priority_fee_per_gas);
        let gas_used = Self::intrinsic_gas(&tx.input).min(tx.gas_limit);
        let success = to.is_none_or(|t| !state.reverting.contains(&t));
        let fee = U256::from(gas_used) * U256::from(effective_gas_price);
        let spent = if success { tx.value + fee } else { fee };

        *state.balances.entry(from).or_default() -= spent;
        if success && let Some(to) = to {
            *state.balances.entry(to).or_default() += tx.value;
        }
        *state.nonces.entry(from).or_default() += 1;
        state.block += 1;

        let hash = *signed.hash();
        let block_number = Some(state.block);
        state.receipts.insert(
            hash,
            ReceiptSummary {
                success,
                gas_used,
                effective_gas_price,
                block_number,
            },
        );
        state.broadcasts.push(Broadcast {
            hash,
            from,
            to,
            nonce: tx.nonce,
            value: tx.value,
            gas_limit: tx.gas_limit,
            max_fee_per_gas: tx.max_fee_per_gas,
        });
        Ok(hash)
    }

    async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<ReceiptSummary>, ChainError> {
        let state = self.state();
        if state.withhold_receipts {
            return Ok(None);
        }
        Ok(state.receipts.get(&hash).cloned())
    }
}

/// Settings with every pause collapsed to zero and a single wrap cycle.
pub fn quiet_settings() -> GlobalSettings {
    GlobalSettings {
        debug: false,
        log_json: false,
        rpc_url: "http://127.0.0.1:8545".into(),
        chain_id: CHAIN_ID,
        explorer_url: String::new(),
        proxy: None,
        use_free_proxies: false,
        private_keys_path: "private_keys.txt".into(),
        private_keys_range: None,
        funder_private_key: FUNDER_KEY.into(),
        fund_amount: 0.5,
        execution: ExecutionSettings {
            receipt_poll_ms: 10,
            ..ExecutionSettings::default()
        },
        pacing: PacingSettings {
            step_delay_secs: DelayRange::new(0, 0),
            cycle_delay_secs: DelayRange::new(0, 0),
            daily_rest_hours: DelayRange::new(0, 0),
            unstake_delay_secs: DelayRange::new(0, 0),
        },
        daily: DailyCycles {
            stakers: 0,
            wrap: 1,
            uniswap: 0,
            bean: 0,
            monorail: 0,
            zona: 0,
        },
        stakers: vec!["kintsu".into(), "apriori".into(), "magma".into()],
        aicraft: AiCraftSettings {
            enabled: false,
            ..AiCraftSettings::default()
        },
        swap_tokens: Vec::new(),
    }
}
