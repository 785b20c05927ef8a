// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::{ChainError, ChainErrorKind};
use crate::network::provider::HttpProvider;
use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use std::future::Future;

/// What the executor needs from a mined receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub success: bool,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    pub block_number: Option<u64>,
}

/// Remote chain operations used by the executor and funder.
///
/// Implementations report failures as [`ChainError`] with a classified kind;
/// callers never inspect vendor error text.
pub trait ChainClient: Send + Sync + 'static {
    fn chain_id(&self) -> u64;

    fn get_balance(&self, address: Address)
    -> impl Future<Output = Result<U256, ChainError>> + Send;

    /// Pending-tag nonce.
    fn get_transaction_count(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<u64, ChainError>> + Send;

    fn get_gas_price(&self) -> impl Future<Output = Result<u128, ChainError>> + Send;

    /// Base fee of the latest block, `None` on pre-London style chains.
    fn get_base_fee(&self) -> impl Future<Output = Result<Option<u128>, ChainError>> + Send;

    fn get_block_timestamp(&self) -> impl Future<Output = Result<u64, ChainError>> + Send;

    fn estimate_gas(
        &self,
        request: TransactionRequest,
    ) -> impl Future<Output = Result<u64, ChainError>> + Send;

    fn send_raw_transaction(
        &self,
        raw: Bytes,
    ) -> impl Future<Output = Result<B256, ChainError>> + Send;

    fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> impl Future<Output = Result<Option<ReceiptSummary>, ChainError>> + Send;
}

// Lowercased markers, first match wins. Order matters: funding markers are checked
// before the generic revert marker because some nodes wrap them in a revert message.
const INSUFFICIENT_FUNDS_MARKERS: &[&str] = &[
    "signer had insufficient balance",
    "insufficient balance",
    "insufficient funds",
    "intrinsic gas greater than limit",
];
// Status codes only count next to HTTP wording; bare digits show up in revert data and nonces.
const RATE_LIMIT_MARKERS: &[&str] = &[
    "http error 429",
    "status 429",
    "code 429",
    "429 too many requests",
    "too many requests",
    "rate limit",
    "ratelimit",
];
const OUT_OF_GAS_MARKERS: &[&str] = &["out of gas", "gas required exceeds allowance"];
const NONCE_MARKERS: &[&str] = &[
    "nonce too low",
    "nonce too high",
    "already known",
    "replacement transaction underpriced",
];
const REVERT_MARKERS: &[&str] = &["execution reverted", "revert"];
const TRANSPORT_MARKERS: &[&str] = &[
    "error sending request",
    "connection refused",
    "connection reset",
    "timed out",
    "timeout",
    "dns error",
    "proxy",
    "bad gateway",
    "service unavailable",
    "gateway timeout",
    "http error 502",
    "http error 503",
    "http error 504",
];

/// Drops `0x`-prefixed hex runs (revert data, addresses, hashes) so markers only
/// match the human-readable part of the message.
fn strip_hex_payloads(lower: &str) -> String {
    let mut out = String::with_capacity(lower.len());
    let mut rest = lower;
    while let Some(idx) = rest.find("0x") {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx + 2..];
        let hex_len = tail
            .find(|c: char| !c.is_ascii_hexdigit())
            .unwrap_or(tail.len());
        if hex_len == 0 {
            out.push_str("0x");
        }
        rest = &tail[hex_len..];
    }
    out.push_str(rest);
    out
}

/// Translate node/vendor error text into a [`ChainErrorKind`].
pub fn classify_rpc_error(message: &str) -> ChainErrorKind {
    let lower = strip_hex_payloads(&message.to_ascii_lowercase());
    let hit = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    if hit(INSUFFICIENT_FUNDS_MARKERS) {
        ChainErrorKind::InsufficientFunds
    } else if hit(RATE_LIMIT_MARKERS) {
        ChainErrorKind::RateLimited
    } else if hit(OUT_OF_GAS_MARKERS) {
        ChainErrorKind::OutOfGas
    } else if hit(NONCE_MARKERS) {
        ChainErrorKind::NonceConflict
    } else if hit(REVERT_MARKERS) {
        ChainErrorKind::Reverted
    } else if hit(TRANSPORT_MARKERS) {
        ChainErrorKind::Transport
    } else {
        ChainErrorKind::Unknown
    }
}

fn classified<E: std::fmt::Display>(err: E) -> ChainError {
    let message = err.to_string();
    ChainError::new(classify_rpc_error(&message), message)
}

/// JSON-RPC backed [`ChainClient`].
#[derive(Clone)]
pub struct RpcChainClient {
    provider: HttpProvider,
    chain_id: u64,
}

impl RpcChainClient {
    pub fn new(provider: HttpProvider, chain_id: u64) -> Self {
        Self { provider, chain_id }
    }

    /// Connects and checks the node reports the expected chain id.
    pub async fn connect(provider: HttpProvider, expected_chain_id: u64) -> Result<Self, ChainError> {
        let reported = provider.get_chain_id().await.map_err(classified)?;
        if reported != expected_chain_id {
            return Err(ChainError::new(
                ChainErrorKind::Unknown,
                format!("rpc reports chain id {reported}, expected {expected_chain_id}"),
            ));
        }
        tracing::info!(target: "rpc", chain_id = reported, "Connected to RPC");
        Ok(Self::new(provider, reported))
    }
}

impl ChainClient for RpcChainClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn get_balance(&self, address: Address) -> Result<U256, ChainError> {
        self.provider.get_balance(address).await.map_err(classified)
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64, ChainError> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(classified)
    }

    async fn get_gas_price(&self) -> Result<u128, ChainError> {
        self.provider.get_gas_price().await.map_err(classified)
    }

    async fn get_base_fee(&self) -> Result<Option<u128>, ChainError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(classified)?;
        Ok(block.and_then(|b| b.header.base_fee_per_gas.map(u128::from)))
    }

    async fn get_block_timestamp(&self) -> Result<u64, ChainError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(classified)?
            .ok_or_else(|| ChainError::new(ChainErrorKind::Transport, "latest block missing"))?;
        Ok(block.header.timestamp)
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64, ChainError> {
        self.provider.estimate_gas(request).await.map_err(classified)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ChainError> {
        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(classified)?;
        Ok(*pending.tx_hash())
    }

    async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<ReceiptSummary>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(classified)?;
        Ok(receipt.map(|r| ReceiptSummary {
            success: r.status(),
            gas_used: r.gas_used,
            effective_gas_price: r.effective_gas_price,
            block_number: r.block_number,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn funding_markers_are_recognised() {
        for msg in [
            "Signer had insufficient balance",
            "server returned an error response: error code -32000: insufficient funds for gas * price + value",
            "intrinsic gas greater than limit",
        ] {
            assert_eq!(classify_rpc_error(msg), ChainErrorKind::InsufficientFunds, "{msg}");
        }
    }

    #[test]
    fn rate_limit_markers_are_recognised() {
        assert_eq!(
            classify_rpc_error("HTTP error 429 with body: Too Many Requests"),
            ChainErrorKind::RateLimited
        );
        assert_eq!(
            classify_rpc_error("request rate limit exceeded"),
            ChainErrorKind::RateLimited
        );
    }

    #[test]
    fn funding_wins_over_revert_wrapper() {
        assert_eq!(
            classify_rpc_error("execution reverted: insufficient balance"),
            ChainErrorKind::InsufficientFunds
        );
    }

    const ZONA_UNRESOLVED_REVERT: &str = "server returned an error response: error code 3: execution reverted: Position is not resolvable (actual value not yet updated), data: \"0x08c379a000000000000000000000000000000000000000000000000000000000000000200000000000000000000000000000000000000000000000000000000000000039506f736974696f6e206973206e6f74207265736f6c7661626c65202861637475616c2076616c7565206e6f742079657420757064617465642900000000000000\"";

    #[test]
    fn revert_data_digits_do_not_look_like_rate_limits() {
        assert!(ZONA_UNRESOLVED_REVERT.contains("6429"));
        assert_eq!(
            classify_rpc_error(ZONA_UNRESOLVED_REVERT),
            ChainErrorKind::Reverted
        );
    }

    #[test]
    fn realistic_node_messages_keep_their_kind() {
        let cases = [
            ("nonce too low: next nonce 1429, tx nonce 1428", ChainErrorKind::NonceConflict),
            (
                "server returned an error response: error code -32000: insufficient funds for gas * price + value: address 0x4290aBc0000000000000000000000000000502a4 have 0 want 1000",
                ChainErrorKind::InsufficientFunds,
            ),
            (
                "execution reverted: UniswapV2Router: EXPIRED, data: \"0x08c379a0503504\"",
                ChainErrorKind::Reverted,
            ),
            (
                "already known: 0x9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08",
                ChainErrorKind::NonceConflict,
            ),
            ("HTTP error 429 with empty body", ChainErrorKind::RateLimited),
            ("server returned status code 429", ChainErrorKind::RateLimited),
            ("HTTP error 503 with body: Service Unavailable", ChainErrorKind::Transport),
            ("out of gas: gas used 21429", ChainErrorKind::OutOfGas),
        ];
        for (msg, kind) in cases {
            assert_eq!(classify_rpc_error(msg), kind, "{msg}");
        }
    }

    #[test]
    fn hex_runs_are_dropped_before_matching() {
        assert_eq!(strip_hex_payloads("data: 0xdead429 end"), "data:  end");
        assert_eq!(strip_hex_payloads("a 0x b"), "a 0x b");
        assert_eq!(strip_hex_payloads("no hex"), "no hex");
    }

    #[test]
    fn other_kinds() {
        assert_eq!(classify_rpc_error("out of gas"), ChainErrorKind::OutOfGas);
        assert_eq!(classify_rpc_error("nonce too low"), ChainErrorKind::NonceConflict);
        assert_eq!(
            classify_rpc_error("execution reverted: Position is not resolvable"),
            ChainErrorKind::Reverted
        );
        assert_eq!(
            classify_rpc_error("error sending request for url"),
            ChainErrorKind::Transport
        );
        assert_eq!(
            classify_rpc_error("invalid opcode in calldata"),
            ChainErrorKind::Unknown
        );
    }
}
