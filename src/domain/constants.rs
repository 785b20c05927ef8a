// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, address};
use lazy_static::lazy_static;
use std::collections::HashMap;

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_MONAD_TESTNET: u64 = 10143;
pub const DEFAULT_RPC_URL: &str = "https://testnet-rpc.monad.xyz";
pub const DEFAULT_EXPLORER_TX_URL: &str = "https://testnet.monadexplorer.com/tx/";
pub const NATIVE_SYMBOL: &str = "MON";

// =============================================================================
// GAS & TRANSACTION CONSTANTS
// =============================================================================

pub const TRANSFER_GAS_LIMIT: u64 = 21_000;
pub const BPS_DENOMINATOR: u128 = 10_000;
/// Seconds added to `block.timestamp` for router deadlines.
pub const SWAP_DEADLINE_SECS: u64 = 600;

// =============================================================================
// PROTOCOL CONTRACTS
// =============================================================================

pub const WMON: Address = address!("760AfE86e5de5fa0Ee542fc7B7B713e1c5425701");
pub const KINTSU_STAKING: Address = address!("07AabD925866E8353407E67C1D157836f7Ad923e");
pub const APRIORI_STAKING: Address = address!("b2f82D0f38dc453D596Ad40A37799446Cc89274A");
pub const MAGMA_STAKING: Address = address!("2c9C959516e9AAEdB2C748224a41249202ca8BE7");
pub const ZONA_MARKET: Address = address!("f7efcB69E4D2E3f254ac57DF2C64c12CE381aeda");
pub const UNISWAP_V2_ROUTER: Address = address!("Ca810D095e90Daae6e867c19DF6D9A8C56db2c89");
pub const BEAN_ROUTER: Address = address!("Ca810D095e90Daae6e867c19DF6D9A8C56db2c89");

// Raw selectors for contracts without published ABIs.
pub const MAGMA_STAKE_SELECTOR: [u8; 4] = [0xd5, 0x57, 0x59, 0x82];
pub const MAGMA_UNSTAKE_SELECTOR: [u8; 4] = [0x6f, 0xed, 0x1e, 0xa7];
pub const ZONA_BET_SELECTOR: [u8; 4] = [0x2c, 0x68, 0xcd, 0xa2];
pub const ZONA_MARKET_TAG: &str = "hongkong";

// =============================================================================
// OFF-CHAIN APIS
// =============================================================================

pub const MONORAIL_QUOTE_URL: &str = "https://testnet-pathfinder-v2.monorail.xyz/v1/quote";
pub const AICRAFT_API_BASE: &str = "https://api.aicraft.fun";
pub const AICRAFT_PROJECT_ID: &str = "678376133438e102d6ff5c6e";
pub const PROXY_LIST_URL: &str = "https://api.proxyscrape.com/v4/free-proxy-list/get?request=display_proxies&proxy_format=protocolipport&format=json";
pub const PROXY_PROBE_URL: &str = "http://httpbin.org/ip";

// =============================================================================
// TOKEN REGISTRIES
// =============================================================================

lazy_static! {
    pub static ref UNISWAP_TOKENS: HashMap<&'static str, Address> = {
        let mut m = HashMap::new();
        m.insert("DAC", address!("0f0bdebf0f83cd1ee3974779bcb7315f9808c714"));
        m.insert("USDT", address!("88b8e2161dedc77ef4ab7585569d2415a1c1055d"));
        m.insert("WETH", address!("836047a99e11f376522b447bffb6e3495dd0637c"));
        m.insert("MUK", address!("989d38aeed8408452f0273c7d4a17fef20878e62"));
        m.insert("USDC", address!("f817257fed379853cDe0fa4F97AB987181B1E5Ea"));
        m.insert("CHOG", address!("E0590015A873bF326bd645c3E1266d4db41C4E6B"));
        m
    };

    pub static ref BEAN_TOKENS: HashMap<&'static str, Address> = {
        let mut m = HashMap::new();
        m.insert("USDC", address!("f817257fed379853cDe0fa4F97AB987181B1E5Ea"));
        m.insert("USDT", address!("88b8E2161DEDC77EF4ab7585569D2415a1C1055D"));
        m.insert("BEAN", address!("268E4E24E0051EC27b3D27A95977E71cE6875a05"));
        m.insert("JAI", address!("70F893f65E3C1d7f82aad72f71615eb220b74D10"));
        m
    };

    // Native MON is quoted as the zero address.
    pub static ref MONORAIL_TOKENS: HashMap<&'static str, Address> = {
        let mut m = HashMap::new();
        m.insert("WMON", WMON);
        m.insert("CHOG", address!("e0590015a873bf326bd645c3e1266d4db41c4e6b"));
        m.insert("DAK", address!("0f0bdebf0f83cd1ee3974779bcb7315f9808c714"));
        m.insert("YAKI", address!("fe140e1dce99be9f4f15d657cd9b7bf622270c50"));
        m.insert("USDC", address!("5d876d73f4441d5f2438b1a3e2a51771b337f27a"));
        m.insert("sMON", KINTSU_STAKING);
        m
    };
}

/// Deterministic (sorted) view of a token registry, for seeded selection.
pub fn sorted_tokens(registry: &HashMap<&'static str, Address>) -> Vec<(&'static str, Address)> {
    let mut entries: Vec<_> = registry.iter().map(|(k, v)| (*k, *v)).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}
