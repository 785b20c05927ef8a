// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::{Address, U256};
use alloy::primitives::utils::{format_ether, parse_ether};

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub fn parse_hex_bytes(s: &str) -> Option<Vec<u8>> {
    hex::decode(strip_0x(s)).ok()
}

pub fn parse_u256_hex(s: &str) -> Option<U256> {
    U256::from_str_radix(strip_0x(s), 16).ok()
}

/// Accepts `0x`-prefixed hex or plain decimal. Aggregator APIs use both.
pub fn parse_u256_flexible(s: &str) -> Option<U256> {
    let trimmed = s.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        parse_u256_hex(trimmed)
    } else {
        U256::from_str_radix(trimmed, 10).ok()
    }
}

/// Native-unit amount (e.g. `"0.1"`) into wei.
pub fn parse_native(amount: &str) -> Option<U256> {
    parse_ether(amount.trim()).ok()
}

/// Native-unit amount with 18 decimals, trailing zeros trimmed.
pub fn format_native(wei: U256) -> String {
    let raw = format_ether(wei);
    match raw.split_once('.') {
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                int.to_string()
            } else {
                format!("{int}.{frac}")
            }
        }
        None => raw,
    }
}

/// Float native amount (random pacing output) into wei, rounded to 1e-9.
pub fn native_from_f64(amount: f64) -> U256 {
    if !amount.is_finite() || amount <= 0.0 {
        return U256::ZERO;
    }
    let gwei = (amount * 1e9).round() as u128;
    U256::from(gwei) * U256::from(1_000_000_000u64)
}

/// `0x1234...abcd` form used in log lines.
pub fn short_address(address: &Address) -> String {
    let full = format!("{address:#x}");
    if full.len() <= 12 {
        return full;
    }
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
