// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::{parse_hex_bytes, parse_u256_flexible};
use crate::domain::constants::MONORAIL_QUOTE_URL;
use alloy::primitives::{Address, Bytes, U256};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

const MONORAIL_ORIGIN: &str = "https://testnet-preview.monorail.xyz/";

/// Ready-to-send swap transaction returned by the pathfinder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonorailQuote {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub output_formatted: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    transaction: QuoteTransaction,
    #[serde(default)]
    output_formatted: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteTransaction {
    to: String,
    data: String,
    value: Value,
}

impl QuoteResponse {
    fn into_quote(self) -> Result<MonorailQuote, AppError> {
        let invalid = |field: &str, message: String| AppError::Validation {
            field: format!("monorail.{field}"),
            message,
        };
        let to = Address::from_str(&self.transaction.to)
            .map_err(|e| invalid("to", e.to_string()))?;
        let data = parse_hex_bytes(&self.transaction.data)
            .ok_or_else(|| invalid("data", "not hex".into()))?;
        let value = match &self.transaction.value {
            Value::String(s) => parse_u256_flexible(s),
            Value::Number(n) => parse_u256_flexible(&n.to_string()),
            Value::Null => Some(U256::ZERO),
            _ => None,
        }
        .ok_or_else(|| invalid("value", format!("{}", self.transaction.value)))?;
        Ok(MonorailQuote {
            to,
            data: data.into(),
            value,
            output_formatted: self.output_formatted,
        })
    }
}

#[derive(Clone)]
pub struct MonorailClient {
    http: reqwest::Client,
    quote_url: String,
}

impl MonorailClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            quote_url: MONORAIL_QUOTE_URL.to_string(),
        }
    }

    /// `amount` is in human units of `from` (native MON is the zero address).
    pub async fn quote(
        &self,
        amount: &str,
        from: Address,
        to: Address,
        sender: Address,
    ) -> Result<MonorailQuote, AppError> {
        let from = format!("{from:#x}");
        let to = format!("{to:#x}");
        let sender = format!("{sender:#x}");
        let params = [
            ("amount", amount),
            ("from", from.as_str()),
            ("to", to.as_str()),
            ("slippage", "1"),
            ("deadline", "60"),
            ("source", "fe"),
            ("sender", sender.as_str()),
        ];
        let response = self
            .http
            .get(&self.quote_url)
            .query(&params)
            .header("referer", MONORAIL_ORIGIN)
            .header("origin", MONORAIL_ORIGIN)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AppError::ApiCall {
                provider: "monorail".into(),
                status: response.status().as_u16(),
            });
        }
        let parsed: QuoteResponse = response.json().await?;
        parsed.into_quote()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<MonorailQuote, AppError> {
        serde_json::from_str::<QuoteResponse>(raw)
            .unwrap()
            .into_quote()
    }

    #[test]
    fn hex_value_quote() {
        let quote = parse(
            r#"{"output_formatted":"1.23","transaction":{"to":"0x760AfE86e5de5fa0Ee542fc7B7B713e1c5425701","data":"0xabcdef","value":"0x2386f26fc10000"}}"#,
        )
        .unwrap();
        assert_eq!(quote.value, U256::from(10_000_000_000_000_000u64));
        assert_eq!(quote.data.as_ref(), &[0xab, 0xcd, 0xef]);
        assert_eq!(quote.output_formatted.as_deref(), Some("1.23"));
    }

    #[test]
    fn decimal_value_quote() {
        let quote = parse(
            r#"{"transaction":{"to":"0x760AfE86e5de5fa0Ee542fc7B7B713e1c5425701","data":"0x","value":"1000"}}"#,
        )
        .unwrap();
        assert_eq!(quote.value, U256::from(1000));
        assert!(quote.data.is_empty());
        let quote = parse(
            r#"{"transaction":{"to":"0x760AfE86e5de5fa0Ee542fc7B7B713e1c5425701","data":"0x","value":7}}"#,
        )
        .unwrap();
        assert_eq!(quote.value, U256::from(7));
    }

    #[test]
    fn malformed_target_is_rejected() {
        let err = parse(r#"{"transaction":{"to":"nope","data":"0x","value":"0"}}"#).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
