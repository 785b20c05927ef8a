// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::parse_hex_bytes;
use crate::domain::account::Account;
use crate::domain::constants::{AICRAFT_API_BASE, AICRAFT_PROJECT_ID};
use alloy::primitives::{Address, B256};
use alloy::signers::SignerSync;
use alloy_json_abi::JsonAbi;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::str::FromStr;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct SignInMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SignInToken {
    token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub wallets: Vec<UserWallet>,
    #[serde(default)]
    pub today_feed_count: u64,
    #[serde(default)]
    pub point: Value,
}

impl UserInfo {
    pub fn wallet_id(&self) -> Option<&str> {
        self.wallets.first().map(|w| w.id.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserWallet {
    #[serde(rename = "_id")]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub feed_count: u64,
    #[serde(default)]
    pub metadata: Option<CandidateMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMetadata {
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedOrder {
    pub payment: FeedPayment,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPayment {
    pub contract_address: String,
    pub abi: JsonAbi,
    pub function_name: String,
    pub params: FeedParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedParams {
    #[serde(rename = "candidateID")]
    pub candidate_id: String,
    pub feed_amount: Value,
    #[serde(rename = "requestID")]
    pub request_id: String,
    pub request_data: String,
    pub user_hashed_message: String,
    pub integrity_signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedOrderRequest<'a> {
    #[serde(rename = "candidateID")]
    candidate_id: &'a str,
    #[serde(rename = "walletID")]
    wallet_id: &'a str,
    feed_amount: u64,
    #[serde(rename = "chainID")]
    chain_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ref_code: Option<&'a str>,
}

/// Most-voted candidate for `country_code`.
pub fn pick_candidate<'a>(candidates: &'a [Candidate], country_code: &str) -> Option<&'a Candidate> {
    candidates
        .iter()
        .filter(|c| {
            c.metadata
                .as_ref()
                .and_then(|m| m.country_code.as_deref())
                .is_some_and(|code| code.eq_ignore_ascii_case(country_code))
        })
        .max_by_key(|c| c.feed_count)
}

/// EIP-191 signature over the raw bytes of a hex-encoded message, `0x`-prefixed.
pub fn sign_hashed_message(account: &Account, hashed_hex: &str) -> Result<String, AppError> {
    let bytes = parse_hex_bytes(hashed_hex).ok_or_else(|| AppError::Validation {
        field: "userHashedMessage".into(),
        message: "not hex".into(),
    })?;
    let signature = account
        .signer()
        .sign_message_sync(&bytes)
        .map_err(|e| AppError::Activity(format!("message signing failed: {e}")))?;
    Ok(format!("0x{}", hex::encode(signature.as_bytes())))
}

impl FeedPayment {
    pub fn contract(&self) -> Result<Address, AppError> {
        Address::from_str(&self.contract_address).map_err(|e| AppError::Validation {
            field: "contractAddress".into(),
            message: e.to_string(),
        })
    }

    /// Call arguments in declared order, our signature replacing the server's.
    pub fn call_args(&self, user_signature: &str) -> Vec<String> {
        let feed_amount = match &self.params.feed_amount {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        vec![
            self.params.candidate_id.clone(),
            feed_amount,
            self.params.request_id.clone(),
            self.params.request_data.clone(),
            user_signature.to_string(),
            self.params.integrity_signature.clone(),
        ]
    }
}

/// Per-account AiCraft session. Holds the bearer token once signed in.
pub struct AiCraftClient {
    http: reqwest::Client,
    base_url: String,
    ref_code: Option<String>,
    chain_id: u64,
    token: Option<String>,
}

impl AiCraftClient {
    pub fn new(http: reqwest::Client, ref_code: Option<String>, chain_id: u64) -> Self {
        Self {
            http,
            base_url: AICRAFT_API_BASE.to_string(),
            ref_code: ref_code.filter(|c| !c.trim().is_empty()),
            chain_id,
            token: None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T, AppError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(target: "aicraft", what, status = status.as_u16(), "AiCraft request rejected");
            return Err(AppError::ApiCall {
                provider: format!("aicraft {what}"),
                status: status.as_u16(),
            });
        }
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    pub async fn sign_in(&mut self, account: &Account) -> Result<(), AppError> {
        let address = account.address().to_checksum(None);
        let path = format!(
            "/auths/wallets/sign-in/message?address={address}&type=ETHEREUM_BASED"
        );
        let msg: SignInMessage = self
            .send(self.request(reqwest::Method::GET, &path), "sign-in message")
            .await?;
        let signature = account
            .signer()
            .sign_message_sync(msg.message.as_bytes())
            .map_err(|e| AppError::Activity(format!("sign-in signing failed: {e}")))?;
        let mut payload = json!({
            "address": address,
            "signature": format!("0x{}", hex::encode(signature.as_bytes())),
            "message": msg.message,
            "type": "ETHEREUM_BASED",
        });
        if let Some(code) = &self.ref_code {
            payload["refCode"] = json!(code);
        }
        let token: SignInToken = self
            .send(
                self.request(reqwest::Method::POST, "/auths/wallets/sign-in")
                    .json(&payload),
                "sign-in",
            )
            .await?;
        self.token = Some(token.token);
        tracing::info!(target: "aicraft", account = account.label(), "Signed in");

        if let Some(code) = self.ref_code.clone() {
            let body = json!({ "refCode": code });
            // Already-referred users get a 4xx here.
            if let Err(e) = self
                .send::<Value>(
                    self.request(reqwest::Method::POST, "/users/referral").json(&body),
                    "referral",
                )
                .await
            {
                tracing::debug!(target: "aicraft", error = %e, "Referral not applied");
            }
        }
        Ok(())
    }

    pub async fn user_info(&self) -> Result<UserInfo, AppError> {
        self.send(
            self.request(
                reqwest::Method::GET,
                "/users/me?includePresalePurchasedAmount=true",
            ),
            "user info",
        )
        .await
    }

    pub async fn candidates(&self) -> Result<Vec<Candidate>, AppError> {
        let path = format!("/candidates?projectID={AICRAFT_PROJECT_ID}");
        self.send(self.request(reqwest::Method::GET, &path), "candidates")
            .await
    }

    pub async fn create_feed_order(
        &self,
        candidate_id: &str,
        wallet_id: &str,
    ) -> Result<FeedPayment, AppError> {
        let body = FeedOrderRequest {
            candidate_id,
            wallet_id,
            feed_amount: 1,
            chain_id: self.chain_id.to_string(),
            ref_code: self.ref_code.as_deref(),
        };
        let order: FeedOrder = self
            .send(
                self.request(reqwest::Method::POST, "/feeds/orders").json(&body),
                "feed order",
            )
            .await?;
        Ok(order.payment)
    }

    pub async fn confirm_order(&self, request_id: &str, tx_hash: B256) -> Result<(), AppError> {
        let mut body = json!({ "transactionHash": format!("{tx_hash:#x}") });
        if let Some(code) = &self.ref_code {
            body["refCode"] = json!(code);
        }
        let path = format!("/feeds/orders/{request_id}/confirm");
        self.send::<Value>(
            self.request(reqwest::Method::POST, &path).json(&body),
            "confirm order",
        )
        .await?;
        Ok(())
    }
}
