// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::pacing::DelayRange;
use crate::common::parsing::native_from_f64;
use crate::common::retry::BackoffPolicy;
use crate::domain::constants;
use crate::domain::error::AppError;
use crate::services::activity::StakingProtocol;
use crate::services::execution::ExecutionPolicy;
use alloy::primitives::U256;
use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_debug")]
    pub debug: bool,
    #[serde(default)]
    pub log_json: bool,

    // Network
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,
    /// Explicit http/https/socks5 proxy. Wins over discovery.
    pub proxy: Option<String>,
    #[serde(default = "default_true")]
    pub use_free_proxies: bool,

    // Identity
    #[serde(default = "default_private_keys_path")]
    pub private_keys_path: String,
    /// 1-based inclusive `[start, end]` window into the key file.
    #[serde(default, deserialize_with = "deserialize_key_range")]
    pub private_keys_range: Option<(usize, usize)>,
    #[serde(default)]
    pub funder_private_key: String,
    /// Top-up amount in native units.
    #[serde(default = "default_fund_amount")]
    pub fund_amount: f64,

    // Tables
    #[serde(default)]
    pub execution: ExecutionSettings,
    #[serde(default)]
    pub pacing: PacingSettings,
    #[serde(default)]
    pub daily: DailyCycles,
    #[serde(default = "default_stakers")]
    pub stakers: Vec<String>,
    #[serde(default)]
    pub aicraft: AiCraftSettings,
    /// Restricts swap routines to these symbols. Empty means every listed token.
    #[serde(default)]
    pub swap_tokens: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ExecutionSettings {
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_gas_limit_buffer_bps")]
    pub gas_limit_buffer_bps: u64,
    #[serde(default = "default_gas_bump_bps")]
    pub gas_bump_bps: u64,
    #[serde(default = "default_max_funding_retries")]
    pub max_funding_retries: u32,
    #[serde(default = "default_rate_limit_retries")]
    pub rate_limit_retries: u32,
    #[serde(default = "default_rate_limit_base_delay_ms")]
    pub rate_limit_base_delay_ms: u64,
    #[serde(default = "default_activity_retries")]
    pub activity_retries: u32,
    #[serde(default = "default_activity_retry_delay_secs")]
    pub activity_retry_delay_secs: u64,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            receipt_timeout_secs: default_receipt_timeout_secs(),
            receipt_poll_ms: default_receipt_poll_ms(),
            gas_limit_buffer_bps: default_gas_limit_buffer_bps(),
            gas_bump_bps: default_gas_bump_bps(),
            max_funding_retries: default_max_funding_retries(),
            rate_limit_retries: default_rate_limit_retries(),
            rate_limit_base_delay_ms: default_rate_limit_base_delay_ms(),
            activity_retries: default_activity_retries(),
            activity_retry_delay_secs: default_activity_retry_delay_secs(),
        }
    }
}

impl ExecutionSettings {
    pub fn policy(&self) -> ExecutionPolicy {
        ExecutionPolicy {
            receipt_timeout: Duration::from_secs(self.receipt_timeout_secs),
            receipt_poll: Duration::from_millis(self.receipt_poll_ms),
            gas_limit_buffer_bps: self.gas_limit_buffer_bps,
            gas_bump_bps: self.gas_bump_bps,
            max_funding_retries: self.max_funding_retries,
            rate_limit: BackoffPolicy::new(
                Duration::from_millis(self.rate_limit_base_delay_ms),
                self.rate_limit_retries,
            ),
        }
    }

    pub fn activity_retry_delay(&self) -> Duration {
        Duration::from_secs(self.activity_retry_delay_secs)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PacingSettings {
    /// Seconds between steps of a routine.
    #[serde(default = "default_step_delay")]
    pub step_delay_secs: DelayRange,
    /// Seconds between cycles of a routine.
    #[serde(default = "default_cycle_delay")]
    pub cycle_delay_secs: DelayRange,
    /// Hours of rest once every routine finished its daily quota.
    #[serde(default = "default_daily_rest")]
    pub daily_rest_hours: DelayRange,
    /// Seconds between a Magma stake and its unstake.
    #[serde(default = "default_unstake_delay")]
    pub unstake_delay_secs: DelayRange,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            step_delay_secs: default_step_delay(),
            cycle_delay_secs: default_cycle_delay(),
            daily_rest_hours: default_daily_rest(),
            unstake_delay_secs: default_unstake_delay(),
        }
    }
}

/// Cycles per day for each routine. Zero disables the routine.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DailyCycles {
    #[serde(default = "default_stake_cycles")]
    pub stakers: u32,
    #[serde(default = "default_dex_cycles")]
    pub wrap: u32,
    #[serde(default = "default_dex_cycles")]
    pub uniswap: u32,
    #[serde(default = "default_dex_cycles")]
    pub bean: u32,
    #[serde(default = "default_dex_cycles")]
    pub monorail: u32,
    #[serde(default = "default_zona_cycles")]
    pub zona: u32,
}

impl Default for DailyCycles {
    fn default() -> Self {
        Self {
            stakers: default_stake_cycles(),
            wrap: default_dex_cycles(),
            uniswap: default_dex_cycles(),
            bean: default_dex_cycles(),
            monorail: default_dex_cycles(),
            zona: default_zona_cycles(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AiCraftSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_daily_votes")]
    pub daily_votes: u32,
    #[serde(default)]
    pub referral_code: String,
    /// Country codes to vote for; one is picked at random per vote.
    #[serde(default = "default_vote_countries")]
    pub countries: Vec<String>,
}

impl Default for AiCraftSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            daily_votes: default_daily_votes(),
            referral_code: String::new(),
            countries: default_vote_countries(),
        }
    }
}

fn default_debug() -> bool {
    false
}
fn default_true() -> bool {
    true
}
fn default_rpc_url() -> String {
    constants::DEFAULT_RPC_URL.to_string()
}
fn default_chain_id() -> u64 {
    constants::CHAIN_MONAD_TESTNET
}
fn default_explorer_url() -> String {
    constants::DEFAULT_EXPLORER_TX_URL.to_string()
}
fn default_private_keys_path() -> String {
    "private_keys.txt".to_string()
}
fn default_fund_amount() -> f64 {
    0.1
}
fn default_stakers() -> Vec<String> {
    vec!["kintsu".into(), "apriori".into(), "magma".into()]
}
fn default_receipt_timeout_secs() -> u64 {
    120
}
fn default_receipt_poll_ms() -> u64 {
    1500
}
fn default_gas_limit_buffer_bps() -> u64 {
    11_000
}
fn default_gas_bump_bps() -> u64 {
    12_000
}
fn default_max_funding_retries() -> u32 {
    2
}
fn default_rate_limit_retries() -> u32 {
    3
}
fn default_rate_limit_base_delay_ms() -> u64 {
    2000
}
fn default_activity_retries() -> u32 {
    3
}
fn default_activity_retry_delay_secs() -> u64 {
    30
}
fn default_step_delay() -> DelayRange {
    DelayRange::new(60, 180)
}
fn default_cycle_delay() -> DelayRange {
    DelayRange::new(60, 200)
}
fn default_daily_rest() -> DelayRange {
    DelayRange::new(20, 24)
}
fn default_unstake_delay() -> DelayRange {
    DelayRange::new(30, 120)
}
fn default_stake_cycles() -> u32 {
    2
}
fn default_dex_cycles() -> u32 {
    2
}
fn default_zona_cycles() -> u32 {
    1
}
fn default_daily_votes() -> u32 {
    5
}
fn default_vote_countries() -> Vec<String> {
    vec!["US".into()]
}

fn parse_key_range(raw: &str) -> Result<Option<(usize, usize)>, String> {
    let parts: Vec<&str> = raw
        .split(|c: char| c == ',' || c == '-' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    match parts.as_slice() {
        [] => Ok(None),
        [start, end] => {
            let start = usize::from_str(start).map_err(|e| format!("range start: {e}"))?;
            let end = usize::from_str(end).map_err(|e| format!("range end: {e}"))?;
            Ok(Some((start, end)))
        }
        _ => Err(format!("expected `start,end`, got `{raw}`")),
    }
}

fn deserialize_key_range<'de, D>(deserializer: D) -> Result<Option<(usize, usize)>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{Error, SeqAccess, Visitor};
    use std::fmt;

    struct RangeVisitor;

    impl<'de> Visitor<'de> for RangeVisitor {
        type Value = Option<(usize, usize)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a two-element array or a `start,end` string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            parse_key_range(v).map_err(E::custom)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(None)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some(elem) = seq.next_element::<u64>()? {
                out.push(elem as usize);
            }
            match out.as_slice() {
                [] => Ok(None),
                [start, end] => Ok(Some((*start, *end))),
                _ => Err(A::Error::custom("private_keys_range needs exactly two entries")),
            }
        }
    }

    deserializer.deserialize_any(RangeVisitor)
}

impl GlobalSettings {
    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // CLI (in main) > env/.env > file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.funder_private_key.trim().is_empty() {
            return Err(AppError::Config("FUNDER_PRIVATE_KEY is missing".to_string()));
        }
        if !self.fund_amount.is_finite() || self.fund_amount <= 0.0 {
            return Err(AppError::Config(format!(
                "fund_amount must be positive, got {}",
                self.fund_amount
            )));
        }
        if self.fund_amount_wei().is_zero() {
            return Err(AppError::Config(
                "fund_amount rounds to zero; use at least 1 gwei".to_string(),
            ));
        }
        if self.chain_id == 0 {
            return Err(AppError::Config("chain_id must be non-zero".to_string()));
        }
        Url::parse(&self.rpc_url)
            .map_err(|e| AppError::Config(format!("rpc_url `{}`: {e}", self.rpc_url)))?;
        if let Some(proxy) = self.proxy_url() {
            let parsed =
                Url::parse(proxy).map_err(|e| AppError::Config(format!("proxy `{proxy}`: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https" | "socks5" | "socks5h") {
                return Err(AppError::Config(format!(
                    "proxy scheme `{}` unsupported (http, https, socks5)",
                    parsed.scheme()
                )));
            }
        }

        let pacing = &self.pacing;
        for (name, range) in [
            ("pacing.step_delay_secs", pacing.step_delay_secs),
            ("pacing.cycle_delay_secs", pacing.cycle_delay_secs),
            ("pacing.daily_rest_hours", pacing.daily_rest_hours),
            ("pacing.unstake_delay_secs", pacing.unstake_delay_secs),
        ] {
            if !range.is_valid() {
                return Err(AppError::Config(format!(
                    "{name}: min {} exceeds max {}",
                    range.min, range.max
                )));
            }
        }

        let exec = &self.execution;
        if exec.gas_limit_buffer_bps < constants::BPS_DENOMINATOR as u64 {
            return Err(AppError::Config(
                "execution.gas_limit_buffer_bps must be at least 10000".to_string(),
            ));
        }
        if exec.gas_bump_bps < constants::BPS_DENOMINATOR as u64 {
            return Err(AppError::Config(
                "execution.gas_bump_bps must be at least 10000".to_string(),
            ));
        }
        if exec.receipt_timeout_secs == 0 {
            return Err(AppError::Config(
                "execution.receipt_timeout_secs must be non-zero".to_string(),
            ));
        }

        self.staking_protocols()?;
        if self.aicraft.enabled && self.aicraft.daily_votes > 0 && self.aicraft.countries.is_empty()
        {
            return Err(AppError::Config(
                "aicraft.countries must list at least one country code".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fund_amount_wei(&self) -> U256 {
        native_from_f64(self.fund_amount)
    }

    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub fn staking_protocols(&self) -> Result<Vec<StakingProtocol>, AppError> {
        self.stakers
            .iter()
            .map(|name| StakingProtocol::from_str(name))
            .collect()
    }

    /// Applies `--keys` from the command line.
    pub fn with_keys_path(mut self, path: Option<String>) -> Self {
        if let Some(path) = path.filter(|p| !p.trim().is_empty()) {
            self.private_keys_path = path;
        }
        self
    }
}
