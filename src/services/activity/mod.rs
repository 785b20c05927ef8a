// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod routine;

pub use routine::{PlannedStep, Routine};

use crate::common::error::AppError;
use crate::common::parsing::format_native;
use crate::domain::account::Account;
use crate::domain::constants::{
    APRIORI_STAKING, KINTSU_STAKING, MAGMA_STAKING, NATIVE_SYMBOL, SWAP_DEADLINE_SECS, WMON,
    ZONA_MARKET,
};
use crate::infrastructure::data::abi::{
    IAprioriStaking, IKintsuStaking, IUniswapV2Router, IWrappedNative, encode_dynamic_call,
    magma_stake_calldata, magma_unstake_calldata, zona_bet_calldata,
};
use crate::infrastructure::data::aicraft::{AiCraftClient, pick_candidate, sign_hashed_message};
use crate::infrastructure::data::monorail::MonorailClient;
use crate::network::chain::ChainClient;
use crate::services::execution::{TransactionIntent, TransactionOutcome};
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StakingProtocol {
    Kintsu,
    Apriori,
    Magma,
}

impl StakingProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kintsu => "kintsu",
            Self::Apriori => "apriori",
            Self::Magma => "magma",
        }
    }
}

impl FromStr for StakingProtocol {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kintsu" => Ok(Self::Kintsu),
            "apriori" => Ok(Self::Apriori),
            "magma" => Ok(Self::Magma),
            other => Err(AppError::Config(format!(
                "unknown staking protocol `{other}` (kintsu, apriori, magma)"
            ))),
        }
    }
}

/// One on-chain action. Each variant only knows how to produce its target,
/// value and calldata; execution is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    KintsuStake {
        amount: U256,
    },
    AprioriStake {
        amount: U256,
    },
    MagmaStake {
        amount: U256,
    },
    MagmaUnstake {
        amount: U256,
    },
    Wrap {
        amount: U256,
    },
    Unwrap {
        amount: U256,
    },
    /// UniswapV2-style `swapExactETHForTokens` through `router`.
    SwapNativeForToken {
        venue: &'static str,
        router: Address,
        symbol: &'static str,
        token: Address,
        amount: U256,
    },
    MonorailSwap {
        symbol: &'static str,
        token: Address,
        amount: U256,
    },
    ZonaBet {
        amount: U256,
    },
    AiCraftVote {
        country: String,
    },
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let native = |amount: &U256| format!("{} {NATIVE_SYMBOL}", format_native(*amount));
        match self {
            Self::KintsuStake { amount } => write!(f, "stake {} on Kintsu", native(amount)),
            Self::AprioriStake { amount } => write!(f, "stake {} on Apriori", native(amount)),
            Self::MagmaStake { amount } => write!(f, "stake {} on Magma", native(amount)),
            Self::MagmaUnstake { amount } => write!(f, "unstake {} from Magma", native(amount)),
            Self::Wrap { amount } => write!(f, "wrap {}", native(amount)),
            Self::Unwrap { amount } => write!(f, "unwrap {}", native(amount)),
            Self::SwapNativeForToken {
                venue,
                symbol,
                amount,
                ..
            } => write!(f, "swap {} for {symbol} on {venue}", native(amount)),
            Self::MonorailSwap { symbol, amount, .. } => {
                write!(f, "swap {} for {symbol} via Monorail", native(amount))
            }
            Self::ZonaBet { amount } => write!(f, "bet {} on Zona", native(amount)),
            Self::AiCraftVote { country } => write!(f, "AiCraft vote for {country}"),
        }
    }
}

/// Work to do once the transaction of an activity is mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    ConfirmFeedOrder { request_id: String },
}

#[derive(Debug, Clone)]
pub struct PreparedActivity {
    pub intent: TransactionIntent,
    pub follow_up: Option<FollowUp>,
}

impl PreparedActivity {
    fn plain(intent: TransactionIntent) -> Self {
        Self {
            intent,
            follow_up: None,
        }
    }
}

/// Per-account collaborators needed to turn an [`Activity`] into an intent.
pub struct ActivityContext<C> {
    chain: Arc<C>,
    monorail: MonorailClient,
    aicraft: AiCraftClient,
    daily_votes: u32,
}

impl<C: ChainClient> ActivityContext<C> {
    pub fn new(
        chain: Arc<C>,
        http: reqwest::Client,
        referral_code: Option<String>,
        daily_votes: u32,
    ) -> Self {
        let chain_id = chain.chain_id();
        Self {
            chain,
            monorail: MonorailClient::new(http.clone()),
            aicraft: AiCraftClient::new(http, referral_code, chain_id),
            daily_votes,
        }
    }
}

impl Activity {
    /// Native value the activity spends, excluding gas.
    pub fn value(&self) -> U256 {
        match self {
            Self::KintsuStake { amount }
            | Self::AprioriStake { amount }
            | Self::MagmaStake { amount }
            | Self::Wrap { amount }
            | Self::SwapNativeForToken { amount, .. }
            | Self::MonorailSwap { amount, .. }
            | Self::ZonaBet { amount } => *amount,
            Self::MagmaUnstake { .. } | Self::Unwrap { .. } | Self::AiCraftVote { .. } => {
                U256::ZERO
            }
        }
    }

    pub async fn prepare<C: ChainClient>(
        &self,
        account: &Account,
        ctx: &mut ActivityContext<C>,
    ) -> Result<PreparedActivity, AppError> {
        let prepared = match self {
            Self::KintsuStake { amount } => PreparedActivity::plain(TransactionIntent::call(
                KINTSU_STAKING,
                *amount,
                IKintsuStaking::stakeCall {}.abi_encode(),
            )),
            Self::AprioriStake { amount } => PreparedActivity::plain(TransactionIntent::call(
                APRIORI_STAKING,
                *amount,
                IAprioriStaking::depositCall {
                    assets: *amount,
                    receiver: account.address(),
                }
                .abi_encode(),
            )),
            Self::MagmaStake { amount } => PreparedActivity::plain(TransactionIntent::call(
                MAGMA_STAKING,
                *amount,
                magma_stake_calldata(),
            )),
            Self::MagmaUnstake { amount } => PreparedActivity::plain(TransactionIntent::call(
                MAGMA_STAKING,
                U256::ZERO,
                magma_unstake_calldata(*amount),
            )),
            Self::Wrap { amount } => PreparedActivity::plain(TransactionIntent::call(
                WMON,
                *amount,
                IWrappedNative::depositCall {}.abi_encode(),
            )),
            Self::Unwrap { amount } => PreparedActivity::plain(TransactionIntent::call(
                WMON,
                U256::ZERO,
                IWrappedNative::withdrawCall { amount: *amount }.abi_encode(),
            )),
            Self::SwapNativeForToken {
                router,
                token,
                amount,
                ..
            } => {
                let now = ctx.chain.get_block_timestamp().await?;
                let call = IUniswapV2Router::swapExactETHForTokensCall {
                    amountOutMin: U256::ZERO,
                    path: vec![WMON, *token],
                    to: account.address(),
                    deadline: U256::from(now.saturating_add(SWAP_DEADLINE_SECS)),
                };
                PreparedActivity::plain(TransactionIntent::call(*router, *amount, call.abi_encode()))
            }
            Self::MonorailSwap {
                symbol,
                token,
                amount,
            } => {
                let quote = ctx
                    .monorail
                    .quote(&format_native(*amount), Address::ZERO, *token, account.address())
                    .await?;
                tracing::debug!(
                    target: "activity",
                    account = account.label(),
                    symbol,
                    expected_out = quote.output_formatted.as_deref().unwrap_or("?"),
                    "Monorail quote"
                );
                PreparedActivity::plain(TransactionIntent::call(quote.to, quote.value, quote.data))
            }
            Self::ZonaBet { amount } => PreparedActivity::plain(TransactionIntent::call(
                ZONA_MARKET,
                *amount,
                zona_bet_calldata(*amount),
            )),
            Self::AiCraftVote { country } => self.prepare_vote(account, ctx, country).await?,
        };
        Ok(prepared)
    }

    async fn prepare_vote<C: ChainClient>(
        &self,
        account: &Account,
        ctx: &mut ActivityContext<C>,
        country: &str,
    ) -> Result<PreparedActivity, AppError> {
        if !ctx.aicraft.is_signed_in() {
            ctx.aicraft.sign_in(account).await?;
        }
        let info = ctx.aicraft.user_info().await?;
        if info.today_feed_count >= u64::from(ctx.daily_votes) {
            return Err(AppError::QuotaExhausted(format!(
                "{} of {} AiCraft votes already cast today",
                info.today_feed_count, ctx.daily_votes
            )));
        }
        let wallet_id = info
            .wallet_id()
            .ok_or_else(|| AppError::Activity("AiCraft account has no linked wallet".into()))?;

        let candidates = ctx.aicraft.candidates().await?;
        let candidate = pick_candidate(&candidates, country)
            .ok_or_else(|| AppError::Activity(format!("no AiCraft candidate for {country}")))?;
        tracing::info!(
            target: "activity",
            account = account.label(),
            candidate = %candidate.name,
            country,
            "Voting"
        );

        let payment = ctx.aicraft.create_feed_order(&candidate.id, wallet_id).await?;
        let signature = sign_hashed_message(account, &payment.params.user_hashed_message)?;
        let data = encode_dynamic_call(
            &payment.abi,
            &payment.function_name,
            &payment.call_args(&signature),
        )?;
        Ok(PreparedActivity {
            intent: TransactionIntent::call(payment.contract()?, U256::ZERO, data),
            follow_up: Some(FollowUp::ConfirmFeedOrder {
                request_id: payment.params.request_id.clone(),
            }),
        })
    }
}

impl FollowUp {
    pub async fn complete<C: ChainClient>(
        &self,
        ctx: &ActivityContext<C>,
        outcome: &TransactionOutcome,
    ) -> Result<(), AppError> {
        match self {
            Self::ConfirmFeedOrder { request_id } => {
                ctx.aicraft.confirm_order(request_id, outcome.hash).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::parsing::parse_native;
    use crate::domain::constants::{MAGMA_STAKE_SELECTOR, ZONA_BET_SELECTOR};

    #[test]
    fn staking_protocol_parses_case_insensitively() {
        assert_eq!(
            StakingProtocol::from_str(" Kintsu ").unwrap(),
            StakingProtocol::Kintsu
        );
        assert_eq!(StakingProtocol::from_str("MAGMA").unwrap().as_str(), "magma");
        assert!(matches!(
            StakingProtocol::from_str("lido"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn value_is_zero_for_withdrawals() {
        let amount = parse_native("0.5").unwrap();
        assert_eq!(Activity::Wrap { amount }.value(), amount);
        assert_eq!(Activity::Unwrap { amount }.value(), U256::ZERO);
        assert_eq!(Activity::MagmaUnstake { amount }.value(), U256::ZERO);
        assert_eq!(
            Activity::AiCraftVote {
                country: "US".into()
            }
            .value(),
            U256::ZERO
        );
    }

    #[test]
    fn display_names_amount_and_venue() {
        let amount = parse_native("0.01").unwrap();
        let activity = Activity::SwapNativeForToken {
            venue: "Uniswap",
            router: Address::ZERO,
            symbol: "USDC",
            token: Address::ZERO,
            amount,
        };
        assert_eq!(activity.to_string(), "swap 0.01 MON for USDC on Uniswap");
        assert_eq!(
            Activity::KintsuStake { amount }.to_string(),
            "stake 0.01 MON on Kintsu"
        );
    }

    #[test]
    fn selector_constants_feed_calldata() {
        assert_eq!(&magma_stake_calldata()[..4], &MAGMA_STAKE_SELECTOR);
        assert_eq!(&zona_bet_calldata(U256::from(1))[..4], &ZONA_BET_SELECTOR);
    }
}
