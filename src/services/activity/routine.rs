// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::app::config::GlobalSettings;
use crate::common::parsing::native_from_f64;
use crate::domain::constants::{
    BEAN_ROUTER, BEAN_TOKENS, MONORAIL_TOKENS, UNISWAP_TOKENS, UNISWAP_V2_ROUTER, sorted_tokens,
};
use crate::services::activity::{Activity, StakingProtocol};
use alloy::primitives::{Address, U256};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

// Native amounts per action, in MON.
const KINTSU_AMOUNT: (f64, f64) = (0.01, 0.02);
const SMALL_STAKE_AMOUNT: (f64, f64) = (0.0001, 0.001);
const WRAP_AMOUNT: (f64, f64) = (0.01, 0.011);
const SWAP_AMOUNT: (f64, f64) = (0.001, 0.01);
const ZONA_AMOUNT: (f64, f64) = (0.001, 0.005);

/// A daily routine: a named group of activities with its own cycle quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Routine {
    Stakers,
    Wrap,
    Uniswap,
    Bean,
    Monorail,
    Zona,
    AiCraft,
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub activity: Activity,
    /// Overrides the regular step delay after this step.
    pub pause_after: Option<Duration>,
}

impl PlannedStep {
    fn new(activity: Activity) -> Self {
        Self {
            activity,
            pause_after: None,
        }
    }
}

fn sample_amount<R: Rng + ?Sized>(rng: &mut R, (min, max): (f64, f64)) -> U256 {
    native_from_f64(rng.gen_range(min..=max))
}

/// Registry entries, narrowed to `allowed` symbols when that list is non-empty.
fn swap_candidates(
    registry: &HashMap<&'static str, Address>,
    allowed: &[String],
) -> Vec<(&'static str, Address)> {
    sorted_tokens(registry)
        .into_iter()
        .filter(|(symbol, _)| {
            allowed.is_empty() || allowed.iter().any(|a| a.eq_ignore_ascii_case(symbol))
        })
        .collect()
}

impl Routine {
    pub const ALL: [Routine; 7] = [
        Routine::Stakers,
        Routine::Wrap,
        Routine::Uniswap,
        Routine::Bean,
        Routine::Monorail,
        Routine::Zona,
        Routine::AiCraft,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Stakers => "stakers",
            Self::Wrap => "wrap",
            Self::Uniswap => "uniswap",
            Self::Bean => "bean",
            Self::Monorail => "monorail",
            Self::Zona => "zona",
            Self::AiCraft => "aicraft",
        }
    }

    /// Cycles to run per day. AiCraft runs a single cycle of `daily_votes` steps.
    pub fn daily_cycles(&self, settings: &GlobalSettings) -> u32 {
        let daily = &settings.daily;
        match self {
            Self::Stakers => daily.stakers,
            Self::Wrap => daily.wrap,
            Self::Uniswap => daily.uniswap,
            Self::Bean => daily.bean,
            Self::Monorail => daily.monorail,
            Self::Zona => daily.zona,
            Self::AiCraft => {
                u32::from(settings.aicraft.enabled && settings.aicraft.daily_votes > 0)
            }
        }
    }

    /// Steps of one cycle. An empty plan means there is nothing to do.
    pub fn plan_cycle<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        settings: &GlobalSettings,
    ) -> Vec<PlannedStep> {
        match self {
            Self::Stakers => {
                let mut protocols = settings.staking_protocols().unwrap_or_default();
                protocols.shuffle(rng);
                let mut steps = Vec::with_capacity(protocols.len() + 1);
                for protocol in protocols {
                    match protocol {
                        StakingProtocol::Kintsu => steps.push(PlannedStep::new(
                            Activity::KintsuStake {
                                amount: sample_amount(rng, KINTSU_AMOUNT),
                            },
                        )),
                        StakingProtocol::Apriori => steps.push(PlannedStep::new(
                            Activity::AprioriStake {
                                amount: sample_amount(rng, SMALL_STAKE_AMOUNT),
                            },
                        )),
                        StakingProtocol::Magma => {
                            let amount = sample_amount(rng, SMALL_STAKE_AMOUNT);
                            steps.push(PlannedStep {
                                activity: Activity::MagmaStake { amount },
                                pause_after: Some(
                                    settings.pacing.unstake_delay_secs.sample_secs(rng),
                                ),
                            });
                            steps.push(PlannedStep::new(Activity::MagmaUnstake { amount }));
                        }
                    }
                }
                steps
            }
            Self::Wrap => {
                let amount = sample_amount(rng, WRAP_AMOUNT);
                vec![
                    PlannedStep::new(Activity::Wrap { amount }),
                    PlannedStep::new(Activity::Unwrap { amount }),
                ]
            }
            Self::Uniswap => {
                self.plan_router_swap(rng, settings, "Uniswap", UNISWAP_V2_ROUTER, &UNISWAP_TOKENS)
            }
            Self::Bean => self.plan_router_swap(rng, settings, "Bean", BEAN_ROUTER, &BEAN_TOKENS),
            Self::Monorail => {
                let tokens = swap_candidates(&MONORAIL_TOKENS, &settings.swap_tokens);
                let Some((symbol, token)) = tokens.choose(rng).copied() else {
                    return Vec::new();
                };
                vec![PlannedStep::new(Activity::MonorailSwap {
                    symbol,
                    token,
                    amount: sample_amount(rng, SWAP_AMOUNT),
                })]
            }
            Self::Zona => vec![PlannedStep::new(Activity::ZonaBet {
                amount: sample_amount(rng, ZONA_AMOUNT),
            })],
            Self::AiCraft => {
                let countries = &settings.aicraft.countries;
                (0..settings.aicraft.daily_votes)
                    .filter_map(|_| countries.choose(rng))
                    .map(|country| {
                        PlannedStep::new(Activity::AiCraftVote {
                            country: country.to_ascii_uppercase(),
                        })
                    })
                    .collect()
            }
        }
    }

    fn plan_router_swap<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        settings: &GlobalSettings,
        venue: &'static str,
        router: Address,
        registry: &HashMap<&'static str, Address>,
    ) -> Vec<PlannedStep> {
        let tokens = swap_candidates(registry, &settings.swap_tokens);
        let Some((symbol, token)) = tokens.choose(rng).copied() else {
            return Vec::new();
        };
        vec![PlannedStep::new(Activity::SwapNativeForToken {
            venue,
            router,
            symbol,
            token,
            amount: sample_amount(rng, SWAP_AMOUNT),
        })]
    }
}
