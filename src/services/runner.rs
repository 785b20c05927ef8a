// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::app::config::GlobalSettings;
use crate::common::error::AppError;
use crate::common::pacing::{format_wait, pause};
use crate::common::parsing::format_native;
use crate::domain::account::Account;
use crate::domain::constants::NATIVE_SYMBOL;
use crate::network::chain::ChainClient;
use crate::services::activity::{ActivityContext, PlannedStep, Routine};
use crate::services::execution::{TransactionExecutor, TransactionOutcome};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const ERROR_PREVIEW_CHARS: usize = 120;

/// Summary of one routine run for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineReport {
    pub routine: Routine,
    pub cycles_planned: u32,
    pub cycles_completed: u32,
    pub steps_succeeded: u32,
    /// Routine stopped early after a step exhausted its retries.
    pub abandoned: bool,
    /// Routine stopped early because shutdown was requested.
    pub interrupted: bool,
    pub last_error: Option<String>,
}

impl RoutineReport {
    fn new(routine: Routine, cycles_planned: u32) -> Self {
        Self {
            routine,
            cycles_planned,
            cycles_completed: 0,
            steps_succeeded: 0,
            abandoned: false,
            interrupted: false,
            last_error: None,
        }
    }
}

/// Errors that end the routine without step retries.
fn is_terminal(err: &AppError) -> bool {
    matches!(
        err,
        AppError::QuotaExhausted(_) | AppError::FunderDepleted { .. }
    )
}

/// Drives every routine for a single account, one transaction at a time.
pub struct ActivityRunner<C> {
    account: Account,
    executor: Arc<TransactionExecutor<C>>,
    context: ActivityContext<C>,
    settings: Arc<GlobalSettings>,
    shutdown: CancellationToken,
    rng: StdRng,
}

impl<C: ChainClient> ActivityRunner<C> {
    pub fn new(
        account: Account,
        executor: Arc<TransactionExecutor<C>>,
        context: ActivityContext<C>,
        settings: Arc<GlobalSettings>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            account,
            executor,
            context,
            settings,
            shutdown,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Runs daily routines until shutdown, resting between days.
    pub async fn run(mut self) {
        let mut day = 0u64;
        while !self.shutdown.is_cancelled() {
            day += 1;
            let reports = self.run_day().await;
            if self.shutdown.is_cancelled() {
                break;
            }
            let steps: u32 = reports.iter().map(|r| r.steps_succeeded).sum();
            let abandoned = reports.iter().filter(|r| r.abandoned).count();
            let rest = self
                .settings
                .pacing
                .daily_rest_hours
                .sample_hours(&mut self.rng);
            tracing::info!(
                target: "runner",
                account = self.account.label(),
                day,
                steps,
                abandoned,
                wait = %format_wait(rest),
                "Daily routines finished; resting"
            );
            if !pause(rest, &self.shutdown).await {
                break;
            }
        }
        tracing::info!(target: "runner", account = self.account.label(), "Runner stopped");
    }

    /// One pass over every routine in random order.
    pub async fn run_day(&mut self) -> Vec<RoutineReport> {
        let mut routines = Routine::ALL.to_vec();
        routines.shuffle(&mut self.rng);

        let mut reports = Vec::with_capacity(routines.len());
        for routine in routines {
            let report = self.run_routine(routine).await;
            let ran = report.cycles_planned > 0;
            let interrupted = report.interrupted;
            reports.push(report);
            if interrupted {
                break;
            }
            if ran {
                let wait = self.settings.pacing.cycle_delay_secs.sample_secs(&mut self.rng);
                tracing::debug!(target: "runner", account = self.account.label(), wait = %format_wait(wait), "Next routine");
                if !pause(wait, &self.shutdown).await {
                    break;
                }
            }
        }
        reports
    }

    pub async fn run_routine(&mut self, routine: Routine) -> RoutineReport {
        let cycles = routine.daily_cycles(&self.settings);
        let mut report = RoutineReport::new(routine, cycles);
        if cycles == 0 {
            tracing::debug!(target: "runner", account = self.account.label(), %routine, "Routine disabled");
            return report;
        }
        self.log_balance(routine).await;

        for cycle in 1..=cycles {
            let steps = routine.plan_cycle(&mut self.rng, &self.settings);
            if steps.is_empty() {
                tracing::warn!(
                    target: "runner",
                    account = self.account.label(),
                    %routine,
                    "Nothing to do for this routine; check swap_tokens"
                );
                report.abandoned = true;
                return report;
            }
            tracing::info!(
                target: "runner",
                account = self.account.label(),
                %routine,
                cycle,
                of = cycles,
                steps = steps.len(),
                "Starting cycle"
            );

            for (idx, step) in steps.iter().enumerate() {
                match self.run_step(step).await {
                    Ok(_) => report.steps_succeeded += 1,
                    Err(e) => {
                        if self.shutdown.is_cancelled() {
                            report.interrupted = true;
                            return report;
                        }
                        tracing::warn!(
                            target: "runner",
                            account = self.account.label(),
                            %routine,
                            activity = %step.activity,
                            error = %e.truncated(ERROR_PREVIEW_CHARS),
                            "Abandoning routine for this cycle"
                        );
                        report.abandoned = true;
                        report.last_error = Some(e.truncated(ERROR_PREVIEW_CHARS));
                        return report;
                    }
                }
                if self.shutdown.is_cancelled() {
                    report.interrupted = true;
                    return report;
                }
                if idx + 1 < steps.len() {
                    let wait = step.pause_after.unwrap_or_else(|| {
                        self.settings.pacing.step_delay_secs.sample_secs(&mut self.rng)
                    });
                    tracing::debug!(target: "runner", account = self.account.label(), wait = %format_wait(wait), "Next step");
                    if !pause(wait, &self.shutdown).await {
                        report.interrupted = true;
                        return report;
                    }
                }
            }

            report.cycles_completed += 1;
            if cycle < cycles {
                let wait = self.settings.pacing.cycle_delay_secs.sample_secs(&mut self.rng);
                tracing::info!(
                    target: "runner",
                    account = self.account.label(),
                    %routine,
                    wait = %format_wait(wait),
                    "Cycle complete"
                );
                if !pause(wait, &self.shutdown).await {
                    report.interrupted = true;
                    return report;
                }
            }
        }

        tracing::info!(
            target: "runner",
            account = self.account.label(),
            %routine,
            cycles = report.cycles_completed,
            steps = report.steps_succeeded,
            "Routine complete"
        );
        report
    }

    /// Runs a step, retrying the whole step after a flat delay on failure.
    pub async fn run_step(&mut self, step: &PlannedStep) -> Result<TransactionOutcome, AppError> {
        let retries = self.settings.execution.activity_retries;
        let delay = self.settings.execution.activity_retry_delay();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let err = match self.try_step(step).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) => err,
            };
            if is_terminal(&err) {
                tracing::warn!(
                    target: "runner",
                    account = self.account.label(),
                    activity = %step.activity,
                    error = %err.truncated(ERROR_PREVIEW_CHARS),
                    "Step cannot succeed this cycle"
                );
                return Err(err);
            }
            if attempt > retries {
                return Err(err);
            }
            tracing::warn!(
                target: "runner",
                account = self.account.label(),
                activity = %step.activity,
                attempt,
                of = retries + 1,
                error = %err.truncated(ERROR_PREVIEW_CHARS),
                wait = %format_wait(delay),
                "Step failed; retrying"
            );
            if !pause(delay, &self.shutdown).await {
                return Err(err);
            }
        }
    }

    async fn try_step(&mut self, step: &PlannedStep) -> Result<TransactionOutcome, AppError> {
        let prepared = step.activity.prepare(&self.account, &mut self.context).await?;
        tracing::info!(
            target: "runner",
            account = self.account.label(),
            activity = %step.activity,
            value = %format_native(step.activity.value()),
            "Executing"
        );
        let outcome = self.executor.execute(&self.account, &prepared.intent).await?;
        if !outcome.success {
            return Err(AppError::Transaction {
                hash: format!("{:#x}", outcome.hash),
                reason: "reverted on-chain".into(),
            });
        }
        if let Some(follow_up) = &prepared.follow_up
            && let Err(e) = follow_up.complete(&self.context, &outcome).await
        {
            // The transaction is mined; repeating the step would pay twice.
            tracing::warn!(
                target: "runner",
                account = self.account.label(),
                error = %e.truncated(ERROR_PREVIEW_CHARS),
                "Post-transaction confirmation failed"
            );
        }
        Ok(outcome)
    }

    async fn log_balance(&self, routine: Routine) {
        match self
            .executor
            .chain()
            .get_balance(self.account.address())
            .await
        {
            Ok(balance) => tracing::info!(
                target: "runner",
                account = self.account.label(),
                %routine,
                balance = %format!("{} {NATIVE_SYMBOL}", format_native(balance)),
                "Starting routine"
            ),
            Err(e) => tracing::warn!(
                target: "runner",
                account = self.account.label(),
                %routine,
                error = %e,
                "Balance lookup failed"
            ),
        }
    }
}
