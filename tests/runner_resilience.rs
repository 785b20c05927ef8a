// SPDX-License-Identifier: MIT
// Account-level resilience of the activity runner: flat step retries, early
// abandonment on terminal errors, and shutdown between steps.

mod support;

use oxidity_farmer::app::config::GlobalSettings;
use oxidity_farmer::domain::constants::WMON;
use oxidity_farmer::services::activity::{Activity, ActivityContext, PlannedStep, Routine};
use oxidity_farmer::services::execution::{Funder, TransactionExecutor};
use oxidity_farmer::services::runner::ActivityRunner;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use support::{FUNDER_KEY, MockChain, USER_KEY, account, native, quiet_settings};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn runner(
    chain: &Arc<MockChain>,
    settings: GlobalSettings,
    shutdown: &CancellationToken,
) -> ActivityRunner<MockChain> {
    let settings = Arc::new(settings);
    let policy = settings.execution.policy();
    let (handle, _task) = Funder::new(
        account(FUNDER_KEY),
        settings.fund_amount_wei(),
        TransactionExecutor::new(chain.clone(), policy.clone()),
    )
    .spawn(shutdown.clone());
    let executor = Arc::new(TransactionExecutor::new(chain.clone(), policy).with_funder(handle));
    let context = ActivityContext::new(chain.clone(), reqwest::Client::new(), None, 0);
    ActivityRunner::new(
        account(USER_KEY),
        executor,
        context,
        settings,
        shutdown.clone(),
    )
    .with_rng(StdRng::seed_from_u64(42))
}

#[tokio::test]
async fn wrap_cycle_completes_on_a_healthy_chain() {
    let chain = Arc::new(MockChain::new());
    let user = account(USER_KEY);
    chain.fund(user.address(), native("1"));
    let shutdown = CancellationToken::new();
    let mut runner = runner(&chain, quiet_settings(), &shutdown);

    let report = runner.run_routine(Routine::Wrap).await;

    assert_eq!(report.cycles_planned, 1);
    assert_eq!(report.cycles_completed, 1);
    assert_eq!(report.steps_succeeded, 2);
    assert!(!report.abandoned && !report.interrupted);
    let sent = chain.broadcasts_from(user.address());
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|b| b.to == Some(WMON)));
    assert_eq!(sent[1].value, alloy::primitives::U256::ZERO);
    shutdown.cancel();
}

#[tokio::test(start_paused = true)]
async fn failed_step_is_retried_after_flat_delay() {
    let chain = Arc::new(MockChain::new());
    let user = account(USER_KEY);
    chain.fund(user.address(), native("1"));
    chain.fail_sends(&["invalid opcode", "invalid opcode"]);
    let shutdown = CancellationToken::new();
    let mut runner = runner(&chain, quiet_settings(), &shutdown);

    let started = Instant::now();
    let report = runner.run_routine(Routine::Wrap).await;

    assert_eq!(report.steps_succeeded, 2);
    assert!(!report.abandoned);
    assert_eq!(chain.send_attempts(), 4);
    assert!(started.elapsed() >= Duration::from_secs(60), "two 30s retry delays");
    shutdown.cancel();
}

#[tokio::test(start_paused = true)]
async fn routine_is_abandoned_after_retries_run_out() {
    let chain = Arc::new(MockChain::new());
    let user = account(USER_KEY);
    chain.fund(user.address(), native("1"));
    chain.fail_sends(&["invalid opcode"; 8]);
    let shutdown = CancellationToken::new();
    let mut runner = runner(&chain, quiet_settings(), &shutdown);

    let report = runner.run_routine(Routine::Wrap).await;

    assert!(report.abandoned);
    assert_eq!(report.steps_succeeded, 0);
    assert_eq!(report.cycles_completed, 0);
    // First attempt plus three retries; the unwrap step never starts.
    assert_eq!(chain.send_attempts(), 4);
    assert!(
        report
            .last_error
            .as_deref()
            .is_some_and(|e| e.contains("invalid opcode"))
    );
    shutdown.cancel();
}

#[tokio::test]
async fn depleted_funder_ends_routine_without_step_retries() {
    let chain = Arc::new(MockChain::new());
    let user = account(USER_KEY);
    let shutdown = CancellationToken::new();
    let mut runner = runner(&chain, quiet_settings(), &shutdown);

    let report = runner.run_routine(Routine::Wrap).await;

    assert!(report.abandoned);
    assert_eq!(report.steps_succeeded, 0);
    assert_eq!(chain.nonce_reads(user.address()), 1);
    assert!(chain.broadcasts().is_empty());
    shutdown.cancel();
}

#[tokio::test]
async fn run_step_returns_outcome_for_single_activity() {
    let chain = Arc::new(MockChain::new());
    let user = account(USER_KEY);
    chain.fund(user.address(), native("1"));
    let shutdown = CancellationToken::new();
    let mut runner = runner(&chain, quiet_settings(), &shutdown);

    let step = PlannedStep {
        activity: Activity::ZonaBet {
            amount: native("0.001"),
        },
        pause_after: None,
    };
    let outcome = runner.run_step(&step).await.expect("bet");
    assert!(outcome.success);
    assert_eq!(chain.broadcasts()[0].value, native("0.001"));
    shutdown.cancel();
}

#[tokio::test]
async fn shutdown_stops_between_steps() {
    let chain = Arc::new(MockChain::new());
    let user = account(USER_KEY);
    chain.fund(user.address(), native("1"));
    let shutdown = CancellationToken::new();
    let mut runner = runner(&chain, quiet_settings(), &shutdown);
    shutdown.cancel();

    let report = runner.run_routine(Routine::Wrap).await;

    assert!(report.interrupted);
    assert_eq!(report.steps_succeeded, 1);
    assert_eq!(chain.broadcasts().len(), 1);
}

#[tokio::test]
async fn day_skips_disabled_routines() {
    let chain = Arc::new(MockChain::new());
    let user = account(USER_KEY);
    chain.fund(user.address(), native("1"));
    let shutdown = CancellationToken::new();
    let mut runner = runner(&chain, quiet_settings(), &shutdown);

    let reports = runner.run_day().await;

    assert_eq!(reports.len(), Routine::ALL.len());
    for report in &reports {
        if report.routine == Routine::Wrap {
            assert_eq!(report.steps_succeeded, 2);
        } else {
            assert_eq!(report.cycles_planned, 0);
            assert_eq!(report.steps_succeeded, 0);
        }
    }
    assert_eq!(chain.broadcasts_from(user.address()).len(), 2);
    shutdown.cancel();
}
