// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Bounded exponential backoff: `base`, `base * 2`, `base * 4`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max_retries: u32,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max_retries: u32) -> Self {
        Self { base, max_retries }
    }

    /// Delay before retry number `retry` (0-based), or `None` once the ceiling is hit.
    pub fn delay_for(&self, retry: u32) -> Option<Duration> {
        if retry >= self.max_retries {
            return None;
        }
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        Some(self.base.saturating_mul(factor))
    }

    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_retries).filter_map(|r| self.delay_for(r)).collect()
    }
}

/// Retry an async operation with exponential backoff.
pub async fn retry_async<F, Fut, T, E>(
    mut op: F,
    attempts: usize,
    initial_delay: Duration,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = initial_delay;
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(_) if attempt < attempts => {
                sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32, ()> = retry_async(
            |_| {
                let current = counter.fetch_add(1, Ordering::Relaxed);
                async move { if current < 2 { Err(()) } else { Ok(7) } }
            },
            4,
            Duration::from_millis(1),
        )
        .await;

        assert_eq!(res.unwrap(), 7);
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn gives_up_after_attempts() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32, &str> = retry_async(
            |_| {
                counter.fetch_add(1, Ordering::Relaxed);
                async { Err("nope") }
            },
            2,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(res, Err("nope"));
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn backoff_doubles_and_stops_at_ceiling() {
        let policy = BackoffPolicy::new(Duration::from_secs(2), 3);
        assert_eq!(
            policy.schedule(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
        assert_eq!(policy.delay_for(3), None);
    }

    #[test]
    fn backoff_with_zero_retries_never_waits() {
        let policy = BackoffPolicy::new(Duration::from_secs(1), 0);
        assert!(policy.schedule().is_empty());
    }
}
