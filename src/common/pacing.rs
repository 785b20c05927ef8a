// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use rand::Rng;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Inclusive `[min, max]` interval in whole units (seconds or hours, per field).
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    pub fn sample_secs<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_secs(self.sample(rng))
    }

    pub fn sample_hours<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_secs(self.sample(rng).saturating_mul(3600))
    }
}

/// Sleeps for `duration` unless `shutdown` fires first. Returns `false` when cancelled.
pub async fn pause(duration: Duration, shutdown: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !shutdown.is_cancelled();
    }
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// `1h 2m 3s`, `4m 5s` or `6s`.
pub fn format_wait(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
