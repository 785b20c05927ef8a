// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod executor;
pub mod funder;
pub mod intent;

pub use executor::{ExecutionPolicy, TransactionExecutor};
pub use funder::{Funder, FunderHandle, ensure_funder_covers};
pub use intent::{TransactionIntent, TransactionOutcome};
