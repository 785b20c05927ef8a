// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod activity;
pub mod execution;
pub mod orchestrator;
pub mod runner;
