// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::account::Account;
use std::fs;
use std::path::Path;

/// One private key per non-empty line; `#` starts a comment line.
pub fn parse_key_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Applies a 1-based inclusive `[start, end]` window. An out-of-range or inverted
/// window falls back to the full list.
pub fn select_window<T: Clone>(items: &[T], range: Option<(usize, usize)>) -> Vec<T> {
    match range {
        Some((start, end)) if start >= 1 && start <= end && end <= items.len() => {
            items[start - 1..end].to_vec()
        }
        Some((start, end)) => {
            tracing::warn!(
                target: "config",
                start,
                end,
                available = items.len(),
                "Invalid private_keys_range; using all keys"
            );
            items.to_vec()
        }
        None => items.to_vec(),
    }
}

pub fn load_accounts(
    path: impl AsRef<Path>,
    range: Option<(usize, usize)>,
) -> Result<Vec<Account>, AppError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Failed to read key file {}: {e}", path.display()))
    })?;
    let keys = parse_key_lines(&content);
    if keys.is_empty() {
        return Err(AppError::Config(format!(
            "No private keys found in {}",
            path.display()
        )));
    }
    let selected = select_window(&keys, range);
    let accounts = selected
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            Account::from_private_key(raw).map_err(|_| {
                AppError::Config(format!("Invalid private key on entry {}", idx + 1))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(target: "config", total = keys.len(), selected = accounts.len(), "Loaded accounts");
    Ok(accounts)
}
