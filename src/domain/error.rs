// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::fmt;
use thiserror::Error;

/// Structured failure classes reported by a `ChainClient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainErrorKind {
    InsufficientFunds,
    RateLimited,
    Reverted,
    OutOfGas,
    NonceConflict,
    Transport,
    Unknown,
}

impl ChainErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainErrorKind::InsufficientFunds => "insufficient_funds",
            ChainErrorKind::RateLimited => "rate_limited",
            ChainErrorKind::Reverted => "reverted",
            ChainErrorKind::OutOfGas => "out_of_gas",
            ChainErrorKind::NonceConflict => "nonce_conflict",
            ChainErrorKind::Transport => "transport",
            ChainErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ChainErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ChainError {
    pub kind: ChainErrorKind,
    pub message: String,
}

impl ChainError {
    pub fn new(kind: ChainErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Chain error ({0})")]
    Chain(#[from] ChainError),

    #[error("Transaction failed: {hash:?}, reason: {reason}")]
    Transaction { hash: String, reason: String },

    #[error("Funder balance too low. Required: {required}, Available: {available}")]
    FunderDepleted { required: String, available: String },

    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Still underfunded after {attempts} top-ups")]
    FundingExhausted { attempts: u32 },

    #[error("No receipt for {hash} before timeout")]
    ReceiptTimeout { hash: String },

    #[error("External API error: {provider} responded with {status}")]
    ApiCall { provider: String, status: u16 },

    #[error("Activity failed: {0}")]
    Activity(String),

    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Error text cut down for single-line log output.
    pub fn truncated(&self, max_chars: usize) -> String {
        let full = self.to_string();
        if full.chars().count() <= max_chars {
            return full;
        }
        let mut cut: String = full.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    }

    pub fn chain_kind(&self) -> Option<ChainErrorKind> {
        match self {
            AppError::Chain(e) => Some(e.kind),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Connection(err.to_string())
    }
}
