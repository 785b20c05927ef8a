// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const NOISY_CRATES: &[&str] = &[
    "h2",
    "hyper",
    "hyper_util",
    "reqwest",
    "rustls",
    "alloy_transport_http",
    "alloy_rpc_client",
];

/// Bare levels (`debug`) get the HTTP stack capped at `info`; full directive
/// strings (containing `,` or `=`) are used as given.
pub fn filter_directives(log_level: &str) -> String {
    let normalized = log_level.trim();
    let normalized = if normalized.is_empty() {
        "info"
    } else {
        normalized
    };
    if normalized.contains(',') || normalized.contains('=') {
        return normalized.to_string();
    }
    let caps = NOISY_CRATES
        .iter()
        .map(|name| format!("{name}=info"))
        .collect::<Vec<_>>()
        .join(",");
    format!("{normalized},{caps}")
}

pub fn setup_logging(log_level: &str, json_format: bool) {
    let filter_spec = filter_directives(log_level);
    let filter = EnvFilter::from_str(&filter_spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        subscriber.with(fmt_layer).init();
    }

    let base = filter_spec.split(',').next().unwrap_or("info");
    tracing::info!(
        base,
        format = if json_format { "json" } else { "compact" },
        "Logging initialized"
    );
}
