// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::domain::constants::{PROXY_LIST_URL, PROXY_PROBE_URL};
use futures::stream::{self, StreamExt};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ProxyDiscoveryConfig {
    pub list_url: String,
    pub probe_url: String,
    pub max_candidates: usize,
    pub concurrency: usize,
    pub probe_timeout: Duration,
}

impl Default for ProxyDiscoveryConfig {
    fn default() -> Self {
        Self {
            list_url: PROXY_LIST_URL.to_string(),
            probe_url: PROXY_PROBE_URL.to_string(),
            max_candidates: 50,
            concurrency: 20,
            probe_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProxyListResponse {
    #[serde(default)]
    proxies: Vec<ProxyListEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProxyListEntry {
    proxy: String,
    #[serde(default)]
    protocol: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkingProxy {
    pub url: String,
    pub latency: Duration,
}

/// Fetches a public proxy list, probes a random subset concurrently and returns
/// the working ones, fastest first.
pub async fn discover_proxies(cfg: &ProxyDiscoveryConfig) -> Result<Vec<WorkingProxy>, AppError> {
    let response = reqwest::get(&cfg.list_url).await?;
    if !response.status().is_success() {
        return Err(AppError::ApiCall {
            provider: "proxy list".into(),
            status: response.status().as_u16(),
        });
    }
    let list: ProxyListResponse = response.json().await?;
    let mut candidates = usable_candidates(list.proxies);
    candidates.shuffle(&mut rand::thread_rng());
    candidates.truncate(cfg.max_candidates);
    tracing::info!(target: "proxy", candidates = candidates.len(), "Probing public proxies");

    let probes = stream::iter(candidates)
        .map(|url| async move {
            let latency = probe(&url, &cfg.probe_url, cfg.probe_timeout).await;
            latency.map(|latency| WorkingProxy { url, latency })
        })
        .buffer_unordered(cfg.concurrency.max(1))
        .filter_map(|res| async move { res })
        .collect::<Vec<_>>()
        .await;

    let working = rank_by_latency(probes);
    tracing::info!(target: "proxy", working = working.len(), "Proxy probe finished");
    Ok(working)
}

/// Convenience wrapper returning only the fastest proxy.
pub async fn fastest_proxy(cfg: &ProxyDiscoveryConfig) -> Result<Option<WorkingProxy>, AppError> {
    Ok(discover_proxies(cfg).await?.into_iter().next())
}

fn usable_candidates(entries: Vec<ProxyListEntry>) -> Vec<String> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let url = entry.proxy.trim().to_string();
            if url.is_empty() {
                return None;
            }
            if url.contains("://") {
                return Some(url);
            }
            let scheme = match entry.protocol.to_ascii_lowercase().as_str() {
                "socks4" | "socks5" | "https" => entry.protocol.to_ascii_lowercase(),
                _ => "http".to_string(),
            };
            Some(format!("{scheme}://{url}"))
        })
        .collect()
}

fn rank_by_latency(mut proxies: Vec<WorkingProxy>) -> Vec<WorkingProxy> {
    proxies.sort_by_key(|p| p.latency);
    proxies
}

async fn probe(proxy_url: &str, probe_url: &str, timeout: Duration) -> Option<Duration> {
    let proxy = reqwest::Proxy::all(proxy_url).ok()?;
    let client = reqwest::Client::builder()
        .proxy(proxy)
        .timeout(timeout)
        .build()
        .ok()?;
    let started = Instant::now();
    match client.get(probe_url).send().await {
        Ok(resp) if resp.status().is_success() => Some(started.elapsed()),
        Ok(resp) => {
            tracing::trace!(target: "proxy", proxy = proxy_url, status = resp.status().as_u16(), "Probe rejected");
            None
        }
        Err(e) => {
            tracing::trace!(target: "proxy", proxy = proxy_url, error = %e, "Probe failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_get_a_scheme() {
        let entries = vec![
            ProxyListEntry {
                proxy: "socks5://1.2.3.4:1080".into(),
                protocol: "socks5".into(),
            },
            ProxyListEntry {
                proxy: "5.6.7.8:3128".into(),
                protocol: "http".into(),
            },
            ProxyListEntry {
                proxy: "9.9.9.9:1080".into(),
                protocol: "SOCKS4".into(),
            },
            ProxyListEntry {
                proxy: "  ".into(),
                protocol: "http".into(),
            },
        ];
        assert_eq!(
            usable_candidates(entries),
            vec![
                "socks5://1.2.3.4:1080".to_string(),
                "http://5.6.7.8:3128".to_string(),
                "socks4://9.9.9.9:1080".to_string(),
            ]
        );
    }

    #[test]
    fn ranking_puts_fastest_first() {
        let ranked = rank_by_latency(vec![
            WorkingProxy {
                url: "slow".into(),
                latency: Duration::from_millis(900),
            },
            WorkingProxy {
                url: "fast".into(),
                latency: Duration::from_millis(80),
            },
        ]);
        assert_eq!(ranked[0].url, "fast");
    }

    #[test]
    fn list_payload_parses() {
        let raw = r#"{"shown_records":1,"proxies":[{"proxy":"http://1.1.1.1:80","protocol":"http","ip":"1.1.1.1"}]}"#;
        let parsed: ProxyListResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.proxies.len(), 1);
        assert_eq!(parsed.proxies[0].proxy, "http://1.1.1.1:80");
    }
}
