// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use alloy::network::Ethereum;
use alloy::providers::RootProvider;
use alloy::rpc::client::RpcClient;
use alloy::transports::http::Http;
use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use url::Url;

pub type HttpProvider = RootProvider<Ethereum>;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT_TEMPLATES: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/{webkit} (KHTML, like Gecko) Chrome/{chrome} Safari/{webkit}",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/{webkit} (KHTML, like Gecko) Chrome/{chrome} Safari/{webkit}",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/{webkit} (KHTML, like Gecko) Chrome/{chrome} Safari/{webkit}",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/{webkit} (KHTML, like Gecko) Firefox/{firefox}",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:{firefox}) Gecko/20100101 Firefox/{firefox}",
];

/// Browser-looking user agent with randomised engine versions.
pub fn random_user_agent<R: Rng + ?Sized>(rng: &mut R) -> String {
    let webkit = format!("{}.{}", rng.gen_range(500..=600), rng.gen_range(0..=50));
    let chrome = format!(
        "{}.0.{}.{}",
        rng.gen_range(80..=100),
        rng.gen_range(4000..=5000),
        rng.gen_range(100..=150)
    );
    let firefox = format!("{}.0", rng.gen_range(80..=100));
    let template = USER_AGENT_TEMPLATES
        .choose(rng)
        .copied()
        .unwrap_or(USER_AGENT_TEMPLATES[0]);
    template
        .replace("{webkit}", &webkit)
        .replace("{chrome}", &chrome)
        .replace("{firefox}", &firefox)
}

pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    let agent = random_user_agent(&mut rand::thread_rng());
    if let Ok(value) = HeaderValue::from_str(&agent) {
        headers.insert(USER_AGENT, value);
    }
    headers
}

/// Shared reqwest client for RPC and REST calls, optionally routed through a
/// `http://`, `https://` or `socks5://` proxy.
pub fn build_http_client(proxy: Option<&str>) -> Result<reqwest::Client, AppError> {
    let mut builder = reqwest::Client::builder()
        .default_headers(browser_headers())
        .timeout(HTTP_TIMEOUT);
    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| AppError::Config(format!("Invalid proxy URL: {e}")))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {e}")))
}

pub struct ConnectionFactory;

impl ConnectionFactory {
    /// HTTP provider on top of a caller-built client (proxy, headers).
    pub fn http(
        rpc_url: &str,
        client: reqwest::Client,
    ) -> Result<HttpProvider, AppError> {
        let url =
            Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;
        let transport = Http::with_client(client, url);
        let rpc = RpcClient::new(transport, false);
        Ok(RootProvider::new(rpc))
    }
}
