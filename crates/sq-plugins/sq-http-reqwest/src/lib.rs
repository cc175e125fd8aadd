//! # sq-http-reqwest
//!
//! `reqwest` implementation of `Transport`.
//! Sends `Accept: application/json`, lets reqwest undo gzip/deflate, and turns
//! upstream error envelopes into readable transport errors.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use sq_core::error::TransportError;
use sq_core::parser::ErrorEnvelope;
use sq_core::traits::Transport;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Longest slice of a non-JSON error body kept in the error message.
const MAX_ERROR_SNIPPET: usize = 200;

#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Applies to the whole exchange, body included. Without one a hung
    /// upstream hangs the caller.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: concat!("stack-quiz/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Error, Debug)]
#[error("failed to build HTTP client: {0}")]
pub struct BuildError(#[from] reqwest::Error);

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(options: TransportOptions) -> Result<Self, BuildError> {
        let client = reqwest::Client::builder()
            .gzip(true)
            .deflate(true)
            .timeout(options.timeout)
            .user_agent(options.user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an already configured client. The client must have gzip and
    /// deflate decoding enabled.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, url), fields(path = %url.path()))]
    async fn get(&self, url: &Url) -> Result<String, TransportError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await;
        debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            content_type = content_type.as_deref().unwrap_or("-"),
            "upstream responded"
        );

        if !status.is_success() {
            let message = body
                .ok()
                .map(|raw| describe_error_body(&String::from_utf8_lossy(&raw)))
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("no reason").to_string());
            return Err(TransportError::from_status(status.as_u16(), message));
        }

        let body = body.map_err(body_error)?;
        String::from_utf8(body.to_vec()).map_err(|err| {
            TransportError::Decompression(format!("response body is not valid UTF-8: {err}"))
        })
    }
}

fn describe_error_body(raw: &str) -> String {
    match ErrorEnvelope::parse(raw) {
        Some(envelope) => envelope.describe(),
        None => raw.trim().chars().take(MAX_ERROR_SNIPPET).collect(),
    }
}

fn request_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Network(format!("timed out: {}", with_source(&err)))
    } else {
        TransportError::Network(with_source(&err))
    }
}

fn body_error(err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::Decompression(with_source(&err))
    } else {
        request_error(err)
    }
}

fn with_source(err: &reqwest::Error) -> String {
    match std::error::Error::source(err) {
        Some(source) => format!("{err}: {source}"),
        None => err.to_string(),
    }
}
