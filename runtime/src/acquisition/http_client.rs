// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Async HTTP client wrapping reqwest.
//!
//! Not a browser — just HTTP requests. One request per call: retry policy
//! belongs to the probe, which swaps schemes at most once.

use crate::error::{Result, ScanError};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use url::Url;

/// Response from fetching the target page.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Content-Type header.
    pub content_type: Option<String>,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("html") || ct.contains("xml"))
            .unwrap_or(true)
    }
}

/// Outcome of checking a single link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStatus {
    pub href: String,
    /// `None` when no response was received.
    pub status: Option<u16>,
}

impl LinkStatus {
    pub fn is_broken(&self) -> bool {
        !matches!(self.status, Some(s) if s < 400)
    }
}

/// HTTP client for page acquisition.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a new HTTP client with the given user-agent.
    pub fn new(user_agent: &str, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent)
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// Fetch the target page. Non-2xx statuses are returned, not raised.
    pub async fn get(&self, url: &Url, timeout_ms: u64) -> Result<HttpResponse> {
        let resp = self
            .client
            .get(url.clone())
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|e| ScanError::from_request(&e, timeout_ms))?;

        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = resp
            .text()
            .await
            .map_err(|e| ScanError::from_request(&e, timeout_ms))?;

        Ok(HttpResponse {
            url: url.to_string(),
            final_url,
            status,
            content_type,
            body,
        })
    }

    /// Check links with bounded concurrency, preserving input order.
    ///
    /// Uses HEAD, and re-asks with GET when a server rejects HEAD (405/501).
    pub async fn check_links(
        &self,
        urls: &[String],
        concurrency: usize,
        timeout_ms: u64,
    ) -> Vec<LinkStatus> {
        stream::iter(urls.iter().cloned())
            .map(|href| {
                let client = self.client.clone();
                async move {
                    let timeout = Duration::from_millis(timeout_ms);
                    let head = client.head(&href).timeout(timeout).send().await;
                    let status = match head {
                        Ok(r) if matches!(r.status().as_u16(), 405 | 501) => client
                            .get(&href)
                            .timeout(timeout)
                            .send()
                            .await
                            .ok()
                            .map(|r| r.status().as_u16()),
                        Ok(r) => Some(r.status().as_u16()),
                        Err(e) => {
                            tracing::debug!("link check failed for {href}: {e}");
                            None
                        }
                    };
                    LinkStatus { href, status }
                }
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}
