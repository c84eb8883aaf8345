// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Client for the remote scan backend.
//!
//! The backend queues scans, stores reports and renders PDFs; the results UI
//! talks to it through these endpoints. This client only issues requests and
//! decodes responses: polling cadence and where PDFs end up are the
//! caller's business.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Base URL of a backend running locally.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/api/v1";

/// Errors from talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("scan not found")]
    NotFound,

    #[error("scan not completed yet")]
    NotReady,

    #[error("backend responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid backend response: {0}")]
    Json(#[from] serde_json::Error),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Lifecycle state of a queued scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    Pending,
    Scanning,
    Completed,
    Failed,
}

impl ScanState {
    pub fn is_finished(self) -> bool {
        matches!(self, ScanState::Completed | ScanState::Failed)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanState::Pending => "pending",
            ScanState::Scanning => "scanning",
            ScanState::Completed => "completed",
            ScanState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Progress phase shown by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    Crawling,
    Analyzing,
    Reporting,
    Failed,
}

/// Answer to `POST /scan/start`: either a queued scan id or, for backends
/// that scan synchronously, the finished report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartScan {
    Queued {
        scan_id: i64,
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Immediate {
        report: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanStatus {
    pub scan_id: i64,
    pub status: ScanState,
    pub phase: ScanPhase,
    pub url: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteSummary {
    #[serde(default)]
    pub total_issues: usize,
    #[serde(default)]
    pub errors: usize,
    #[serde(default)]
    pub warnings: usize,
    #[serde(default)]
    pub notices: usize,
    #[serde(default)]
    pub accessibility_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteIssue {
    pub code: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A stored report. Fields this client does not model are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteReport {
    pub scan_id: i64,
    pub url: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: RemoteSummary,
    #[serde(default)]
    pub issues: Vec<RemoteIssue>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// HTTP client for the backend API.
#[derive(Clone)]
pub struct BackendClient {
    base: String,
    client: reqwest::Client,
}

impl Default for BackendClient {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL)
    }
}

impl BackendClient {
    pub fn new(base: &str) -> Self {
        Self::with_client(base, reqwest::Client::new())
    }

    pub fn with_client(base: &str, client: reqwest::Client) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Queue a scan of `url`.
    pub async fn start_scan(&self, url: &str) -> BackendResult<StartScan> {
        let resp = self
            .client
            .post(self.endpoint("scan/start"))
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn scan_status(&self, scan_id: i64) -> BackendResult<ScanStatus> {
        self.get_json(&format!("scan/{scan_id}/status")).await
    }

    pub async fn report(&self, scan_id: i64) -> BackendResult<RemoteReport> {
        self.get_json(&format!("scan/{scan_id}/report")).await
    }

    /// PDF rendering of one report.
    pub async fn report_pdf(&self, scan_id: i64) -> BackendResult<Vec<u8>> {
        self.get_bytes(&format!("scan/{scan_id}/report/pdf")).await
    }

    /// Every stored result.
    pub async fn results(&self) -> BackendResult<Vec<Value>> {
        self.get_json("scan/results").await
    }

    /// PDF rendering of every stored result.
    pub async fn results_pdf(&self) -> BackendResult<Vec<u8>> {
        self.get_bytes("scan/results/download").await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        let resp = self.client.get(self.endpoint(path)).send().await?;
        decode(resp).await
    }

    async fn get_bytes(&self, path: &str) -> BackendResult<Vec<u8>> {
        let resp = check_status(self.client.get(self.endpoint(path)).send().await?).await?;
        Ok(resp.bytes().await?.to_vec())
    }
}

async fn check_status(resp: reqwest::Response) -> BackendResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    match status.as_u16() {
        404 => Err(BackendError::NotFound),
        425 => Err(BackendError::NotReady),
        code => Err(BackendError::Status {
            status: code,
            body: resp.text().await.unwrap_or_default(),
        }),
    }
}

async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> BackendResult<T> {
    let bytes = check_status(resp).await?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_url_tolerates_trailing_slash() {
        let client = BackendClient::new("http://localhost:8000/api/v1/");
        assert_eq!(client.base_url(), "http://localhost:8000/api/v1");
        assert_eq!(
            client.endpoint("scan/7/status"),
            "http://localhost:8000/api/v1/scan/7/status"
        );
        assert_eq!(BackendClient::default().base_url(), DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_start_scan_shapes() {
        let queued: StartScan =
            serde_json::from_value(json!({"scan_id": 12, "status": "started"})).unwrap();
        assert!(matches!(queued, StartScan::Queued { scan_id: 12, .. }));

        let immediate: StartScan =
            serde_json::from_value(json!({"report": {"summary": {"issues": 0}}})).unwrap();
        assert!(matches!(immediate, StartScan::Immediate { .. }));
    }

    #[test]
    fn test_status_decodes() {
        let status: ScanStatus = serde_json::from_value(json!({
            "scan_id": 3,
            "status": "scanning",
            "phase": "crawling",
            "url": "https://example.com",
            "created_at": null
        }))
        .unwrap();
        assert_eq!(status.status, ScanState::Scanning);
        assert!(!status.status.is_finished());
        assert_eq!(status.phase, ScanPhase::Crawling);
    }

    #[test]
    fn test_report_keeps_unknown_fields() {
        let report: RemoteReport = serde_json::from_value(json!({
            "scan_id": 3,
            "url": "https://example.com",
            "status": "completed",
            "summary": {"total_issues": 1, "errors": 1, "warnings": 0, "notices": 0, "accessibility_score": 95},
            "issues": [{"id": 9, "code": "WCAG2AA.X", "type": "error", "message": "m", "severity": "high"}],
            "scan_duration": "Completed"
        }))
        .unwrap();
        assert_eq!(report.summary.total_issues, 1);
        assert_eq!(report.issues[0].extra["severity"], "high");
        assert_eq!(report.extra["scan_duration"], "Completed");
    }
}
