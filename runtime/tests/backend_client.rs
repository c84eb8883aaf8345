// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Backend client against a wiremock stand-in for the scan API.

use adaptivetest_runtime::backend::{BackendClient, BackendError, ScanPhase, ScanState, StartScan};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client() -> (MockServer, BackendClient) {
    let server = MockServer::start().await;
    let client = BackendClient::new(&format!("{}/api/v1/", server.uri()));
    (server, client)
}

#[tokio::test]
async fn test_start_scan_posts_url() {
    let (server, client) = client().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/scan/start"))
        .and(body_json(json!({ "url": "https://example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "scan_id": 42,
            "status": "started",
            "message": "Accessibility scan initiated for https://example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let started = client.start_scan("https://example.com").await.unwrap();
    assert!(matches!(started, StartScan::Queued { scan_id: 42, .. }));
}

#[tokio::test]
async fn test_status_and_report() {
    let (server, client) = client().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/scan/42/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "scan_id": 42,
            "status": "completed",
            "phase": "reporting",
            "url": "https://example.com",
            "created_at": "2026-01-01T00:00:00"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/scan/42/report"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "scan_id": 42,
            "url": "https://example.com",
            "status": "completed",
            "issues": [{ "id": 1, "code": "WCAG2AA.X", "type": "error", "message": "m" }],
            "summary": { "total_issues": 1, "errors": 1, "warnings": 0, "notices": 0 }
        })))
        .mount(&server)
        .await;

    let status = client.scan_status(42).await.unwrap();
    assert_eq!(status.status, ScanState::Completed);
    assert_eq!(status.phase, ScanPhase::Reporting);
    assert!(status.status.is_finished());

    let report = client.report(42).await.unwrap();
    assert_eq!(report.summary.errors, 1);
    assert_eq!(report.issues[0].code, "WCAG2AA.X");
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let (server, client) = client().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/scan/7/report"))
        .respond_with(ResponseTemplate::new(425).set_body_json(json!({"detail": "Scan not completed yet"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/scan/8/report/pdf"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    assert!(matches!(client.scan_status(99).await, Err(BackendError::NotFound)));
    assert!(matches!(client.report(7).await, Err(BackendError::NotReady)));
    match client.report_pdf(8).await {
        Err(BackendError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pdf_and_results() {
    let (server, client) = client().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/scan/results/download"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/scan/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }, { "id": 2 }])))
        .mount(&server)
        .await;

    assert!(client.results_pdf().await.unwrap().starts_with(b"%PDF"));
    assert_eq!(client.results().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_json_is_json_error() {
    let (server, client) = client().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/scan/1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
        .mount(&server)
        .await;

    assert!(matches!(client.scan_status(1).await, Err(BackendError::Json(_))));
}
