use crate::helpers::Harness;
use auditrs::domain::models::audit_job::AuditStatus;
use auditrs::domain::repositories::audit_job_repository::AuditJobRepository;
use auditrs::presentation::routes;
use auditrs::queue::backoff::RetryPolicy;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

fn app(harness: &Harness) -> Router {
    routes::app(harness.repository.clone(), harness.scheduler.clone())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let harness = Harness::new(RetryPolicy::default());
    let response = app(&harness).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test(start_paused = true)]
async fn test_submit_audit_and_fetch_report() {
    let harness = Harness::new(RetryPolicy::default());

    let (status, body) = send(
        app(&harness),
        post_json("/v1/audits", json!({"url": "https://example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "pending");
    let id: Uuid = body["jobId"].as_str().unwrap().parse().unwrap();

    harness
        .wait_for_status(id, AuditStatus::Completed, Duration::from_secs(5))
        .await;

    let (status, body) = send(app(&harness), get(&format!("/v1/audits/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["hasResults"], true);
    assert_eq!(body["url"], "https://example.com");

    let (status, body) = send(app(&harness), get(&format!("/v1/audits/{}/results", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"]["summary"]["url"], "https://example.com");
    assert_eq!(body["results"]["summary"]["totalTags"], 1);
    assert!(body["analysisData"]["auditFindings"].is_array());
}

#[tokio::test]
async fn test_results_conflict_until_completed() {
    let harness = Harness::new(RetryPolicy::default());
    let record = harness.repository.create("https://example.com").await.unwrap();

    let (status, body) = send(
        app(&harness),
        get(&format!("/v1/audits/{}/results", record.id)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("pending"));
}

#[tokio::test]
async fn test_invalid_url_is_rejected() {
    let harness = Harness::new(RetryPolicy::default());

    for url in ["not a url", "ftp://example.com/file"] {
        let (status, _) = send(app(&harness), post_json("/v1/audits", json!({ "url": url }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} accepted", url);
    }
    assert!(harness.repository.ids_reaching(AuditStatus::Scanning).is_empty());
    assert_eq!(harness.scheduler.status().queue_length, 0);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let harness = Harness::new(RetryPolicy::default());

    let (status, body) = send(app(&harness), get(&format!("/v1/audits/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = send(app(&harness), get("/v1/audits/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_queue_status_endpoint() {
    let harness = Harness::new(RetryPolicy::default());

    let (status, body) = send(app(&harness), get("/v1/queue")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queueLength"], 0);
    assert_eq!(body["isProcessing"], false);
    assert_eq!(body["scheduledRetries"], 0);
    assert_eq!(body["jobs"], json!([]));
}

#[tokio::test]
async fn test_list_audits_endpoint() {
    let harness = Harness::new(RetryPolicy::default());
    for host in ["one", "two", "three"] {
        harness
            .repository
            .create(&format!("https://{}.example.com", host))
            .await
            .unwrap();
    }

    let (status, body) = send(app(&harness), get("/v1/audits")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 3);
    assert_eq!(body["audits"][0]["status"], "pending");
    assert!(body["audits"][0]["results"].is_null());

    let (status, body) = send(app(&harness), get("/v1/audits?limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["audits"].as_array().unwrap().len(), 2);

    let (status, _) = send(app(&harness), get("/v1/audits?limit=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
