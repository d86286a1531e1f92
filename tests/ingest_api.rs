use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use siem_log_pipeline::models::Severity;
use siem_log_pipeline::router::create_router;
use siem_log_pipeline::state::AppState;
use siem_log_pipeline::storage::MemoryStorage;

const API_KEY: &str = "test-api-key";

fn test_app() -> (Router, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    storage.add_source("edge-fw-01", "api", Some("10.1.2.3"), API_KEY, true);
    let app = create_router(AppState::new(storage.clone()));
    (app, storage)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, key: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn ingest_without_key_is_unauthorized() {
    let (app, _) = test_app();
    let (status, body) = send(app, post_json("/api/ingest", None, json!({"message": "x"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "API key required");
}

#[tokio::test]
async fn ingest_with_unknown_key_is_forbidden() {
    let (app, _) = test_app();
    let (status, body) = send(
        app,
        post_json("/api/ingest", Some("wrong-key"), json!({"message": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid API key");
}

#[tokio::test]
async fn ingest_with_deactivated_key_is_forbidden() {
    let storage = Arc::new(MemoryStorage::new());
    storage.add_source("old", "api", None, "retired-key", false);
    let app = create_router(AppState::new(storage));

    let (status, _) = send(
        app,
        post_json("/api/ingest", Some("retired-key"), json!({"message": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn ingest_accepts_the_key_as_query_parameter() {
    let (app, _) = test_app();
    let (status, _) = send(
        app,
        post_json(
            &format!("/api/ingest?api_key={}", API_KEY),
            None,
            json!({"message": "via query"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn single_valid_record_is_persisted_with_normalized_severity() {
    let (app, storage) = test_app();
    let (status, body) = send(
        app,
        post_json(
            "/api/ingest",
            Some(API_KEY),
            json!({"message": "disk full", "severity": "critical"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["inserted"], 1);
    assert_eq!(body["total"], 1);
    assert!(body.get("errors").is_none());

    let events = storage.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Critical);

    let source = storage.source(1).unwrap();
    assert_eq!(source.total_logs_received, 1);
    assert!(source.last_received.is_some());
}

#[tokio::test]
async fn sole_empty_message_record_yields_the_documented_error_body() {
    let (app, storage) = test_app();
    let (status, body) = send(
        app,
        post_json(
            "/api/ingest",
            Some(API_KEY),
            json!({"message": "", "severity": "warning"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "status": "error",
            "inserted": 0,
            "total": 1,
            "errors": ["Log 0: message is required"],
            "error_count": 1
        })
    );
    assert!(storage.events().is_empty());
    assert_eq!(storage.source(1).unwrap().total_logs_received, 0);
}

#[tokio::test]
async fn batch_partial_failure_reports_both_counts() {
    let (app, storage) = test_app();
    let (status, body) = send(
        app,
        post_json(
            "/api/ingest",
            Some(API_KEY),
            json!([
                {"message": "one"},
                {"severity": "error"},
                {"message": "three", "severity": "warning"},
                "not an object"
            ]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["inserted"], 2);
    assert_eq!(body["total"], 4);
    assert_eq!(body["error_count"], 2);
    assert_eq!(body["errors"][0], "Log 1: message is required");
    assert_eq!(body["errors"][1], "Log 3: record is not a JSON object");

    assert_eq!(storage.events().len(), 2);
    assert_eq!(storage.source(1).unwrap().total_logs_received, 2);
}

#[tokio::test]
async fn error_list_is_capped_at_ten_with_full_count() {
    let (app, _) = test_app();
    let records: Vec<Value> = (0..12).map(|_| json!({"message": ""})).collect();
    let (status, body) = send(
        app,
        post_json("/api/ingest", Some(API_KEY), Value::Array(records)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 10);
    assert_eq!(body["error_count"], 12);
    assert_eq!(body["total"], 12);
}

#[tokio::test]
async fn empty_payload_is_rejected() {
    let (app, _) = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/ingest")
        .header("x-api-key", API_KEY)
        .header("content-type", "application/json")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Empty payload");

    let (app, _) = test_app();
    let (status, _) = send(app, post_json("/api/ingest", Some(API_KEY), json!([]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn syslog_empty_body_yields_the_documented_error() {
    let (app, _) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/syslog")
        .header("x-api-key", API_KEY)
        .body(Body::from("   \n"))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Empty syslog data");
}

#[tokio::test]
async fn syslog_body_becomes_one_attributed_event() {
    let (app, storage) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/syslog")
        .header("x-api-key", API_KEY)
        .body(Body::from("<34>Mar 15 12:00:00 host sshd[42]: refused connect"))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Syslog event received");

    let events = storage.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Info);
    assert_eq!(events[0].event_type.as_deref(), Some("SYSLOG"));
    assert_eq!(events[0].source_host.as_deref(), Some("edge-fw-01"));
    assert_eq!(events[0].source_ip.as_deref(), Some("10.1.2.3"));
    assert_eq!(storage.source(1).unwrap().total_logs_received, 1);
}

#[tokio::test]
async fn syslog_without_key_is_unauthorized_even_when_body_is_empty() {
    let (app, _) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/syslog")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logs_endpoints_list_newest_first_with_filters() {
    let (app, _) = test_app();
    let records = json!([
        {"message": "a", "severity": "info"},
        {"message": "b", "severity": "critical"},
        {"message": "c", "severity": "critical"}
    ]);
    let (status, _) = send(app.clone(), post_json("/api/ingest", Some(API_KEY), records)).await;
    assert_eq!(status, StatusCode::CREATED);

    let request = Request::builder()
        .uri("/api/logs?severity=CRITICAL")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["severity"], "CRITICAL");
    assert!(body[0].get("raw_log").is_none());

    let request = Request::builder()
        .uri("/api/logs/latest?limit=2")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn daily_report_requires_a_valid_group_and_date() {
    let (app, _) = test_app();

    let request = Request::builder()
        .uri("/api/daily-report")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Group ID is required");

    let request = Request::builder()
        .uri("/api/daily-report?group=abc")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid group ID");

    let request = Request::builder()
        .uri("/api/daily-report?group=1&date=15-03-2024")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date format. Use YYYY-MM-DD");
}

#[tokio::test]
async fn daily_report_is_generated_then_cached() {
    let (app, storage) = test_app();
    let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let group = storage.add_group("ops");
    storage.add_user(
        "alice",
        Some(group),
        Some(day.and_hms_opt(9, 0, 0).unwrap().and_utc()),
    );
    storage.add_user("bob", Some(group), None);

    let uri = format!("/api/daily-report?group={}&date=2024-03-15", group);
    let request = Request::builder().uri(&uri).body(Body::empty()).unwrap();
    let (status, first) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["total_users"], 2);
    assert_eq!(first["active_users"], 1);
    assert_eq!(first["missing_work_count"], 1);
    assert_eq!(first["total_events"], 0);
    assert_eq!(
        first["summary"],
        format!(
            "Daily report for group {}: 1/2 users active, 0 events, 0 critical alerts",
            group
        )
    );

    // New events on that date do not change the cached report.
    let (status, _) = send(
        app.clone(),
        post_json(
            "/api/ingest",
            Some(API_KEY),
            json!({"message": "late", "severity": "critical", "timestamp": "2024-03-15T18:00:00Z"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let request = Request::builder().uri(&uri).body(Body::empty()).unwrap();
    let (status, second) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["total_events"], 0);
}

#[tokio::test]
async fn daily_report_for_unknown_group_fails_closed() {
    let (app, _) = test_app();
    let request = Request::builder()
        .uri("/api/daily-report?group=999")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unable to generate report");
}

#[tokio::test]
async fn source_registration_generates_a_key() {
    let (app, _) = test_app();
    let (status, body) = send(
        app.clone(),
        post_json(
            "/api/sources",
            None,
            json!({"name": "agent-9", "source_type": "api"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["api_key"].as_str().unwrap().is_empty());

    let request = Request::builder()
        .uri("/api/sources")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn csv_import_accepts_rows_and_reports_accounting() {
    let (app, storage) = test_app();
    let csv = "Level,Operation,Details,Terminal IP Address,Source,Time\n\
               Critical,Login,bad password,10.0.0.1,TERM-1,2024-03-15 08:30:00\n\
               Minor,,,,,\n\
               Warning,Logout,done,10.0.0.2,TERM-2,\n";

    let boundary = "csv-test-boundary";
    let body = format!(
        "--{b}\r\ncontent-disposition: form-data; name=\"log_source_id\"\r\n\r\n1\r\n\
         --{b}\r\ncontent-disposition: form-data; name=\"file\"; filename=\"events.csv\"\r\n\
         content-type: text/csv\r\n\r\n{csv}\r\n--{b}--\r\n",
        b = boundary,
        csv = csv
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/import/csv")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["inserted"], 3);
    assert_eq!(body["total"], 3);

    let events = storage.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].severity, Severity::Critical);
    assert_eq!(events[0].message, "Login - bad password");
    // The row with blank Operation/Details still lands, with the degenerate
    // separator-only message.
    assert_eq!(events[1].message, " - ");
    assert_eq!(storage.source(1).unwrap().total_logs_received, 3);
}

#[tokio::test]
async fn csv_import_without_a_file_part_is_rejected() {
    let (app, _) = test_app();
    let boundary = "csv-test-boundary";
    let body = format!(
        "--{b}\r\ncontent-disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{b}--\r\n",
        b = boundary
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/import/csv")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "CSV file is required");
}
