use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use sheet_json::extraction::{ExtractionEngine, ExtractionOptions};
use sheet_json::server::{router, AppState};

const BOUNDARY: &str = "sheet-json-test-boundary";

fn app_with(opts: ExtractionOptions, request_timeout: Option<Duration>) -> Router {
    let engine = ExtractionEngine::new(opts).unwrap();
    router(AppState::new(engine, request_timeout), 8 * 1024 * 1024)
}

fn app() -> Router {
    app_with(ExtractionOptions::default(), None)
}

fn two_sheet_xlsx() -> Vec<u8> {
    use rust_xlsxwriter::Workbook;

    let mut wb = Workbook::new();

    let ws1 = wb.add_worksheet();
    ws1.set_name("Data").unwrap();
    ws1.write_string(0, 0, "First Name").unwrap();
    ws1.write_string(0, 1, " Age ").unwrap();
    ws1.write_string(1, 0, "Alice").unwrap();
    ws1.write_string(1, 1, "30").unwrap();
    ws1.write_string(2, 0, "Bob").unwrap();
    // row 3 left empty
    ws1.write_string(4, 0, "Carol").unwrap();
    ws1.write_string(4, 1, "41").unwrap();

    let ws2 = wb.add_worksheet();
    ws2.set_name("Summary").unwrap();
    ws2.write_string(0, 0, "Total Rows").unwrap();
    ws2.write_number(1, 0, 3).unwrap();

    wb.save_to_buffer().unwrap()
}

fn multipart(field: &str, data: &[u8]) -> Body {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"book.xlsx\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

fn upload_request(uri: &str, field: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(multipart(field, data))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec();
    (status, content_type, body)
}

#[tokio::test]
async fn converts_every_sheet_in_workbook_order() {
    let (status, content_type, body) = send(app(), upload_request("/json", "file", &two_sheet_xlsx())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));

    let v: Value = serde_json::from_slice(&body).unwrap();
    let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["Data", "Summary"]);
    assert_eq!(
        v["Data"],
        json!([
            {"first_name": "Alice", "age": "30"},
            {"first_name": "Bob", "age": null},
            {"first_name": "Carol", "age": "41"},
        ])
    );
    assert_eq!(v["Summary"], json!([{"total_rows": "3"}]));
}

#[tokio::test]
async fn sheet_query_restricts_output_to_one_sheet() {
    let (status, _, body) = send(app(), upload_request("/json?sheet=Summary", "file", &two_sheet_xlsx())).await;

    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v, json!({"Summary": [{"total_rows": "3"}]}));
}

#[tokio::test]
async fn unknown_sheet_query_falls_back_to_all_sheets() {
    let (status, _, body) = send(app(), upload_request("/json?sheet=summary", "file", &two_sheet_xlsx())).await;

    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn keep_policy_is_honored_over_http() {
    let opts = ExtractionOptions::default().with_empty_rows(sheet_json::types::EmptyRowPolicy::Keep);
    let (status, _, body) = send(
        app_with(opts, None),
        upload_request("/json?sheet=Data", "file", &two_sheet_xlsx()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["Data"].as_array().unwrap().len(), 4);
    assert_eq!(v["Data"][2], json!({"first_name": null, "age": null}));
}

#[tokio::test]
async fn missing_file_field_is_a_bad_request() {
    let (status, _, body) = send(app(), upload_request("/json", "upload", &two_sheet_xlsx())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert!(v["error"].as_str().unwrap().contains("missing form field 'file'"));
}

#[tokio::test]
async fn non_multipart_body_is_a_bad_request() {
    let req = Request::builder()
        .method("POST")
        .uri("/json")
        .header(CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(two_sheet_xlsx()))
        .unwrap();
    let (status, _, _) = send(app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn corrupt_workbook_is_a_server_error() {
    let (status, _, body) = send(app(), upload_request("/json", "file", b"not a spreadsheet")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert!(v["error"].as_str().unwrap().starts_with("workbook decode error"));
}

#[tokio::test]
async fn expired_deadline_fails_without_partial_output() {
    let (status, _, body) = send(
        app_with(ExtractionOptions::default(), Some(Duration::ZERO)),
        upload_request("/json", "file", &two_sheet_xlsx()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert!(v.get("Data").is_none());
    assert!(v["error"].as_str().unwrap().contains("cancelled"));
}

#[tokio::test]
async fn only_post_is_routed() {
    let req = Request::builder().method("GET").uri("/json").body(Body::empty()).unwrap();
    let (status, _, _) = send(app(), req).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
