//! End-to-end tests for the HTTP API over an in-memory database

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use axum_test::TestServer;
use serde_json::{json, Value};
use tower::ServiceExt;

use pdf_library_server::config::{Config, DatabaseConfig, LibraryConfig};
use pdf_library_server::{db, pdf, router, AppState};

const DUMMY_PDF: &[u8] = b"%PDF-1.4\nThis is a dummy PDF content";
const BOUNDARY: &str = "pdf-library-test-boundary";

async fn app_state() -> AppState {
    app_state_with(LibraryConfig::default()).await
}

async fn app_state_with(library: LibraryConfig) -> AppState {
    let config = Config {
        database: DatabaseConfig::in_memory(),
        library,
        ..Config::default()
    };
    let pool = db::create_pool(&config.database).await.unwrap();
    AppState::new(config, pool)
}

fn server(state: &AppState) -> TestServer {
    TestServer::new(router(state.clone())).unwrap()
}

fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn upload(state: &AppState, field: &str, content_type: &str, data: &[u8]) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/upload_pdf/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field, "test.pdf", content_type, data)))
        .unwrap();

    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn generate(server: &TestServer, title: &str, content: &str) -> i64 {
    let response = server
        .post("/generate_pdf/")
        .json(&json!({ "title": title, "content": content }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().unwrap()
}

#[tokio::test]
async fn upload_dummy_pdf() {
    let state = app_state().await;

    let (status, body) = upload(&state, "file", "application/pdf", DUMMY_PDF).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "PDF uploaded successfully");
    assert!(body["id"].as_i64().is_some());

    let list = server(&state).get("/pdfs/").await.json::<Vec<Value>>();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["file_name"], "test.pdf");
    assert_eq!(list[0]["source"], "upload");
}

#[tokio::test]
async fn upload_rejects_bad_files() {
    let state = app_state().await;

    let (status, body) = upload(&state, "file", "text/plain", DUMMY_PDF).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["detail"].is_string());

    let (status, body) = upload(&state, "file", "application/pdf", b"not a pdf").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, _) = upload(&state, "document", "application/pdf", DUMMY_PDF).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let list = server(&state).get("/pdfs/").await.json::<Vec<Value>>();
    assert!(list.is_empty());
}

#[tokio::test]
async fn upload_over_the_size_limit_is_rejected() {
    let state = app_state_with(LibraryConfig {
        max_upload_bytes: 100,
        ..LibraryConfig::default()
    })
    .await;

    let mut small_overflow = DUMMY_PDF.to_vec();
    small_overflow.resize(200, b' ');
    let (status, body) = upload(&state, "file", "application/pdf", &small_overflow).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "payload_too_large");

    // Past the request body limit the multipart stream itself fails
    let mut huge = DUMMY_PDF.to_vec();
    huge.resize(200_000, b' ');
    let (status, body) = upload(&state, "file", "application/pdf", &huge).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "payload_too_large");

    assert!(server(&state).get("/pdfs/").await.json::<Vec<Value>>().is_empty());
}

#[tokio::test]
async fn uploaded_pdf_is_split_into_paragraph_sections() {
    let state = app_state().await;
    let generated = pdf::generate("Field Notes", "Morning survey.\n\nEvening survey.").unwrap();

    let (status, body) = upload(&state, "file", "application/pdf", &generated.bytes).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let sections = server(&state)
        .get(&format!("/pdf/{}/sections/", id))
        .await
        .json::<Vec<Value>>();
    let contents: Vec<&str> = sections
        .iter()
        .map(|s| s["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["Field Notes", "Morning survey.", "Evening survey."]);
    assert!(sections.iter().all(|s| s["page_number"] == 1));
}

#[tokio::test]
async fn get_pdf_returns_summary() {
    let state = app_state().await;
    let server = server(&state);
    let id = generate(&server, "Summary Title", "First.\n\nSecond.").await;

    let response = server.get(&format!("/pdf/{}", id)).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let summary = response.json::<Value>();
    assert_eq!(summary["id"], id);
    assert_eq!(summary["title"], "Summary Title");
    assert_eq!(summary["file_name"], "summary-title.pdf");
    assert_eq!(summary["source"], "generated");
    assert_eq!(summary["section_count"], 2);
    assert_eq!(summary["page_count"], 1);
}

#[tokio::test]
async fn list_is_empty_on_fresh_database() {
    let state = app_state().await;

    let response = server(&state).get("/pdfs/").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!([]));
}

#[tokio::test]
async fn generate_adds_one_document() {
    let state = app_state().await;
    let server = server(&state);

    let before = server.get("/pdfs/").await.json::<Vec<Value>>().len();

    let response = server
        .post("/generate_pdf/")
        .json(&json!({
            "title": "Test PDF",
            "content": "This is a test PDF generated by API."
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["message"], "PDF generated successfully");

    let after = server.get("/pdfs/").await.json::<Vec<Value>>();
    assert_eq!(after.len(), before + 1);
    assert_eq!(after[0]["title"], "Test PDF");
    assert_eq!(after[0]["source"], "generated");
    assert_eq!(after[0]["id"], body["id"]);
}

#[tokio::test]
async fn generate_validation_errors() {
    let state = app_state().await;
    let server = server(&state);

    let missing = server
        .post("/generate_pdf/")
        .json(&json!({ "title": "Only a title" }))
        .await;
    assert_eq!(missing.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(missing.json::<Value>()["detail"].is_string());

    let malformed = server
        .post("/generate_pdf/")
        .bytes("{ not json".into())
        .content_type("application/json")
        .await;
    assert_eq!(malformed.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let wrong_type = server
        .post("/generate_pdf/")
        .text(r#"{"title":"a","content":"b"}"#)
        .await;
    assert_eq!(wrong_type.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    assert!(server.get("/pdfs/").await.json::<Vec<Value>>().is_empty());
}

#[tokio::test]
async fn sections_are_paginated() {
    let state = app_state().await;
    let server = server(&state);
    let content = (1..=7)
        .map(|n| format!("Section body {}.", n))
        .collect::<Vec<_>>()
        .join("\n\n");
    let id = generate(&server, "Sectioned", &content).await;

    let first = server
        .get(&format!("/pdf/{}/sections/", id))
        .add_query_param("page", 1)
        .add_query_param("size", 5)
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let first = first.json::<Vec<Value>>();
    assert_eq!(first.len(), 5);
    assert_eq!(first[0]["content"], "Section body 1.");

    let second = server
        .get(&format!("/pdf/{}/sections/", id))
        .add_query_param("page", 2)
        .add_query_param("size", 5)
        .await
        .json::<Vec<Value>>();
    assert_eq!(second.len(), 2);

    let beyond = server
        .get(&format!("/pdf/{}/sections/", id))
        .add_query_param("page", 50)
        .add_query_param("size", 5)
        .await;
    assert_eq!(beyond.status_code(), StatusCode::OK);
    assert_eq!(beyond.json::<Value>(), json!([]));
}

#[tokio::test]
async fn sections_query_errors() {
    let state = app_state().await;
    let server = server(&state);
    let id = generate(&server, "Query", "Body.").await;

    let zero = server
        .get(&format!("/pdf/{}/sections/", id))
        .add_query_param("page", 0)
        .await;
    assert_eq!(zero.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let not_a_number = server
        .get(&format!("/pdf/{}/sections/", id))
        .add_query_param("page", "first")
        .await;
    assert_eq!(not_a_number.status_code(), StatusCode::BAD_REQUEST);

    let unknown = server.get("/pdf/999/sections/").await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);
    assert!(unknown.json::<Value>()["detail"].is_string());
}

#[tokio::test]
async fn download_returns_pdf_bytes() {
    let state = app_state().await;
    let server = server(&state);
    let id = generate(&server, "Download Me", "Some text to download.").await;

    let response = server.get(&format!("/download_pdf/{}", id)).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "application/pdf");
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"download-me.pdf\""
    );
    assert!(response.as_bytes().starts_with(b"%PDF-"));
}

#[tokio::test]
async fn download_returns_uploaded_bytes_unchanged() {
    let state = app_state().await;
    let (_, body) = upload(&state, "file", "application/pdf", DUMMY_PDF).await;
    let id = body["id"].as_i64().unwrap();

    let response = server(&state).get(&format!("/download_pdf/{}", id)).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.as_bytes().as_ref(), DUMMY_PDF);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let state = app_state().await;
    let server = server(&state);

    for path in ["/pdf/42", "/download_pdf/42", "/pdf/42/sections/"] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "{}", path);
        assert_eq!(response.json::<Value>()["error"], "not_found");
    }

    let bad_id = server.get("/download_pdf/abc").await;
    assert_eq!(bad_id.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_check() {
    let state = app_state().await;

    let response = server(&state).get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let report = response.json::<Value>();
    assert_eq!(report["status"], "healthy");
    assert_eq!(report["database"], "ok");
    assert_eq!(report["service"], "pdf-library-server");
}

#[tokio::test]
async fn health_check_reports_closed_database() {
    let state = app_state().await;
    let server = server(&state);
    state.shutdown().await;

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let report = response.json::<Value>();
    assert_eq!(report["status"], "degraded");
    assert_eq!(report["database"], "unavailable");
}
