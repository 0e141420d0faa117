use api::{AppConfig, AppState, router};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use docx_rs::{Docx, Paragraph, Run};
use evaluate::{ChatMessage, ConfigurationBundle, prompt};
use httpmock::prelude::*;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "grader-test-boundary";

fn docx(text: &str) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)))
        .build()
        .pack(&mut cursor)
        .unwrap();
    cursor.into_inner()
}

struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    data: &'a [u8],
}

fn file<'a>(name: &'a str, filename: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        name,
        filename: Some(filename),
        data,
    }
}

fn text<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    Part {
        name,
        filename: None,
        data: value.as_bytes(),
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        let name = part.name;
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(f) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn test_app(config_dir: &Path, llm_base_url: String, require_rubric: bool) -> (Router, Arc<AppState>) {
    let mut config = AppConfig::default();
    config.llm.base_url = llm_base_url;
    config.llm.model = "grader-model".to_string();
    config.llm.api_key = "test-token".to_string();
    config.llm.request_timeout_secs = 5;
    config.retry.max_retries = 0;
    config.storage.config_dir = config_dir.to_path_buf();
    config.evaluation.require_rubric = require_rubric;

    let state = Arc::new(AppState::from_config(&config).unwrap());
    (router(state.clone()), state)
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn upload_full_config(app: &Router) {
    let rubric = docx("Grade on clarity.");
    let example = docx("Hi.");
    let evaluation = docx("1/1");

    let response = app
        .clone()
        .oneshot(multipart_request(
            "/config",
            &[
                file("rubric", "rubric.docx", &rubric),
                file("example_submission", "example.docx", &example),
                file("example_evaluation", "evaluation.docx", &evaluation),
                text("instruction", "You are a grader."),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/config");
}

#[tokio::test]
async fn index_renders_submission_form() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(dir.path(), "http://127.0.0.1:9".to_string(), false);

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains(r#"name="submission""#));
    assert!(page.contains(r#"enctype="multipart/form-data""#));
}

#[tokio::test]
async fn end_to_end_evaluation_uses_stored_configuration() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let (app, _) = test_app(dir.path(), server.base_url(), false);

    upload_full_config(&app).await;

    let bundle = ConfigurationBundle {
        rubric: "Grade on clarity.".to_string(),
        example_submission: "Hi.".to_string(),
        example_evaluation: "1/1".to_string(),
        instruction: "You are a grader.".to_string(),
    };
    let expected_system = serde_json::to_string(&ChatMessage::system("You are a grader.")).unwrap();
    let expected_user = serde_json::to_string(&ChatMessage::user(prompt::build_user_prompt(
        &bundle,
        "Hello world.",
    )))
    .unwrap();

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer test-token")
                .body_contains(&expected_system)
                .body_contains(&expected_user);
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Clarity: 1/1 <well done>"}}]
            }));
        })
        .await;

    let submission = docx("Hello world.");
    let response = app
        .clone()
        .oneshot(multipart_request(
            "/",
            &[file("submission", "tarea.docx", &submission)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Clarity: 1/1 &lt;well done&gt;"));
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn missing_configuration_degrades_to_empty_fields() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let (app, _) = test_app(&dir.path().join("empty"), server.base_url(), false);

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains(r#"{"role":"system","content":""}"#)
                .body_contains("Lonely submission.");
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"content": "No rubric, 0/0"}}]
            }));
        })
        .await;

    let submission = docx("Lonely submission.");
    let response = app
        .oneshot(multipart_request(
            "/",
            &[file("submission", "s.docx", &submission)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No rubric, 0/0"));
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn required_rubric_reports_incomplete_configuration() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let (app, state) = test_app(dir.path(), server.base_url(), true);

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200);
        })
        .await;

    let submission = docx("Hello world.");
    let response = app
        .oneshot(multipart_request(
            "/",
            &[file("submission", "s.docx", &submission)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    assert!(body_text(response).await.contains("not fully configured"));
    mock.assert_hits_async(0).await;
    assert_eq!(state.metrics.snapshot().failures.configuration_incomplete, 1);
}

#[tokio::test]
async fn remote_failure_renders_error_page() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let (app, state) = test_app(dir.path(), server.base_url(), false);

    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(500).body("upstream exploded");
        })
        .await;

    let submission = docx("Hello world.");
    let response = app
        .oneshot(multipart_request(
            "/",
            &[file("submission", "s.docx", &submission)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let page = body_text(response).await;
    assert!(page.contains("Evaluation service unavailable"));
    assert!(!page.contains("upstream exploded"));

    let snapshot = state.metrics.snapshot();
    assert_eq!(snapshot.failures.remote, 1);
    assert_eq!(snapshot.evaluations_succeeded, 0);
}

#[tokio::test]
async fn malformed_document_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (app, state) = test_app(dir.path(), "http://127.0.0.1:9".to_string(), false);

    let response = app
        .oneshot(multipart_request(
            "/",
            &[file("submission", "notes.docx", b"just some text")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Could not read document"));
    assert_eq!(state.metrics.snapshot().failures.parse, 1);
}

#[tokio::test]
async fn missing_upload_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(dir.path(), "http://127.0.0.1:9".to_string(), false);

    let response = app
        .oneshot(multipart_request(
            "/",
            &[file("submission", "", b"")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("No document received"));
}

#[tokio::test]
async fn rubric_only_upload_keeps_other_fields() {
    let dir = TempDir::new().unwrap();
    let (app, state) = test_app(dir.path(), "http://127.0.0.1:9".to_string(), false);

    upload_full_config(&app).await;

    let new_rubric = docx("Grade on brevity.");
    let response = app
        .clone()
        .oneshot(multipart_request(
            "/config",
            &[
                file("rubric", "rubric2.docx", &new_rubric),
                file("example_submission", "", b""),
                file("example_evaluation", "", b""),
                text("instruction", "   "),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let bundle = state.store.load().await.unwrap();
    assert_eq!(
        bundle,
        ConfigurationBundle {
            rubric: "Grade on brevity.".to_string(),
            example_submission: "Hi.".to_string(),
            example_evaluation: "1/1".to_string(),
            instruction: "You are a grader.".to_string(),
        }
    );
    assert_eq!(state.metrics.snapshot().config_updates, 2);
}

#[tokio::test]
async fn config_page_shows_stored_artifacts() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(dir.path(), "http://127.0.0.1:9".to_string(), false);

    let before = body_text(app.clone().oneshot(get("/config")).await.unwrap()).await;
    assert!(before.contains("<li>Rubric: not set</li>"));

    upload_full_config(&app).await;

    let after = body_text(app.oneshot(get("/config")).await.unwrap()).await;
    assert!(after.contains("<li>Rubric: stored</li>"));
    assert!(after.contains("<li>Instruction: stored</li>"));
}

#[tokio::test]
async fn health_reports_model() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(dir.path(), "http://127.0.0.1:9".to_string(), false);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model"], "grader-model");
}
