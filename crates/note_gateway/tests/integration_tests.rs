mod mocks;

use std::path::Path;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use mocks::{summarizer::MockSummarizer, transcriber::MockTranscriber};
use note_gateway::{
    api::{router, AppState},
    RecognitionConfig,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

fn build_app(
    summarizer: MockSummarizer,
    transcriber: MockTranscriber,
    audio_dir: &Path,
) -> Router {
    router(
        AppState {
            summarizer,
            transcriber,
            audio_dir: audio_dir.to_path_buf(),
        },
        MAX_UPLOAD_BYTES,
    )
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request_with_field(
    uri: &str,
    field_name: &str,
    filename: &str,
    content: &[u8],
) -> Request<Body> {
    let boundary = "gateway-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; \
             name=\"{field_name}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn multipart_request(uri: &str, filename: &str, content: &[u8]) -> Request<Body> {
    multipart_request_with_field(uri, "file", filename, content)
}

// ─── Summarize ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_summarize_returns_original_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let summarizer = MockSummarizer::new("Lunch at noon.");
    let calls = summarizer.calls.clone();
    let app = build_app(summarizer, MockTranscriber::new("unused"), dir.path());

    let text = "hey, are we still on for lunch tomorrow at noon?";
    let response = app
        .oneshot(json_request("/summarize", json!({ "text": text })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response).await,
        json!({ "original": text, "summary": "Lunch at noon." })
    );

    let calls = calls.lock().unwrap();
    assert_eq!(*calls, [text]);
}

#[tokio::test]
async fn test_summarize_rejects_malformed_body() {
    let dir = tempfile::tempdir().unwrap();
    let summarizer = MockSummarizer::new("unused");
    let calls = summarizer.calls.clone();
    let app = build_app(summarizer, MockTranscriber::new("unused"), dir.path());

    let response = app
        .oneshot(json_request("/summarize", json!({ "message": "wrong key" })))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_summarize_failure_returns_500() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(
        MockSummarizer::failing("completion API down"),
        MockTranscriber::new("unused"),
        dir.path(),
    );

    let response = app
        .oneshot(json_request("/summarize", json!({ "text": "hi" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response_json(response).await,
        json!({ "error": "internal error" })
    );
}

// ─── Transcribe ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_transcribe_always_uses_wav_config() {
    let dir = tempfile::tempdir().unwrap();
    let transcriber = MockTranscriber::new("hello world");
    let calls = transcriber.calls.clone();
    let app = build_app(MockSummarizer::new("unused"), transcriber, dir.path());

    let response = app
        .oneshot(json_request(
            "/transcribe",
            json!({ "filename": "note.webm" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["text"], "hello world");
    assert_eq!(body["words"][0]["word"], "hello");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, dir.path().join("note.webm"));
    assert_eq!(calls[0].1, RecognitionConfig::wav());
}

#[tokio::test]
async fn test_transcribe_rejects_path_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let transcriber = MockTranscriber::new("unused");
    let calls = transcriber.calls.clone();
    let app = build_app(MockSummarizer::new("unused"), transcriber, dir.path());

    let response = app
        .oneshot(json_request(
            "/transcribe",
            json!({ "filename": "../../etc/passwd" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("invalid filename"));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_transcription_failure_returns_500() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(
        MockSummarizer::new("unused"),
        MockTranscriber::failing("recognition API down"),
        dir.path(),
    );

    let response = app
        .oneshot(json_request("/transcribe", json!({ "filename": "a.wav" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response_json(response).await,
        json!({ "error": "internal error" })
    );
}

// ─── Blob upload ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_transcribe_blob_stores_upload_and_picks_wav_config() {
    let dir = tempfile::tempdir().unwrap();
    let transcriber = MockTranscriber::new("from upload");
    let calls = transcriber.calls.clone();
    let app = build_app(MockSummarizer::new("unused"), transcriber, dir.path());

    let response = app
        .oneshot(multipart_request("/transcribe_blob", "Voice.WAV", b"RIFFdata"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["text"], "from upload");

    let stored = std::fs::read(dir.path().join("Voice.WAV")).unwrap();
    assert_eq!(stored, b"RIFFdata");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, dir.path().join("Voice.WAV"));
    assert_eq!(calls[0].1, RecognitionConfig::wav());
}

#[tokio::test]
async fn test_transcribe_blob_unknown_extension_uses_container_default() {
    let dir = tempfile::tempdir().unwrap();
    let transcriber = MockTranscriber::new("ogg clip");
    let calls = transcriber.calls.clone();
    let app = build_app(MockSummarizer::new("unused"), transcriber, dir.path());

    let response = app
        .oneshot(multipart_request("/transcribe_blob", "clip.ogg", b"OggS"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].1, RecognitionConfig::webm());
    assert!(calls[0].1.encoding.is_none());
}

#[tokio::test]
async fn test_transcribe_blob_without_file_field_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let transcriber = MockTranscriber::new("unused");
    let calls = transcriber.calls.clone();
    let app = build_app(MockSummarizer::new("unused"), transcriber, dir.path());

    let response = app
        .oneshot(multipart_request_with_field(
            "/transcribe_blob",
            "attachment",
            "clip.wav",
            b"RIFF",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("file"));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_transcribe_blob_rejects_traversal_filename() {
    let dir = tempfile::tempdir().unwrap();
    let transcriber = MockTranscriber::new("unused");
    let calls = transcriber.calls.clone();
    let app = build_app(MockSummarizer::new("unused"), transcriber, dir.path());

    let response = app
        .oneshot(multipart_request(
            "/transcribe_blob",
            "../escape.wav",
            b"RIFF",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(calls.lock().unwrap().is_empty());
    assert!(!dir.path().join("../escape.wav").exists());
}

// ─── CORS ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cors_preflight_allows_any_origin() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(
        MockSummarizer::new("unused"),
        MockTranscriber::new("unused"),
        dir.path(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/summarize")
                .header(header::ORIGIN, "https://notes.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
