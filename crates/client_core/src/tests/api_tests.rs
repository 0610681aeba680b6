use super::*;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;
use shared::decode::decode;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReceivedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

#[derive(Clone, Default)]
struct MockState {
    parts: Arc<Mutex<Vec<ReceivedPart>>>,
    suggest_requests: Arc<Mutex<Vec<Value>>>,
}

async fn collect_parts(state: &MockState, mut multipart: Multipart) -> Vec<ReceivedPart> {
    let mut received = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        received.push(ReceivedPart {
            name,
            file_name,
            content_type,
            data,
        });
    }
    state.parts.lock().await.extend(received.clone());
    received
}

fn subject_of(parts: &[ReceivedPart]) -> String {
    parts
        .iter()
        .find(|part| part.name == "subject")
        .map(|part| String::from_utf8_lossy(&part.data).into_owned())
        .unwrap_or_default()
}

async fn handle_upload(State(state): State<MockState>, multipart: Multipart) -> Json<Value> {
    let parts = collect_parts(&state, multipart).await;
    let filename = parts
        .iter()
        .find_map(|part| part.file_name.clone())
        .unwrap_or_default();
    Json(json!({ "filename": format!("uploads/{filename}") }))
}

async fn handle_content_suggest(
    State(state): State<MockState>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    state.suggest_requests.lock().await.push(payload);
    Json(json!({ "suggestion": "### Week 1\n- add a lab session" }))
}

async fn handle_convert_pdf(State(state): State<MockState>, multipart: Multipart) -> Json<Value> {
    collect_parts(&state, multipart).await;
    Json(json!({ "slides": ["/static/page-1.png", "/static/page-2.png"] }))
}

async fn handle_convert_pptx(State(state): State<MockState>, multipart: Multipart) -> Json<Value> {
    collect_parts(&state, multipart).await;
    Json(json!({ "status": "done" }))
}

async fn handle_lesson_plan(
    State(state): State<MockState>,
    multipart: Multipart,
) -> impl IntoResponse {
    let parts = collect_parts(&state, multipart).await;
    if subject_of(&parts) == "overload" {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "model overloaded" })),
        );
    }

    let inner = r#"[{"slide":1,"suggestions":[{"content":"Open with a question","link":""}]}]"#;
    let content = format!("\"```json\n{}\n```\"", inner.replace('"', "\\\""));
    (
        StatusCode::OK,
        Json(json!({ "suggestion": [ { "suggestions": [ { "content": content } ] } ] })),
    )
}

async fn spawn_mock_service() -> (String, MockState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = MockState::default();
    let app = Router::new()
        .route("/upload", post(handle_upload))
        .route("/content-suggest", post(handle_content_suggest))
        .route("/convert-pdf", post(handle_convert_pdf))
        .route("/convert-pptx", post(handle_convert_pptx))
        .route("/lesson-plan", post(handle_lesson_plan))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

#[test]
fn base_url_keeps_path_prefix() {
    let api = HttpUpTeachApi::new("http://127.0.0.1:5000").expect("api");
    assert_eq!(api.base_url().as_str(), "http://127.0.0.1:5000/");

    let api = HttpUpTeachApi::new("http://example.test/api").expect("api");
    assert_eq!(
        api.endpoint_url(Endpoint::LessonPlan).expect("url").as_str(),
        "http://example.test/api/lesson-plan"
    );
}

#[test]
fn rejects_unparseable_base_url() {
    let err = HttpUpTeachApi::new("not a url").err().expect("must fail");
    assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
}

#[test]
fn bad_content_type_is_not_reported_as_network_failure() {
    let err = file_part("notes.bin", vec![1, 2], "not a mime").err().expect("must fail");
    assert!(matches!(err, ClientError::BuildRequest(_)));
    assert!(err.user_message().starts_with("could not build request"));

    for name in ["week1.pdf", "deck.pptx"] {
        let file = UploadedFile::new(name, b"bytes".to_vec());
        assert!(file_part(&file.filename, file.bytes.clone(), file.mime_type()).is_ok());
    }
}

#[tokio::test]
async fn convert_pdf_posts_file_and_subject() {
    let (base_url, state) = spawn_mock_service().await;
    let api = HttpUpTeachApi::new(&base_url).expect("api");
    let file = UploadedFile::new("week1.pdf", b"%PDF-1.7".to_vec());

    let slides = api.convert(&file, "Biology").await.expect("convert");
    assert_eq!(slides, vec!["/static/page-1.png", "/static/page-2.png"]);

    let parts = state.parts.lock().await.clone();
    let file_part = parts
        .iter()
        .find(|part| part.name == "file")
        .expect("file part");
    assert_eq!(file_part.file_name.as_deref(), Some("week1.pdf"));
    assert_eq!(file_part.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(file_part.data, b"%PDF-1.7");
    assert_eq!(subject_of(&parts), "Biology");
}

#[tokio::test]
async fn convert_without_slides_is_an_invalid_response() {
    let (base_url, _state) = spawn_mock_service().await;
    let api = HttpUpTeachApi::new(&base_url).expect("api");
    let file = UploadedFile::new("deck.pptx", b"PK".to_vec());

    let err = api.convert(&file, "Biology").await.expect_err("must fail");
    assert_eq!(err.user_message(), "Invalid response format");
}

#[tokio::test]
async fn lesson_plan_envelope_decodes() {
    let (base_url, _state) = spawn_mock_service().await;
    let api = HttpUpTeachApi::new(&base_url).expect("api");
    let file = UploadedFile::new("week1.pdf", b"%PDF".to_vec());

    let raw = api.lesson_plan(&file, "Biology").await.expect("lesson plan");
    let decoded = decode(&raw).expect("decode");
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].slide, 1);
    assert_eq!(decoded[0].suggestions[0].content, "Open with a question");
}

#[tokio::test]
async fn error_status_surfaces_service_message() {
    let (base_url, _state) = spawn_mock_service().await;
    let api = HttpUpTeachApi::new(&base_url).expect("api");
    let file = UploadedFile::new("week1.pdf", b"%PDF".to_vec());

    let err = api.lesson_plan(&file, "overload").await.expect_err("must fail");
    match &err {
        ClientError::Http { status, message } => {
            assert_eq!(*status, 503);
            assert_eq!(message.as_deref(), Some("model overloaded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.user_message(), "model overloaded");
}

#[tokio::test]
async fn error_status_without_body_uses_generic_message() {
    let (base_url, _state) = spawn_mock_service().await;
    let api = HttpUpTeachApi::new(&format!("{base_url}/missing")).expect("api");
    let file = UploadedFile::new("week1.pdf", b"%PDF".to_vec());

    let err = api.convert(&file, "Biology").await.expect_err("must fail");
    assert!(matches!(err, ClientError::Http { status: 404, message: None }));
    assert_eq!(err.user_message(), "HTTP error! status: 404");
}

#[tokio::test]
async fn upload_then_content_suggest_round_trip() {
    let (base_url, state) = spawn_mock_service().await;
    let api = HttpUpTeachApi::new(&base_url).expect("api");
    let file = UploadedFile::new("syllabus.pdf", b"%PDF".to_vec());

    let stored = api.upload(&file, "Physics").await.expect("upload");
    assert_eq!(stored, "uploads/syllabus.pdf");

    let markdown = api
        .content_suggest(&stored, "Physics")
        .await
        .expect("suggest");
    assert!(markdown.contains("lab session"));

    let requests = state.suggest_requests.lock().await.clone();
    assert_eq!(
        requests,
        vec![json!({ "filename": "uploads/syllabus.pdf", "subject": "Physics" })]
    );
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let api = HttpUpTeachApi::new(&format!("http://{addr}")).expect("api");
    let file = UploadedFile::new("week1.pdf", b"%PDF".to_vec());
    let err = api.convert(&file, "Biology").await.expect_err("must fail");

    assert!(matches!(err, ClientError::Network(_)), "unexpected error: {err:?}");
    assert_eq!(
        err.user_message(),
        "Could not reach the UpTeach service. Please try again."
    );
}
