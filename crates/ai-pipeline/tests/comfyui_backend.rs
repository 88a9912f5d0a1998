/// ComfyUI backend against a mocked server
/// Covers queueing, history polling, image download and the placeholder fallback
use ai_pipeline::{
    ComfyError, ComfyUiConfig, ComfyUiGenerator, FallbackGenerator, GenerationRequest,
    ImageGenerator, PlaceholderGenerator,
};
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{json, Value};
use std::io::Cursor;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROMPT_ID: &str = "6c1b7d1e-prompt";

fn tiny_png() -> Vec<u8> {
    let img = RgbaImage::from_pixel(4, 4, Rgba([250, 250, 250, 255]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn finished_history() -> Value {
    json!({
        PROMPT_ID: {
            "prompt": [],
            "outputs": {
                "9": {
                    "images": [
                        { "filename": "papercut_00001_.png", "subfolder": "", "type": "output" }
                    ]
                }
            },
            "status": { "status_str": "success", "completed": true, "messages": [] }
        }
    })
}

async fn mount_queue(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/prompt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "prompt_id": PROMPT_ID, "number": 1 })),
        )
        .mount(server)
        .await;
}

fn config(server: &MockServer) -> ComfyUiConfig {
    ComfyUiConfig::default()
        .with_api_url(server.uri())
        .with_polling(20, 2)
}

#[tokio::test]
async fn test_generate_polls_until_outputs() {
    let server = MockServer::start().await;
    mount_queue(&server).await;

    // First poll: still running
    Mock::given(method("GET"))
        .and(path(format!("/history/{}", PROMPT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/history/{}", PROMPT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(finished_history()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/view"))
        .and(query_param("filename", "papercut_00001_.png"))
        .and(query_param("type", "output"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(tiny_png()),
        )
        .mount(&server)
        .await;

    let generator = ComfyUiGenerator::new(config(&server)).unwrap();
    let image = generator
        .generate(&GenerationRequest::new("tiger").with_seed(1234))
        .await
        .unwrap();

    assert!(!image.placeholder);
    assert_eq!(image.seed, 1234);
    assert_eq!(image.bytes, tiny_png());
    assert!(image.filename.starts_with("flux_tiger_"));

    // The queued workflow carries the seed and the wrapped prompt
    let requests = server.received_requests().await.unwrap();
    let queued = requests
        .iter()
        .find(|r| r.url.path() == "/prompt")
        .expect("prompt was queued");
    let body: Value = queued.body_json().unwrap();
    assert_eq!(body["prompt"]["3"]["inputs"]["seed"], json!(1234));
    assert_eq!(body["prompt"]["6"]["inputs"]["clip_l"], json!(image.full_prompt));
    assert_eq!(body["prompt"]["6"]["inputs"]["t5xxl"], json!(image.full_prompt));
    assert!(body["client_id"].as_str().is_some());

    let polls = requests
        .iter()
        .filter(|r| r.url.path().starts_with("/history/"))
        .count();
    assert_eq!(polls, 2);
}

#[tokio::test]
async fn test_generate_times_out() {
    let server = MockServer::start().await;
    mount_queue(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/history/{}", PROMPT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let generator =
        ComfyUiGenerator::new(config(&server).with_polling(50, 1)).unwrap();
    let err = generator
        .generate(&GenerationRequest::new("flower"))
        .await
        .unwrap_err();

    assert!(matches!(err, ComfyError::Timeout(1)));
}

#[tokio::test]
async fn test_execution_error_is_reported() {
    let server = MockServer::start().await;
    mount_queue(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/history/{}", PROMPT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            PROMPT_ID: {
                "outputs": {},
                "status": {
                    "status_str": "error",
                    "completed": false,
                    "messages": [["execution_error", { "exception_message": "model not found" }]]
                }
            }
        })))
        .mount(&server)
        .await;

    let generator = ComfyUiGenerator::new(config(&server)).unwrap();
    let err = generator
        .generate(&GenerationRequest::new("dragon"))
        .await
        .unwrap_err();

    match err {
        ComfyError::Execution(msg) => assert_eq!(msg, "model not found"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_rejected_prompt_surfaces_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/prompt"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid prompt"))
        .mount(&server)
        .await;

    let generator = ComfyUiGenerator::new(config(&server)).unwrap();
    let err = generator
        .generate(&GenerationRequest::new("tiger"))
        .await
        .unwrap_err();

    match err {
        ComfyError::Api { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "invalid prompt");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_availability_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/system_stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "system": {} })))
        .mount(&server)
        .await;

    let generator = ComfyUiGenerator::new(config(&server)).unwrap();
    assert!(generator.is_available().await);

    let offline = ComfyUiGenerator::new(ComfyUiConfig::default().with_api_url("http://127.0.0.1:9"))
        .unwrap();
    assert!(!offline.is_available().await);
}

#[tokio::test]
async fn test_fallback_on_failed_generation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/system_stats"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/prompt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let primary = ComfyUiGenerator::new(config(&server)).unwrap();
    let generator = FallbackGenerator::new(Box::new(primary), PlaceholderGenerator::builtin());

    assert!(generator.primary_available().await);
    let image = generator
        .generate(&GenerationRequest::new("tiger"))
        .await
        .unwrap();
    assert!(image.placeholder);
}

async fn mount_history(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/history/{}", PROMPT_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn history_polls(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().starts_with("/history/"))
        .count()
}

#[tokio::test]
async fn test_completed_without_images_is_no_images() {
    let server = MockServer::start().await;
    mount_queue(&server).await;
    mount_history(
        &server,
        json!({
            PROMPT_ID: {
                "outputs": { "9": { "images": [] } },
                "status": { "status_str": "success", "completed": true, "messages": [] }
            }
        }),
    )
    .await;

    let generator = ComfyUiGenerator::new(config(&server)).unwrap();
    let err = generator
        .generate(&GenerationRequest::new("tiger"))
        .await
        .unwrap_err();

    assert!(matches!(err, ComfyError::NoImages));
    assert_eq!(history_polls(&server).await, 1);
}

#[tokio::test]
async fn test_falls_back_to_any_node_with_images() {
    let server = MockServer::start().await;
    mount_queue(&server).await;
    mount_history(
        &server,
        json!({
            PROMPT_ID: {
                "outputs": {
                    "12": { "images": [{ "filename": "preview_00003_.png", "subfolder": "previews", "type": "temp" }] }
                },
                "status": { "status_str": "success", "completed": true, "messages": [] }
            }
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/view"))
        .and(query_param("filename", "preview_00003_.png"))
        .and(query_param("subfolder", "previews"))
        .and(query_param("type", "temp"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(tiny_png()))
        .mount(&server)
        .await;

    let generator = ComfyUiGenerator::new(config(&server)).unwrap();
    let image = generator
        .generate(&GenerationRequest::new("crane"))
        .await
        .unwrap();

    assert!(!image.placeholder);
    assert_eq!(image.bytes, tiny_png());
}

#[tokio::test]
async fn test_undecodable_view_uses_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/system_stats"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    mount_queue(&server).await;
    mount_history(&server, finished_history()).await;
    Mock::given(method("GET"))
        .and(path("/view"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let direct = ComfyUiGenerator::new(config(&server)).unwrap();
    let err = direct
        .generate(&GenerationRequest::new("tiger"))
        .await
        .unwrap_err();
    assert!(matches!(err, ComfyError::ImageProcessing(_)));

    let primary = ComfyUiGenerator::new(config(&server)).unwrap();
    let generator = FallbackGenerator::new(Box::new(primary), PlaceholderGenerator::builtin());
    let image = generator
        .generate(&GenerationRequest::new("tiger"))
        .await
        .unwrap();
    assert!(image.placeholder);
    assert!(image.decode().is_ok());
}

#[tokio::test]
async fn test_last_poll_happens_at_the_deadline() {
    let server = MockServer::start().await;
    mount_queue(&server).await;
    mount_history(&server, json!({})).await;

    // interval longer than the timeout: one poll up front, one at the deadline
    let generator =
        ComfyUiGenerator::new(config(&server).with_polling(2000, 1)).unwrap();
    let started = std::time::Instant::now();
    let err = generator
        .generate(&GenerationRequest::new("flower"))
        .await
        .unwrap_err();

    assert!(matches!(err, ComfyError::Timeout(1)));
    assert_eq!(history_polls(&server).await, 2);
    assert!(started.elapsed() >= std::time::Duration::from_secs(1));
    assert!(started.elapsed() < std::time::Duration::from_secs(2));
}
