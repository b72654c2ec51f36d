//! Router behavior for the routes that do not reach ComfyUI.
use std::path::Path;
use std::sync::Arc;

use axum::http::{Request, StatusCode};
use hyper::Body;
use serde_json::{json, Value};
use tower::ServiceExt;

use viewcomfy_proxy::api::routes::{router, AppState};
use viewcomfy_proxy::Config;

const BOUNDARY: &str = "vc-test-boundary";

fn state(dir: &Path) -> Arc<AppState> {
    let config = Config::from_lookup(|key| match key {
        "COMFYUI_URL" => Some("http://127.0.0.1:1".to_string()),
        "COMFY_INPUTS_DIR" => Some(dir.join("inputs").to_string_lossy().into_owned()),
        "VIEW_COMFY_FILE_NAME" => Some(dir.join("view_comfy.json").to_string_lossy().into_owned()),
        _ => None,
    });
    Arc::new(AppState::from_config(&config))
}

fn graph() -> Value {
    json!({
        "6": {
            "class_type": "CLIPTextEncode",
            "inputs": { "text": "a cat", "clip": ["4", 1] },
            "_meta": { "title": "Positive Prompt" }
        },
        "10": {
            "class_type": "LoadImage",
            "inputs": { "image": "example.png", "upload": "image" }
        },
        "9": {
            "class_type": "SaveImage",
            "inputs": { "filename_prefix": "ComfyUI", "images": ["8", 0] }
        }
    })
}

enum Part<'a> {
    Text(&'a str, String),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, text) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(text.as_bytes());
            }
            Part::File(name, file_name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::post(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn root_answers() {
    let dir = tempfile::tempdir().unwrap();
    let response = router(state(dir.path()))
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn schema_route_builds_view_comfy_document() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::post("/workflow/schema?title=Cats")
        .body(Body::from(graph().to_string()))
        .unwrap();
    let response = router(state(dir.path())).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["file_type"], json!("view_comfy"));
    assert_eq!(body["title"], json!("Cats"));
    assert_eq!(body["inputs"][0]["key"], json!("6-inputs-text"));
    assert_eq!(body["inputs"][0]["valueType"], json!("long-text"));
    assert_eq!(body["inputs"][1]["valueType"], json!("image"));
    assert_eq!(body["workflowApiJSON"], graph());
}

#[tokio::test]
async fn schema_route_rejects_ui_layout_export() {
    let dir = tempfile::tempdir().unwrap();
    let ui_export = json!({ "last_node_id": 3, "nodes": [], "links": [] });
    let request = Request::post("/workflow/schema")
        .body(Body::from(ui_export.to_string()))
        .unwrap();
    let response = router(state(dir.path())).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["errorType"], json!("WorkflowFormatError"));
    assert!(body["errorMsg"].as_str().unwrap().contains("workflow_api.json"));
}

#[tokio::test]
async fn schema_route_rejects_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::post("/workflow/schema")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = router(state(dir.path())).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["errorType"], json!("InvalidJsonError"));
}

#[tokio::test]
async fn finalize_route_applies_values_and_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = json!([{ "key": "6-inputs-text", "value": "a dog" }]).to_string();
    let request = multipart_request(
        "/workflow/finalize",
        &[
            Part::Text("workflow", graph().to_string()),
            Part::Text("inputs", inputs),
            Part::File("10-inputs-image", "dog.png", b"png-bytes"),
        ],
    );
    let response = router(state(dir.path())).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let execution_id = body["execution_id"].as_str().unwrap().to_string();
    let prompt = &body["prompt"];
    assert_eq!(prompt["6"]["inputs"]["text"], json!("a dog"));
    assert_eq!(prompt["9"]["inputs"]["filename_prefix"], json!(format!("{execution_id}_")));

    let stored = dir.path().join("inputs").join(format!("{execution_id}_dog.png"));
    assert_eq!(std::fs::read(&stored).unwrap(), b"png-bytes".to_vec());
    assert_eq!(
        prompt["10"]["inputs"]["image"],
        json!(stored.to_string_lossy().into_owned())
    );
}

#[tokio::test]
async fn finalize_route_falls_back_to_saved_document() {
    let dir = tempfile::tempdir().unwrap();
    let saved = json!({
        "file_type": "view_comfy",
        "file_version": "1.0.0",
        "version": "0.0.1",
        "title": "Saved",
        "description": "",
        "inputs": [],
        "advancedInputs": [],
        "workflowApiJSON": graph()
    });
    std::fs::write(dir.path().join("view_comfy.json"), saved.to_string()).unwrap();

    let request = multipart_request(
        "/workflow/finalize",
        &[Part::Text("6-inputs-text", "a fox".to_string())],
    );
    let response = router(state(dir.path())).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["prompt"]["6"]["inputs"]["text"], json!("a fox"));
}

#[tokio::test]
async fn finalize_route_reports_unknown_keys() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = json!([{ "key": "42-inputs-text", "value": "x" }]).to_string();
    let request = multipart_request(
        "/workflow/finalize",
        &[Part::Text("workflow", graph().to_string()), Part::Text("inputs", inputs)],
    );
    let response = router(state(dir.path())).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["errorType"], json!("PathResolutionError"));
}

#[tokio::test]
async fn finalize_route_without_any_workflow_is_a_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let request = multipart_request(
        "/workflow/finalize",
        &[Part::Text("6-inputs-text", "a fox".to_string())],
    );
    let response = router(state(dir.path())).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["errorType"], json!("InvalidWorkflowError"));
}
