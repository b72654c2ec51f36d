//! Decoding ComfyUI's `/prompt` rejection bodies.
//!
//! ComfyUI answers an invalid graph with
//! `{"error": {"message": ...}, "node_errors": {"<id>": {"class_type": ..., "errors": [{"message", "details"}]}}}`.
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;

pub const CONNECTION_REFUSED_MESSAGE: &str = "Cannot connect to ComfyUI";

#[derive(Debug, Deserialize)]
struct PromptErrorBody {
    error: Option<ErrorInfo>,
    #[serde(default)]
    node_errors: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorInfo {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct NodeError {
    #[serde(default)]
    class_type: String,
    #[serde(default)]
    errors: Vec<NodeErrorItem>,
}

#[derive(Debug, Deserialize)]
struct NodeErrorItem {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: String,
}

/// Turn a non-2xx `/prompt` response into a user-facing error.
pub fn prompt_rejection(status: u16, body: &str) -> AppError {
    let Ok(parsed) = serde_json::from_str::<PromptErrorBody>(body) else {
        return AppError::ComfyUI(format!("Failed to queue prompt. Status: {status}, Body: {body}"));
    };
    let message = parsed
        .error
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "Error running workflow".to_string());
    AppError::ComfyWorkflow {
        message,
        errors: node_error_lines(&parsed.node_errors),
    }
}

/// One line per failing node: `"<class_type>: <details>: <message>, ..."`.
fn node_error_lines(node_errors: &serde_json::Map<String, Value>) -> Vec<String> {
    node_errors
        .iter()
        .filter_map(|(node_id, raw)| match NodeError::deserialize(raw) {
            Ok(node) => Some(node),
            Err(e) => {
                tracing::debug!(node_id = %node_id, error = %e, "unreadable node error entry");
                None
            }
        })
        .map(|node| {
            let details: String = node
                .errors
                .iter()
                .map(|e| format!("{}: {}, ", e.details, e.message))
                .collect();
            format!("{}: {}", node.class_type, details)
        })
        .collect()
}

pub fn connection_refused(url: &str) -> AppError {
    AppError::ComfyWorkflow {
        message: CONNECTION_REFUSED_MESSAGE.to_string(),
        errors: vec![format!(
            "Cannot connect to ComfyUI at {url}. Make sure ComfyUI is running and COMFYUI_URL points to it."
        )],
    }
}
