//! Common error type and result alias.
//!
//! Every fallible operation in the crate returns [`AppResult`]. The HTTP
//! layer turns an [`AppError`] into a JSON body of the shape
//! `{errorMsg, errorDetails, errorType}` so the form can tell a wrong export
//! mode apart from a broken graph or a ComfyUI failure.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Message shown when a UI-layout `workflow.json` is uploaded.
pub const WORKFLOW_FORMAT_MESSAGE: &str = "Looks like you have uploaded a workflow.json instead of workflow_api.json. \
To generate workflow_api.json, enable dev mode options in the ComfyUI settings and export using the \"Save (API format)\" button.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The document is not valid JSON at all.
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A ComfyUI UI-layout export was supplied where the API export is required.
    #[error("{}", WORKFLOW_FORMAT_MESSAGE)]
    WorkflowFormat,

    /// The document is JSON but not a usable workflow graph.
    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// A submitted key does not address anything in the graph.
    #[error("Cannot resolve '{segment}' while applying input '{key}'")]
    PathResolution { key: String, segment: String },

    /// An uploaded file could not be written to the input store.
    #[error("Failed to store uploaded file '{file_name}': {source}")]
    FileMaterialization {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    /// ComfyUI rejected the workflow; `errors` holds one line per failing node.
    #[error("{message}")]
    ComfyWorkflow { message: String, errors: Vec<String> },

    #[error("ComfyUI error: {0}")]
    ComfyUI(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Stable discriminator sent to clients as `errorType`.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidJson(_) => "InvalidJsonError",
            AppError::WorkflowFormat => "WorkflowFormatError",
            AppError::InvalidWorkflow(_) => "InvalidWorkflowError",
            AppError::PathResolution { .. } => "PathResolutionError",
            AppError::FileMaterialization { .. } => "FileMaterializationError",
            AppError::ComfyWorkflow { .. } => "ComfyWorkflowError",
            AppError::ComfyUI(_) | AppError::HttpClient(_) => "ComfyError",
            AppError::BadRequest(_) => "BadRequestError",
            AppError::Io(_) => "UnknownError",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidJson(_)
            | AppError::WorkflowFormat
            | AppError::InvalidWorkflow(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PathResolution { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ComfyWorkflow { .. } | AppError::ComfyUI(_) | AppError::HttpClient(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::FileMaterialization { .. } | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Lines sent to clients as `errorDetails`.
    pub fn details(&self) -> Vec<String> {
        match self {
            AppError::ComfyWorkflow { errors, .. } => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        let body = json!({
            "errorMsg": self.to_string(),
            "errorDetails": self.details(),
            "errorType": self.error_type(),
        });
        (status, axum::Json(body)).into_response()
    }
}
