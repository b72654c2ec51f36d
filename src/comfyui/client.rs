//! Thin HTTP client for ComfyUI endpoints.
//!
//! - `queue_prompt` posts a finalized graph to `/prompt`.
//! - `get_history` fetches `/history/<prompt_id>`.
//! - `get_output_file` proxies `/view?filename=...` and returns raw bytes.
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::comfyui::errors::{connection_refused, prompt_rejection};
use crate::comfyui::history::OutputFile;
use crate::error::{AppError, AppResult};
use crate::workflow::graph::WorkflowGraph;

/// Body of a successful `/prompt` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedPrompt {
    pub prompt_id: String,
    #[serde(default)]
    pub number: i64,
}

#[derive(Clone)]
pub struct ComfyUIClient {
    client: Client,
    base_url: String,
}

impl ComfyUIClient {
    pub fn new(base_url: String) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        ComfyUIClient { client: Client::new(), base_url: base }
    }

    /// Queue a finalized graph with ComfyUI.
    ///
    /// Validation failures reported by ComfyUI come back as
    /// [`AppError::ComfyWorkflow`] with one line per failing node.
    pub async fn queue_prompt(&self, graph: &WorkflowGraph, client_id: &str) -> AppResult<QueuedPrompt> {
        let url = format!("{}/prompt", self.base_url);
        tracing::info!(%url, nodes = graph.len(), "queueing prompt");

        let body = json!({ "prompt": graph, "client_id": client_id });
        let response = self.client.post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            let queued: QueuedPrompt = response.json().await.map_err(AppError::HttpClient)?;
            tracing::info!(prompt_id = %queued.prompt_id, number = queued.number, "prompt queued");
            Ok(queued)
        } else {
            let error_body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
            tracing::error!(status = status.as_u16(), body = %error_body, "ComfyUI rejected prompt");
            Err(prompt_rejection(status.as_u16(), &error_body))
        }
    }

    /// Execution history of one prompt as JSON.
    pub async fn get_history(&self, prompt_id: &str) -> AppResult<Value> {
        let url = format!("{}/history/{}", self.base_url, prompt_id);
        let response = self.client.get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status().is_success() {
            response.json().await.map_err(AppError::HttpClient)
        } else {
            Err(AppError::ComfyUI(format!("Failed to get history: {:?}", response.status())))
        }
    }

    /// Bytes of an output file via ComfyUI's `/view` endpoint.
    pub async fn get_output_file(&self, file: &OutputFile) -> AppResult<Vec<u8>> {
        let url = format!("{}/view", self.base_url);
        let response = self.client.get(&url)
            .query(&[
                ("filename", file.filename.as_str()),
                ("subfolder", file.subfolder.as_str()),
                ("type", file.kind.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            response.bytes().await.map(|b| b.to_vec()).map_err(AppError::HttpClient)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Err(AppError::ComfyWorkflow {
                message: "File not found".to_string(),
                errors: vec![format!(
                    "The file {} was not found in the ComfyUI output directory",
                    file.filename
                )],
            })
        } else {
            Err(AppError::ComfyUI(format!("Failed to get output file: {:?}", status)))
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> AppError {
        if err.is_connect() {
            tracing::error!(url = %self.base_url, error = %err, "ComfyUI unreachable");
            connection_refused(&self.base_url)
        } else {
            AppError::HttpClient(err)
        }
    }
}
