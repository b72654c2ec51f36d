//! Shared state and router for the HTTP API.
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::comfyui::client::ComfyUIClient;
use crate::config::Config;
use crate::inject::InputStore;

pub struct AppState {
    pub comfyui_client: ComfyUIClient,
    pub input_store: InputStore,
    pub view_comfy_file: PathBuf,
    /// Identifies this proxy to ComfyUI for the lifetime of the process.
    pub client_id: String,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        AppState {
            comfyui_client: ComfyUIClient::new(config.comfyui_url.clone()),
            input_store: InputStore::new(config.comfy_inputs_dir.clone()),
            view_comfy_file: config.view_comfy_file.clone(),
            client_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/workflow/schema", post(handlers::workflow_schema))
        .route("/workflow/finalize", post(handlers::finalize_workflow))
        .route("/comfy", post(handlers::run_workflow))
        .route("/history/:prompt_id", get(handlers::get_history))
        .route("/view", get(handlers::view_file))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
