//! Axum request handlers for the HTTP API.
use std::path::Path as FsPath;
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::routes::AppState;
use crate::comfyui::history::{self, OutputFile};
use crate::error::{AppError, AppResult};
use crate::inject::{inject_parameters, ExecutionId, SubmittedValue, UploadedFile};
use crate::schema::types::ViewComfyJson;
use crate::workflow::document::WorkflowDocument;
use crate::workflow::graph::WorkflowGraph;

pub async fn root() -> &'static str {
    "ViewComfy workflow proxy"
}

#[derive(Debug, Default, Deserialize)]
pub struct SchemaParams {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Body: a `workflow_api.json` or `view_comfy.json` document.
pub async fn workflow_schema(
    Query(params): Query<SchemaParams>,
    body: String,
) -> AppResult<Json<ViewComfyJson>> {
    let document = WorkflowDocument::parse(&body)?;
    Ok(Json(document.into_view_comfy(&params.title, &params.description)))
}

/// Finalize without queuing; useful to inspect what would be sent.
pub async fn finalize_workflow(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<Value>> {
    let (execution, finalized) = prepare_execution(&state, multipart).await?;
    Ok(Json(json!({
        "execution_id": execution.to_string(),
        "prompt": finalized,
    })))
}

pub async fn run_workflow(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> AppResult<Json<Value>> {
    let (execution, finalized) = prepare_execution(&state, multipart).await?;
    let queued = state.comfyui_client
        .queue_prompt(&finalized, &state.client_id)
        .await?;
    Ok(Json(json!({
        "execution_id": execution.to_string(),
        "prompt_id": queued.prompt_id,
        "number": queued.number,
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    /// Keep only files written by this execution.
    pub execution_id: Option<String>,
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(prompt_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<Value>> {
    let hist = state.comfyui_client.get_history(&prompt_id).await?;
    let files = history::execution_files(&hist, &prompt_id, params.execution_id.as_deref());
    Ok(Json(json!({ "prompt_id": prompt_id, "files": files })))
}

pub async fn view_file(
    State(state): State<Arc<AppState>>,
    Query(file): Query<OutputFile>,
) -> AppResult<Vec<u8>> {
    state.comfyui_client.get_output_file(&file).await
}

/// Form parts of an execution request.
#[derive(Debug, Default)]
pub struct ExecutionForm {
    pub workflow: Option<WorkflowGraph>,
    pub values: Vec<SubmittedValue>,
}

/// Multipart layout:
/// - `workflow`: the graph document (optional),
/// - `inputs`: JSON array of `{key, value}`,
/// - any part with a file name: an upload for the key it is named after,
/// - any other text part: a string value for the key it is named after.
pub async fn read_execution_form(mut multipart: Multipart) -> AppResult<ExecutionForm> {
    let mut form = ExecutionForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if let Some(file_name) = file_name {
            form.values.push(SubmittedValue::file(
                name,
                UploadedFile { file_name, bytes: bytes.to_vec() },
            ));
            continue;
        }

        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::BadRequest(format!("form field '{name}' is not UTF-8")))?;
        match name.as_str() {
            "workflow" => {
                form.workflow = Some(WorkflowDocument::parse(&text)?.into_graph()?);
            }
            "inputs" => {
                let values: Vec<SubmittedValue> = serde_json::from_str(&text)?;
                form.values.extend(values);
            }
            _ => form.values.push(SubmittedValue::json(name, Value::String(text))),
        }
    }
    Ok(form)
}

async fn prepare_execution(
    state: &AppState,
    multipart: Multipart,
) -> AppResult<(ExecutionId, WorkflowGraph)> {
    let form = read_execution_form(multipart).await?;
    let graph = match form.workflow {
        Some(graph) => graph,
        None => load_default_workflow(&state.view_comfy_file).await?,
    };

    let execution = ExecutionId::new();
    tracing::info!(execution = %execution, values = form.values.len(), "finalizing workflow");
    let finalized = inject_parameters(&graph, form.values, &execution, &state.input_store).await?;
    Ok((execution, finalized))
}

async fn load_default_workflow(path: &FsPath) -> AppResult<WorkflowGraph> {
    let document = WorkflowDocument::load(path).await.map_err(|e| match e {
        AppError::Io(_) => AppError::InvalidWorkflow(format!(
            "The {} file is missing, send a workflow with the request or set VIEW_COMFY_FILE_NAME to the correct path.",
            path.display()
        )),
        other => other,
    })?;
    document.into_graph()
}
