//! Loading user-supplied JSON documents.
//!
//! Three kinds of file reach the service: the API export
//! (`workflow_api.json`), a saved form (`view_comfy.json`), and the
//! UI-layout export (`workflow.json`), which is refused.
use std::path::Path;

use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::schema::infer::infer_schema;
use crate::schema::types::{ViewComfyJson, VIEW_COMFY_FILE_TYPE};
use crate::workflow::graph::WorkflowGraph;

/// Top-level key only present in the UI-layout export.
const UI_LAYOUT_MARKER: &str = "last_node_id";

#[derive(Debug, Clone)]
pub enum WorkflowDocument {
    Api(WorkflowGraph),
    ViewComfy(Box<ViewComfyJson>),
}

impl WorkflowDocument {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> AppResult<Self> {
        let Some(obj) = value.as_object() else {
            return Err(AppError::InvalidWorkflow(
                "expected a JSON object at the top level".to_string(),
            ));
        };
        if obj.get("file_type").and_then(Value::as_str) == Some(VIEW_COMFY_FILE_TYPE) {
            let doc: ViewComfyJson = serde_json::from_value(value)?;
            return Ok(WorkflowDocument::ViewComfy(Box::new(doc)));
        }
        if obj.contains_key(UI_LAYOUT_MARKER) {
            return Err(AppError::WorkflowFormat);
        }
        Ok(WorkflowDocument::Api(WorkflowGraph::from_value(value)?))
    }

    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to read workflow file");
            AppError::Io(e)
        })?;
        Self::parse(&raw)
    }

    /// The form document: inferred for an API export, as saved otherwise.
    ///
    /// Non-empty `title`/`description` override the stored ones.
    pub fn into_view_comfy(self, title: &str, description: &str) -> ViewComfyJson {
        match self {
            WorkflowDocument::Api(graph) => {
                let schema = infer_schema(&graph);
                tracing::info!(
                    basic = schema.inputs.len(),
                    advanced = schema.advanced_inputs.len(),
                    fields = schema.fields().count(),
                    "inferred form schema"
                );
                ViewComfyJson::from_schema(schema, title, description).with_workflow(graph)
            }
            WorkflowDocument::ViewComfy(doc) => {
                let mut doc = *doc;
                if !title.is_empty() {
                    doc.title = title.to_string();
                }
                if !description.is_empty() {
                    doc.description = description.to_string();
                }
                doc
            }
        }
    }

    /// The executable graph carried by the document.
    pub fn into_graph(self) -> AppResult<WorkflowGraph> {
        match self {
            WorkflowDocument::Api(graph) => Ok(graph),
            WorkflowDocument::ViewComfy(doc) => doc.workflow_api_json.ok_or_else(|| {
                AppError::InvalidWorkflow(
                    "view_comfy document does not embed a workflowApiJSON graph".to_string(),
                )
            }),
        }
    }
}
