//! Submitted form values -> finalized workflow graph.
//!
//! The source graph is never modified: every execution works on its own
//! copy and its own [`ExecutionId`]. After the explicit substitutions two
//! execution-time rules run over the copy:
//!
//! - output nodes get `filename_prefix = "<execution id>_"`, so every file
//!   an execution writes can be found by that prefix;
//! - seed-like inputs still holding [`seed::SEED_SENTINEL`] get a random seed.
pub mod seed;
pub mod store;

use std::fmt;

use rand::Rng;
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::workflow::graph::{NodeClass, WorkflowGraph};
use crate::workflow::path::WorkflowPath;

pub use store::{InputStore, UploadedFile};

const FILENAME_PREFIX_INPUT: &str = "filename_prefix";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionId(Uuid);

impl ExecutionId {
    pub fn new() -> Self {
        ExecutionId(Uuid::new_v4())
    }

    /// Prefix shared by stored inputs and output files of this execution.
    pub fn file_prefix(&self) -> String {
        format!("{}_", self.0)
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ExecutionId {
    fn from(id: Uuid) -> Self {
        ExecutionId(id)
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum InputValue {
    Json(Value),
    File(UploadedFile),
}

impl From<Value> for InputValue {
    fn from(value: Value) -> Self {
        InputValue::Json(value)
    }
}

/// One `{key, value}` pair from the form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmittedValue {
    pub key: String,
    pub value: InputValue,
}

impl SubmittedValue {
    pub fn json(key: impl Into<String>, value: Value) -> Self {
        SubmittedValue {
            key: key.into(),
            value: InputValue::Json(value),
        }
    }

    pub fn file(key: impl Into<String>, file: UploadedFile) -> Self {
        SubmittedValue {
            key: key.into(),
            value: InputValue::File(file),
        }
    }
}

/// Build the graph to execute from `graph` and the submitted `values`.
///
/// Every key is resolved before any file is written, so a mismatched key
/// leaves no stray uploads behind. Any failure aborts the whole call.
pub async fn inject_parameters(
    graph: &WorkflowGraph,
    values: Vec<SubmittedValue>,
    execution: &ExecutionId,
    store: &InputStore,
) -> AppResult<WorkflowGraph> {
    let mut resolved = Vec::with_capacity(values.len());
    for submitted in values {
        let path = WorkflowPath::parse(&submitted.key)?;
        check_target(graph, &path)?;
        resolved.push((path, submitted.value));
    }

    let prefix = execution.file_prefix();
    let mut assignments = Vec::with_capacity(resolved.len());
    for (path, value) in resolved {
        let value = match value {
            InputValue::Json(v) => v,
            InputValue::File(file) => Value::String(store.save(&prefix, &file).await?),
        };
        assignments.push((path, value));
    }

    finalize(graph, assignments, execution, &mut rand::rng())
}

/// Synchronous half of [`inject_parameters`]: assign already materialized
/// values and apply the execution conventions.
pub fn finalize<R: Rng>(
    graph: &WorkflowGraph,
    assignments: Vec<(WorkflowPath, Value)>,
    execution: &ExecutionId,
    rng: &mut R,
) -> AppResult<WorkflowGraph> {
    let mut finalized = graph.clone();
    for (path, value) in assignments {
        assign(finalized.as_map_mut(), &path, value)?;
    }
    apply_execution_conventions(finalized.as_map_mut(), &execution.file_prefix(), rng);
    tracing::debug!(execution = %execution, nodes = finalized.len(), "workflow finalized");
    Ok(finalized)
}

fn resolution_error(path: &WorkflowPath, segment: &str) -> AppError {
    AppError::PathResolution {
        key: path.key(),
        segment: segment.to_string(),
    }
}

fn check_target(graph: &WorkflowGraph, path: &WorkflowPath) -> AppResult<()> {
    let Some((_, parents)) = path.split_last() else {
        return Err(resolution_error(path, ""));
    };
    let mut segments = parents.iter();
    let first = segments.next().ok_or_else(|| resolution_error(path, ""))?;
    let mut cur = graph
        .get(first)
        .and_then(Value::as_object)
        .ok_or_else(|| resolution_error(path, first))?;
    for segment in segments {
        cur = cur
            .get(segment)
            .and_then(Value::as_object)
            .ok_or_else(|| resolution_error(path, segment))?;
    }
    Ok(())
}

fn assign(root: &mut Map<String, Value>, path: &WorkflowPath, value: Value) -> AppResult<()> {
    let Some((last, parents)) = path.split_last() else {
        return Err(resolution_error(path, ""));
    };
    let mut cur = root;
    for segment in parents {
        cur = cur
            .get_mut(segment)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| resolution_error(path, segment))?;
    }
    cur.insert(last.clone(), value);
    Ok(())
}

fn apply_execution_conventions<R: Rng>(
    nodes: &mut Map<String, Value>,
    prefix: &str,
    rng: &mut R,
) {
    for (node_id, node) in nodes.iter_mut() {
        let Some(obj) = node.as_object_mut() else {
            continue;
        };
        let is_output = obj
            .get("class_type")
            .and_then(Value::as_str)
            .map(|c| NodeClass::parse(c).is_output())
            .unwrap_or(false);
        let Some(inputs) = obj.get_mut("inputs").and_then(Value::as_object_mut) else {
            continue;
        };

        if is_output {
            inputs.insert(
                FILENAME_PREFIX_INPUT.to_string(),
                Value::String(prefix.to_string()),
            );
            continue;
        }

        for (name, value) in inputs.iter_mut() {
            if seed::is_seed_like(name) && seed::is_sentinel(value) {
                *value = seed::random_seed(rng);
                tracing::debug!(node_id = %node_id, input = %name, seed = %value, "randomized seed");
            }
        }
    }
}
