//! Form schema types, serialized in the `view_comfy.json` shape.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflow::graph::WorkflowGraph;
use crate::workflow::path::WorkflowPath;

pub const VIEW_COMFY_FILE_TYPE: &str = "view_comfy";
pub const VIEW_COMFY_FILE_VERSION: &str = "1.0.0";
pub const VIEW_COMFY_VERSION: &str = "0.0.1";

/// Placeholder help text attached to every inferred field.
pub const DEFAULT_HELP_TEXT: &str = "Helper Text";

/// Integral floats in this range still fit an `i64`.
const I64_FLOAT_RANGE: std::ops::Range<f64> = -9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueType {
    String,
    Number,
    Bigint,
    Boolean,
    Float,
    Image,
    Video,
    Audio,
    LongText,
    /// Seed input; the form offers a randomize toggle for it.
    Seed,
}

impl ValueType {
    /// Infer the control type from a scalar literal.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) => ValueType::Boolean,
            Value::Number(n) if n.is_i64() => ValueType::Number,
            Value::Number(n) if n.is_u64() => ValueType::Bigint,
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && !I64_FLOAT_RANGE.contains(&f) => ValueType::Bigint,
                Some(f) if f.fract() == 0.0 => ValueType::Number,
                _ => ValueType::Float,
            },
            _ => ValueType::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validations {
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputField {
    pub title: String,
    pub placeholder: String,
    pub value: Value,
    pub workflow_path: WorkflowPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub value_type: ValueType,
    pub validations: Validations,
    pub key: String,
}

impl InputField {
    /// Field for the scalar `value` of `inputs.<input_name>` on `node_id`.
    pub fn scalar(node_id: &str, input_name: &str, value: Value) -> Self {
        let workflow_path = WorkflowPath::node_input(node_id, input_name);
        let title = capitalize(input_name);
        InputField {
            placeholder: title.clone(),
            title,
            value_type: ValueType::of(&value),
            value,
            key: workflow_path.key(),
            workflow_path,
            help_text: Some(DEFAULT_HELP_TEXT.to_string()),
            validations: Validations {
                required: true,
                error_msg: None,
            },
        }
    }

    /// Re-title the field after its node, as done for promoted fields.
    pub fn with_node_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self.placeholder = title.to_string();
        self
    }
}

/// A node's fields shown together in the advanced section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiValueInput {
    pub title: String,
    pub inputs: Vec<InputField>,
    pub key: String,
}

impl MultiValueInput {
    pub fn group_key(node_id: &str, class_type: &str) -> String {
        format!("{node_id}-{class_type}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySchema {
    pub title: String,
    pub description: String,
    pub inputs: Vec<InputField>,
    pub advanced_inputs: Vec<MultiValueInput>,
}

impl DisplaySchema {
    /// Every field, basic first, then advanced in group order.
    pub fn fields(&self) -> impl Iterator<Item = &InputField> {
        self.inputs
            .iter()
            .chain(self.advanced_inputs.iter().flat_map(|g| g.inputs.iter()))
    }
}

/// The persisted `view_comfy.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewComfyJson {
    #[serde(rename = "file_type")]
    pub file_type: String,
    #[serde(rename = "file_version")]
    pub file_version: String,
    pub version: String,
    pub title: String,
    pub description: String,
    pub inputs: Vec<InputField>,
    pub advanced_inputs: Vec<MultiValueInput>,
    #[serde(
        rename = "workflowApiJSON",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub workflow_api_json: Option<WorkflowGraph>,
}

impl ViewComfyJson {
    /// Layer user-edited metadata on top of an inferred schema.
    pub fn from_schema(schema: DisplaySchema, title: &str, description: &str) -> Self {
        ViewComfyJson {
            file_type: VIEW_COMFY_FILE_TYPE.to_string(),
            file_version: VIEW_COMFY_FILE_VERSION.to_string(),
            version: VIEW_COMFY_VERSION.to_string(),
            title: if title.is_empty() { schema.title } else { title.to_string() },
            description: if description.is_empty() {
                schema.description
            } else {
                description.to_string()
            },
            inputs: schema.inputs,
            advanced_inputs: schema.advanced_inputs,
            workflow_api_json: None,
        }
    }

    pub fn with_workflow(mut self, graph: WorkflowGraph) -> Self {
        self.workflow_api_json = Some(graph);
        self
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
