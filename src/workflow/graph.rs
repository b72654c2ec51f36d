//! The ComfyUI "API format" graph and typed views over its nodes.
//!
//! ```json
//! {
//!   "6": {
//!     "class_type": "CLIPTextEncode",
//!     "inputs": { "text": "a cat", "clip": ["4", 1] },
//!     "_meta": { "title": "Positive Prompt" }
//!   }
//! }
//! ```
//!
//! Nodes stay untyped JSON so that unknown custom nodes survive a round
//! trip untouched; only the classes the engines special-case get a
//! [`NodeClass`] variant.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// Node id -> node, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowGraph(Map<String, Value>);

impl WorkflowGraph {
    pub fn from_value(value: Value) -> AppResult<Self> {
        match value {
            Value::Object(map) => Ok(WorkflowGraph(map)),
            other => Err(AppError::InvalidWorkflow(format!(
                "workflow must be a JSON object of nodes, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn get(&self, node_id: &str) -> Option<&Value> {
        self.0.get(node_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Node classes that get special treatment; everything else is `Generic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass<'a> {
    ClipTextEncode,
    LoadImage,
    LoadImageMask,
    /// ViewComfy's own image loader.
    LoadImageViewComfy,
    LoadVideo,
    /// VHS video loader; its `video` input is the upload.
    VhsLoadVideo,
    LoadAudio,
    SaveImage,
    VideoCombine,
    Generic(&'a str),
}

impl<'a> NodeClass<'a> {
    pub fn parse(class_type: &'a str) -> Self {
        match class_type {
            "CLIPTextEncode" => NodeClass::ClipTextEncode,
            "LoadImage" => NodeClass::LoadImage,
            "LoadImageMask" => NodeClass::LoadImageMask,
            "LoadImage_ViewComfy" => NodeClass::LoadImageViewComfy,
            "LoadVideo" => NodeClass::LoadVideo,
            "VHS_LoadVideo" => NodeClass::VhsLoadVideo,
            "LoadAudio" => NodeClass::LoadAudio,
            "SaveImage" => NodeClass::SaveImage,
            "VHS_VideoCombine" => NodeClass::VideoCombine,
            other => NodeClass::Generic(other),
        }
    }

    /// Nodes whose `filename_prefix` names the execution's output files.
    pub fn is_output(&self) -> bool {
        matches!(self, NodeClass::SaveImage | NodeClass::VideoCombine)
    }
}

/// Borrowed view of one well-formed node.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    pub id: &'a str,
    pub class_type: &'a str,
    pub title: Option<&'a str>,
    pub inputs: Option<&'a Map<String, Value>>,
}

impl<'a> NodeRef<'a> {
    /// `None` when the entry is not an object or has no string `class_type`.
    pub fn from_entry(id: &'a str, node: &'a Value) -> Option<Self> {
        let obj = node.as_object()?;
        let class_type = obj.get("class_type")?.as_str()?;
        let title = obj
            .get("_meta")
            .and_then(|meta| meta.get("title"))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty());
        let inputs = obj.get("inputs").and_then(Value::as_object);
        Some(NodeRef {
            id,
            class_type,
            title,
            inputs,
        })
    }

    pub fn class(&self) -> NodeClass<'a> {
        NodeClass::parse(self.class_type)
    }

    /// Display title, falling back to the class type.
    pub fn display_title(&self) -> &'a str {
        self.title.unwrap_or(self.class_type)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
