//! Workflow graph -> form schema.
//!
//! Each node's scalar inputs become [`InputField`]s; the node class then
//! decides whether one of them is promoted to a basic input, whether the
//! whole set becomes an advanced group, or whether nothing is shown.
use serde_json::Value;

use crate::inject::seed::is_seed_like;
use crate::schema::types::{DisplaySchema, InputField, MultiValueInput, ValueType};
use crate::workflow::graph::{NodeClass, NodeRef, WorkflowGraph};

/// Title prefixes that pin a node into the form.
///
/// When any node carries one, only pinned nodes produce fields.
pub const PINNED_BASIC_MARKER: &str = "VC_BASIC";
pub const PINNED_ADVANCED_MARKER: &str = "VC_ADV";

/// Title of the field that marks an image loader as uploadable.
const UPLOAD_FIELD_TITLE: &str = "Upload";

/// Title of the upload field on `VHS_LoadVideo`.
const VIDEO_FIELD_TITLE: &str = "Video";

/// Outcome of classifying one node.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Basic(InputField),
    Advanced(MultiValueInput),
    /// Upload field in the basic section, remaining settings as a group.
    Split(InputField, MultiValueInput),
    Dropped,
}

/// Derive the form schema of `graph`. Never fails: bad nodes are skipped.
pub fn infer_schema(graph: &WorkflowGraph) -> DisplaySchema {
    let mut unpinned = DisplaySchema::default();
    let mut pinned = DisplaySchema::default();

    for (node_id, node) in graph.nodes() {
        let Some(view) = NodeRef::from_entry(node_id, node) else {
            tracing::warn!(node_id = %node_id, "skipping malformed workflow node");
            continue;
        };
        let (title, is_pinned) = strip_pin_marker(view.display_title());
        let target = if is_pinned { &mut pinned } else { &mut unpinned };

        match classify(&view, title, collect_fields(&view)) {
            Classified::Basic(field) => target.inputs.push(field),
            Classified::Advanced(group) => target.advanced_inputs.push(group),
            Classified::Split(field, group) => {
                target.inputs.push(field);
                target.advanced_inputs.push(group);
            }
            Classified::Dropped => {
                tracing::trace!(node_id = %node_id, class_type = view.class_type, "node has no form fields")
            }
        }
    }

    if pinned.inputs.is_empty() && pinned.advanced_inputs.is_empty() {
        unpinned
    } else {
        pinned
    }
}

/// Scalar inputs of a node, in input order.
pub fn collect_fields(node: &NodeRef<'_>) -> Vec<InputField> {
    let Some(inputs) = node.inputs else {
        return Vec::new();
    };
    let mut fields = Vec::with_capacity(inputs.len());
    for (name, value) in inputs {
        match value {
            Value::Array(_) | Value::Null => continue,
            Value::Object(_) => {
                tracing::debug!(node_id = node.id, input = %name, "nested object inputs are not exposed");
                continue;
            }
            _ => {}
        }
        let field = InputField::scalar(node.id, name, value.clone());
        if !field.workflow_path.round_trips() {
            tracing::warn!(
                node_id = node.id,
                input = %name,
                "input name or node id contains the key delimiter, field skipped"
            );
            continue;
        }
        fields.push(field);
    }
    fields
}

/// Decide what a node contributes to the form.
pub fn classify(node: &NodeRef<'_>, title: &str, mut fields: Vec<InputField>) -> Classified {
    match node.class() {
        NodeClass::ClipTextEncode => match take_first(&mut fields) {
            Some(mut field) => {
                field.value_type = ValueType::LongText;
                Classified::Basic(field.with_node_title(title))
            }
            None => Classified::Dropped,
        },
        NodeClass::LoadImage | NodeClass::LoadImageMask => {
            if !fields.iter().any(|f| f.title == UPLOAD_FIELD_TITLE) {
                return Classified::Dropped;
            }
            promote_media(&mut fields, ValueType::Image, title)
        }
        NodeClass::LoadImageViewComfy => promote_media(&mut fields, ValueType::Image, title),
        NodeClass::LoadVideo => promote_media(&mut fields, ValueType::Video, title),
        NodeClass::VhsLoadVideo => split_video_upload(node, title, fields),
        NodeClass::LoadAudio => promote_media(&mut fields, ValueType::Audio, title),
        NodeClass::SaveImage | NodeClass::VideoCombine | NodeClass::Generic(_) => {
            group_fields(node, title, fields)
        }
    }
}

/// All fields as one advanced group; seed-like inputs are tagged.
fn group_fields(node: &NodeRef<'_>, title: &str, mut fields: Vec<InputField>) -> Classified {
    if fields.len() <= 1 {
        return Classified::Dropped;
    }
    for field in &mut fields {
        let seed_like = field
            .workflow_path
            .split_last()
            .is_some_and(|(name, _)| is_seed_like(name));
        if seed_like {
            field.value_type = ValueType::Seed;
        }
    }
    Classified::Advanced(MultiValueInput {
        title: title.to_string(),
        inputs: fields,
        key: MultiValueInput::group_key(node.id, node.class_type),
    })
}

fn split_video_upload(node: &NodeRef<'_>, title: &str, mut fields: Vec<InputField>) -> Classified {
    let Some(pos) = fields.iter().position(|f| f.title == VIDEO_FIELD_TITLE) else {
        return group_fields(node, title, fields);
    };
    let mut upload = fields.remove(pos).with_node_title(title);
    upload.value_type = ValueType::Video;
    upload.value = Value::Null;
    if fields.is_empty() {
        return Classified::Basic(upload);
    }
    Classified::Split(
        upload,
        MultiValueInput {
            title: title.to_string(),
            inputs: fields,
            key: MultiValueInput::group_key(node.id, node.class_type),
        },
    )
}

fn promote_media(fields: &mut Vec<InputField>, value_type: ValueType, title: &str) -> Classified {
    match take_first(fields) {
        Some(mut field) => {
            field.value_type = value_type;
            field.value = Value::Null;
            Classified::Basic(field.with_node_title(title))
        }
        None => Classified::Dropped,
    }
}

fn take_first(fields: &mut Vec<InputField>) -> Option<InputField> {
    if fields.is_empty() {
        None
    } else {
        Some(fields.swap_remove(0))
    }
}

/// `("Prompt", true)` for `"VC_BASIC Prompt"`.
fn strip_pin_marker(title: &str) -> (&str, bool) {
    for marker in [PINNED_BASIC_MARKER, PINNED_ADVANCED_MARKER] {
        if let Some(rest) = title.strip_prefix(marker) {
            return (rest.trim(), true);
        }
    }
    (title, false)
}
