//! Structured addressing of node inputs.
//!
//! A form field is identified by the path `[nodeId, "inputs", inputName]`.
//! On the wire the path travels as a single string joined with
//! [`PATH_DELIMITER`], e.g. `6-inputs-text`.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const PATH_DELIMITER: char = '-';

/// Segment between the node id and the input name.
pub const INPUTS_SEGMENT: &str = "inputs";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowPath(Vec<String>);

impl WorkflowPath {
    /// Path of `inputs.<input_name>` on node `node_id`.
    pub fn node_input(node_id: &str, input_name: &str) -> Self {
        WorkflowPath(vec![
            node_id.to_string(),
            INPUTS_SEGMENT.to_string(),
            input_name.to_string(),
        ])
    }

    /// Parse a wire key back into its segments.
    ///
    /// A key with fewer than two segments cannot address an assignment
    /// target and is rejected.
    pub fn parse(key: &str) -> AppResult<Self> {
        let segments: Vec<String> = key.split(PATH_DELIMITER).map(str::to_string).collect();
        if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
            return Err(AppError::PathResolution {
                key: key.to_string(),
                segment: key.to_string(),
            });
        }
        Ok(WorkflowPath(segments))
    }

    /// Serialize to the wire key.
    pub fn key(&self) -> String {
        self.0.join(&PATH_DELIMITER.to_string())
    }

    /// Whether [`parse`](Self::parse) of [`key`](Self::key) yields this path again.
    pub fn round_trips(&self) -> bool {
        self.0.len() >= 2
            && self
                .0
                .iter()
                .all(|s| !s.is_empty() && !s.contains(PATH_DELIMITER))
    }

    /// All segments but the last, and the last one.
    pub fn split_last(&self) -> Option<(&String, &[String])> {
        self.0.split_last()
    }
}

impl fmt::Display for WorkflowPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
