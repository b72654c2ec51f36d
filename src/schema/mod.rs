//! Form schema inferred from a workflow graph.
pub mod infer;
pub mod types;

pub use infer::infer_schema;
pub use types::{DisplaySchema, InputField, MultiValueInput, ValueType, ViewComfyJson};
