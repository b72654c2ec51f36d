//! ComfyUI workflow graphs: the graph model, input addressing and
//! document loading.
pub mod document;
pub mod graph;
pub mod path;

pub use document::WorkflowDocument;
pub use graph::{NodeClass, NodeRef, WorkflowGraph};
pub use path::WorkflowPath;
