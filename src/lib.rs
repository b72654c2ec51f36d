//! ViewComfy workflow proxy library
//!
//! Modules:
//! - `workflow`: ComfyUI API-format graphs, node classes and `nodeId-inputs-name` paths.
//! - `schema`: Form schema inference from a graph and the `view_comfy.json` document.
//! - `inject`: Writes submitted form values back into a graph before execution.
//! - `comfyui`: Thin client for ComfyUI REST endpoints and its error decoding.
//! - `api`: Axum HTTP handlers and router setup used by the binary.
//! - `utils`: Command-line form value parsing for `vcctl`.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `ComfyUIClient`,
//! `WorkflowGraph`, `WorkflowDocument` and `ViewComfyJson`.
pub mod api;
pub mod comfyui;
pub mod config;
pub mod error;
pub mod inject;
pub mod schema;
pub mod utils;
pub mod workflow;

pub use comfyui::client::ComfyUIClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use schema::types::ViewComfyJson;
pub use workflow::{WorkflowDocument, WorkflowGraph};
