//! Env-driven configuration for the service and CLI.
//!
//! Values are read from the process environment; `dotenv` is loaded on demand
//! by the binaries. Defaults are provided for convenience during development.
use std::env;
use std::path::PathBuf;

const ENV_VARS: &[&str] = &[
    "COMFYUI_URL",
    "COMFY_INPUTS_DIR",
    "VIEW_COMFY_FILE_NAME",
    "API_HOST",
    "API_PORT",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub comfyui_url: String,
    /// Where uploaded form files are written for ComfyUI to read.
    pub comfy_inputs_dir: PathBuf,
    /// Workflow used by `/comfy` when a request carries none.
    pub view_comfy_file: PathBuf,
    pub api_host: String,
    pub api_port: String,
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `new` uses the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        Config {
            comfyui_url: get("COMFYUI_URL", "http://127.0.0.1:8188"),
            comfy_inputs_dir: PathBuf::from(get("COMFY_INPUTS_DIR", "./comfy/inputs")),
            view_comfy_file: PathBuf::from(get("VIEW_COMFY_FILE_NAME", "view_comfy.json")),
            api_host: get("API_HOST", "127.0.0.1"),
            api_port: get("API_PORT", "3000"),
        }
    }

    pub fn log_env_vars() {
        for key in ENV_VARS {
            let value = env::var(key).unwrap_or_else(|_| "<unset>".to_string());
            tracing::info!("{}: {}", key, value);
        }
    }
}
