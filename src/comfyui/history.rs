//! Output files listed in ComfyUI's `/history/<prompt_id>` response.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A file ComfyUI wrote, addressable through `/view`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default = "default_output_type")]
    pub kind: String,
}

fn default_output_type() -> String {
    "output".to_string()
}

/// Output media keys used by core and VHS nodes.
const OUTPUT_KEYS: &[&str] = &["images", "gifs", "videos", "audio"];

/// Files produced by `prompt_id`, in node order.
///
/// Accepts both the bare `{"<prompt_id>": {...}}` shape and the same
/// object wrapped under `"history"`.
pub fn output_files(history: &Value, prompt_id: &str) -> Vec<OutputFile> {
    let entry = history
        .get(prompt_id)
        .or_else(|| history.get("history").and_then(|h| h.get(prompt_id)));
    let Some(outputs) = entry.and_then(|e| e.get("outputs")).and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut files = Vec::new();
    for node_output in outputs.values() {
        for key in OUTPUT_KEYS {
            let Some(items) = node_output.get(*key).and_then(Value::as_array) else {
                continue;
            };
            files.extend(
                items
                    .iter()
                    .filter_map(|item| OutputFile::deserialize(item).ok()),
            );
        }
    }
    files
}

/// Keep only files of one execution, recognised by its file prefix.
pub fn files_with_prefix<'a>(
    files: &'a [OutputFile],
    prefix: &'a str,
) -> impl Iterator<Item = &'a OutputFile> + 'a {
    files.iter().filter(move |f| f.filename.starts_with(prefix))
}

/// Files of `prompt_id`, narrowed to one execution when `execution_id` is given.
///
/// Outputs carry the `<execution id>_` prefix set on output nodes.
pub fn execution_files(history: &Value, prompt_id: &str, execution_id: Option<&str>) -> Vec<OutputFile> {
    let files = output_files(history, prompt_id);
    match execution_id {
        Some(id) => {
            let prefix = format!("{id}_");
            files_with_prefix(&files, &prefix).cloned().collect()
        }
        None => files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn history() -> Value {
        json!({
            "abc": {
                "outputs": {
                    "9": {
                        "images": [
                            { "filename": "e1_00001_.png", "subfolder": "", "type": "output" },
                            { "filename": "other_00001_.png", "subfolder": "", "type": "output" }
                        ]
                    },
                    "12": {
                        "gifs": [ { "filename": "e1_00001.mp4", "subfolder": "", "type": "output", "format": "video/h264-mp4" } ],
                        "text": ["ignored"]
                    }
                }
            }
        })
    }

    #[test]
    fn collects_images_and_videos() {
        let files = output_files(&history(), "abc");
        let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["e1_00001_.png", "other_00001_.png", "e1_00001.mp4"]);
    }

    #[test]
    fn wrapped_history_is_accepted() {
        let wrapped = json!({ "history": history() });
        assert_eq!(output_files(&wrapped, "abc").len(), 3);
        assert!(output_files(&wrapped, "missing").is_empty());
    }

    #[test]
    fn prefix_filter_selects_one_execution() {
        let files = output_files(&history(), "abc");
        assert_eq!(files_with_prefix(&files, "e1_").count(), 2);
    }

    #[test]
    fn execution_files_keep_only_that_execution() {
        let mine = execution_files(&history(), "abc", Some("e1"));
        let names: Vec<_> = mine.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["e1_00001_.png", "e1_00001.mp4"]);
        assert_eq!(execution_files(&history(), "abc", None).len(), 3);
        assert!(execution_files(&history(), "abc", Some("e2")).is_empty());
    }
}
