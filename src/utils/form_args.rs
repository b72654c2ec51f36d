//! Form values given on the command line.
//!
//! `--set 6-inputs-text="a dog"` sets a value, `--upload 10-inputs-image=./dog.png`
//! submits a local file as an upload.
use std::path::Path;

use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::inject::{SubmittedValue, UploadedFile};

fn split_pair(s: &str, flag: &str) -> AppResult<(String, String)> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(AppError::BadRequest(format!("Invalid {flag} '{s}', expected KEY=VALUE"))),
    }
}

pub fn parse_set_pairs(items: &[String]) -> AppResult<Vec<SubmittedValue>> {
    items
        .iter()
        .map(|s| {
            let (key, raw) = split_pair(s, "--set")?;
            Ok(SubmittedValue::json(key, parse_value(&raw)))
        })
        .collect()
}

/// JSON literal when it parses as one, plain string otherwise.
pub fn parse_value(src: &str) -> Value {
    if let Ok(v) = serde_json::from_str::<Value>(src) { return v; }
    if src.eq_ignore_ascii_case("null") { return Value::Null; }
    if src.eq_ignore_ascii_case("true") { return Value::Bool(true); }
    if src.eq_ignore_ascii_case("false") { return Value::Bool(false); }
    if let Ok(i) = src.parse::<i64>() { return Value::from(i); }
    if let Ok(f) = src.parse::<f64>() { return json!(f); }
    Value::String(src.to_string())
}

pub async fn load_uploads(items: &[String]) -> AppResult<Vec<SubmittedValue>> {
    let mut out = Vec::with_capacity(items.len());
    for s in items {
        let (key, path) = split_pair(s, "--upload")?;
        let bytes = tokio::fs::read(&path).await?;
        let file_name = Path::new(&path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::BadRequest(format!("--upload path '{path}' has no file name")))?;
        out.push(SubmittedValue::file(key, UploadedFile { file_name, bytes }));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inject::InputValue;

    #[test]
    fn values_parse_as_json_first() {
        assert_eq!(parse_value("20"), json!(20));
        assert_eq!(parse_value("7.5"), json!(7.5));
        assert_eq!(parse_value("TRUE"), json!(true));
        assert_eq!(parse_value("\"42\""), json!("42"));
        assert_eq!(parse_value("a dog"), json!("a dog"));
    }

    #[test]
    fn set_pairs_keep_everything_after_the_first_equals() {
        let items = vec!["6-inputs-text=a=b".to_string()];
        let values = parse_set_pairs(&items).unwrap();
        assert_eq!(values, vec![SubmittedValue::json("6-inputs-text", json!("a=b"))]);
    }

    #[test]
    fn set_without_equals_is_rejected() {
        assert!(parse_set_pairs(&["nope".to_string()]).is_err());
        assert!(parse_set_pairs(&["=1".to_string()]).is_err());
    }

    #[tokio::test]
    async fn uploads_are_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("dog.png");
        tokio::fs::write(&file, b"img").await.unwrap();

        let items = vec![format!("10-inputs-image={}", file.display())];
        let values = load_uploads(&items).await.unwrap();
        assert_eq!(values[0].key, "10-inputs-image");
        match &values[0].value {
            InputValue::File(f) => {
                assert_eq!(f.file_name, "dog.png");
                assert_eq!(f.bytes, b"img".to_vec());
            }
            other => panic!("expected file, got {other:?}"),
        }
    }
}
