//! Local storage for uploaded input files.
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// An uploaded file as received from the form.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Directory ComfyUI reads input media from.
#[derive(Debug, Clone)]
pub struct InputStore {
    dir: PathBuf,
}

impl InputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        InputStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `file` as `<dir>/<prefix><file name>` and return that path.
    ///
    /// Only the final component of the client-supplied name is used.
    pub async fn save(&self, prefix: &str, file: &UploadedFile) -> AppResult<String> {
        let name = Path::new(&file.file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                AppError::BadRequest(format!("invalid upload file name '{}'", file.file_name))
            })?;
        let target = self.dir.join(format!("{prefix}{name}"));

        let materialize_err = |source| AppError::FileMaterialization {
            file_name: file.file_name.clone(),
            source,
        };
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(materialize_err)?;
        tokio::fs::write(&target, &file.bytes)
            .await
            .map_err(materialize_err)?;

        tracing::info!(path = %target.display(), bytes = file.bytes.len(), "stored uploaded input");
        Ok(target.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn saves_under_prefixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = InputStore::new(dir.path());
        let file = UploadedFile {
            file_name: "cat.png".into(),
            bytes: vec![1, 2, 3],
        };
        let path = store.save("abc_", &file).await.unwrap();
        assert_eq!(Path::new(&path), dir.path().join("abc_cat.png"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn client_directories_are_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let store = InputStore::new(dir.path());
        let file = UploadedFile {
            file_name: "../../etc/cat.png".into(),
            bytes: vec![0],
        };
        let path = store.save("p_", &file).await.unwrap();
        assert_eq!(Path::new(&path), dir.path().join("p_cat.png"));
    }

    #[tokio::test]
    async fn unwritable_dir_is_a_materialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        tokio::fs::write(&blocker, b"x").await.unwrap();
        let store = InputStore::new(&blocker);
        let file = UploadedFile {
            file_name: "cat.png".into(),
            bytes: vec![0],
        };
        assert_matches!(
            store.save("p_", &file).await,
            Err(AppError::FileMaterialization { .. })
        );
    }
}
