use std::{marker::PhantomData, path::{Path, PathBuf}};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};

use crate::errors::StorageError;

/// A pretty-printed JSON array persisted to a single file.
///
/// The parent directory and an empty `[]` file are created on demand before
/// every read and write, so the file can be deleted while the process runs.
#[derive(Debug, Clone)]
pub struct JsonArrayFile<T> {
    file_path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonArrayFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { file_path: path.into(), _marker: PhantomData }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    async fn ensure_exists(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        if fs::metadata(&self.file_path).await.is_err() {
            fs::write(&self.file_path, b"[]").await?;
            debug!(path = %self.file_path.display(), "created empty json file");
        }
        Ok(())
    }

    /// Read all records.
    ///
    /// Elements are decoded one at a time: an element that does not fit `T`
    /// is logged and skipped, the rest still load. A file that is not a JSON
    /// array at all is logged and treated as empty.
    pub async fn read(&self) -> Result<Vec<T>, StorageError> {
        self.ensure_exists().await?;
        let bytes = fs::read(&self.file_path).await?;
        let raw = match serde_json::from_slice::<Vec<Value>>(&bytes) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.file_path.display(), error = %e, "unparsable json file, starting empty");
                return Ok(Vec::new());
            }
        };
        let mut items = Vec::with_capacity(raw.len());
        for (index, value) in raw.into_iter().enumerate() {
            match serde_json::from_value::<T>(value) {
                Ok(item) => items.push(item),
                Err(e) => warn!(path = %self.file_path.display(), index, error = %e, "skipping malformed record"),
            }
        }
        Ok(items)
    }

    /// Replace the file contents with `items`.
    pub async fn write(&self, items: &[T]) -> Result<(), StorageError> {
        self.ensure_exists().await?;
        let data = serde_json::to_vec_pretty(items)?;
        fs::write(&self.file_path, data).await?;
        Ok(())
    }
}
