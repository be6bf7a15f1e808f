use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::{CollectionStore, StoreError};

/// Stores a collection as a single JSON array on disk.
///
/// Every save writes a sibling temporary file and renames it over the target,
/// so readers observe either the previous or the new collection.
pub struct JsonFileStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the parent directory and an empty `[]` collection if the file is missing.
    ///
    /// Returns `true` when a new file was written.
    pub async fn ensure_exists(&self) -> Result<bool, StoreError> {
        match tokio::fs::try_exists(&self.path).await {
            Ok(true) => return Ok(false),
            Ok(false) => {}
            Err(source) => return Err(StoreError::io(&self.path, source)),
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::io(parent, source))?;
        }

        self.write_atomically(b"[]").await?;
        tracing::info!(path = %self.path.display(), "created empty collection file");
        Ok(true)
    }

    async fn write_atomically(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "collection".to_string());
        let tmp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp_path, bytes)
            .await
            .map_err(|source| StoreError::io(&tmp_path, source))?;

        if let Err(source) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StoreError::io(&self.path, source));
        }

        Ok(())
    }
}

#[async_trait]
impl<T> CollectionStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn load(&self) -> Result<Vec<T>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "collection file missing, treating as empty");
                return Ok(Vec::new());
            }
            Err(source) => return Err(StoreError::io(&self.path, source)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, items: &[T]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(items).map_err(StoreError::Encode)?;
        self.write_atomically(&bytes).await?;
        tracing::debug!(path = %self.path.display(), count = items.len(), "collection saved");
        Ok(())
    }
}
