use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by a [`CollectionStore`](crate::CollectionStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access collection file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("collection file {path} holds malformed JSON: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode collection: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("collection store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
