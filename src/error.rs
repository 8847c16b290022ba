use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum DexError {
    /// The remote species source could not deliver and nothing usable is cached.
    #[error("species source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Pokémon '{0}' non trovato.")]
    NotFound(String),

    #[error("corrupt cache {}: {reason}", .path.display())]
    CorruptCache { path: PathBuf, reason: String },

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl DexError {
    pub(crate) fn corrupt(path: &std::path::Path, reason: impl Into<String>) -> Self {
        DexError::CorruptCache {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn status_code(&self) -> u16 {
        match self {
            DexError::NotFound(_) => 404,
            DexError::SourceUnavailable(_) => 503,
            _ => 500,
        }
    }
}
