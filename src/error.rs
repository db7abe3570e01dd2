//! Errors that abort a whole decode

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors: the log, template or configuration could not be obtained
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("format '{0}' not found")]
    FormatNotFound(String),

    #[error("no format files found in {}", .0.display())]
    NoFormats(PathBuf),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

impl DecodeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DecodeError::Io {
            path: path.into(),
            source,
        }
    }
}
