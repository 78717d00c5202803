//! Build-time error types.

use std::path::PathBuf;

use dashc_runtime::RuntimeError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that abort a build. Nothing is emitted when one is returned.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The source (or the generated program) does not parse
    #[error("Invalid source {name}: {message}")]
    InvalidSource { name: String, message: String },

    /// The wrapped line does not split back into `[python, -c, program]`
    #[error("Invalid shell line: {0}")]
    InvalidShellLine(String),

    /// No entry point could be found or the chosen one is not in the archive
    #[error("Entry point not found: {0}")]
    EntrypointNotFound(String),

    /// Explicit entry point text is malformed
    #[error("Invalid entry point: {0}")]
    InvalidEntrypoint(#[from] dashc_runtime::EntryParseError),

    #[error("Unknown compression method '{0}' (expected stored, deflate, bzip2 or lzma)")]
    UnknownCompressionMethod(String),

    #[error("Invalid compression level {level} for {method}: {expected}")]
    InvalidCompressionLevel {
        method: &'static str,
        level: i64,
        expected: &'static str,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Payload encoding failed: {0}")]
    Encode(#[source] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
