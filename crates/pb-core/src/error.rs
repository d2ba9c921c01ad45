use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Invalid payload: {reason}")]
    InvalidPayload { reason: String },
    #[error("Corrupt response: {reason}")]
    CorruptResponse { reason: String },
    #[error("Function not found: {query}")]
    NotFound { query: String },
    #[error("Insertion after line {after_line} is past the end of a {line_count}-line function.")]
    IndexOutOfRange { after_line: usize, line_count: usize },
    #[error("File does not exist: {}", path.display())]
    MissingFile { path: PathBuf },
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Wait for {} was cancelled.", path.display())]
    Cancelled { path: PathBuf },
    #[error("Invalid command: {message}")]
    InvalidCommand { message: String },
}

impl BridgeError {
    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            reason: reason.into(),
        }
    }

    pub fn corrupt_response(reason: impl Into<String>) -> Self {
        Self::CorruptResponse {
            reason: reason.into(),
        }
    }

    pub fn not_found(query: impl ToString) -> Self {
        Self::NotFound {
            query: query.to_string(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn invalid_command(message: impl Into<String>) -> Self {
        Self::InvalidCommand {
            message: message.into(),
        }
    }

    /// Stable identifier printed next to the message by the CLI.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPayload { .. } => "CODEC_INVALID_PAYLOAD",
            Self::CorruptResponse { .. } => "CHANNEL_CORRUPT_RESPONSE",
            Self::NotFound { .. } => "PATCH_NOT_FOUND",
            Self::IndexOutOfRange { .. } => "PATCH_INDEX_OUT_OF_RANGE",
            Self::MissingFile { .. } => "SESSION_MISSING_FILE",
            Self::Io { .. } => "IO",
            Self::Cancelled { .. } => "CHANNEL_CANCELLED",
            Self::InvalidCommand { .. } => "SESSION_INVALID_COMMAND",
        }
    }
}
