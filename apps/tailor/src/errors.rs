use std::path::PathBuf;

use thiserror::Error;

use crate::llm_client::LlmError;
use crate::tailoring::analysis::ParseError;

/// Error type for every tailoring operation.
/// Each failure class stays distinct so callers can tell them apart.
#[derive(Debug, Error)]
pub enum TailorError {
    #[error("Language model integration failed: {0}")]
    Integration(#[from] LlmError),

    #[error("Could not parse job analysis: {0}")]
    Parse(#[from] ParseError),

    #[error("Template error ({}): {reason}", .path.display())]
    Template { path: PathBuf, reason: String },

    #[error("I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TailorError {
    pub fn template(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        TailorError::Template {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TailorError::Io {
            path: path.into(),
            source,
        }
    }
}
