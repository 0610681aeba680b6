use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a suggestion envelope could not be turned into typed groups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing field `{path}` in suggestion envelope")]
    MissingField { path: String },
    #[error("suggestion content is not valid JSON: {message}")]
    InvalidJson { message: String },
    #[error("suggestions must be an array, got {found}")]
    NotAnArray { found: &'static str },
    #[error("invalid suggestion structure at `{path}`: {reason}")]
    SchemaViolation { path: String, reason: String },
}

impl DecodeError {
    pub fn user_message(&self) -> &'static str {
        "Invalid suggestion format"
    }
}

/// Best-effort shape of a non-2xx body from the conversion service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
