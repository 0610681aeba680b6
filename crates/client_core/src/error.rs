use std::path::PathBuf;

use shared::error::DecodeError;
use thiserror::Error;

/// Input problems caught before any request leaves the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please upload a Lesson Plan first")]
    MissingFile,
    #[error("Please enter a subject name")]
    EmptySubject,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to UpTeach service failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error! status: {status}")]
    Http { status: u16, message: Option<String> },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("{0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("could not build request: {0}")]
    BuildRequest(String),
    #[error("invalid service url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to read '{}': {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ClientError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Could not reach the UpTeach service. Please try again.".to_string(),
            Self::Http {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::Http { status, .. } => format!("HTTP error! status: {status}"),
            Self::Decode(err) => err.user_message().to_string(),
            Self::InvalidResponse(message) => message.clone(),
            Self::Validation(err) => err.to_string(),
            Self::BuildRequest(_) | Self::InvalidBaseUrl { .. } | Self::ReadFile { .. } => {
                self.to_string()
            }
        }
    }
}
