//! Error taxonomy for remote document operations and its user-facing rendering.

use std::fmt;

use reqwest::StatusCode;
use shared::error::ErrorBody;
use thiserror::Error;

pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error: Unable to connect to the server. Please check your connection.";
pub const AUTH_FAILED_MESSAGE: &str = "Failed to authenticate. Please refresh the page.";
pub const NO_FILE_SELECTED_MESSAGE: &str = "Please select a PDF file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Authenticate,
    List,
    Upload,
    Download,
    Delete,
}

impl Operation {
    /// Message used when the status line carries nothing usable.
    fn generic_failure(self) -> &'static str {
        match self {
            Self::Authenticate => "Authentication failed",
            Self::List => "Failed to load files",
            Self::Upload => "Upload failed",
            Self::Download => "Download failed",
            Self::Delete => "Delete failed",
        }
    }

    fn gerund(self) -> &'static str {
        match self {
            Self::Authenticate => "authentication",
            Self::List => "loading files",
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Delete => "deletion",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authenticate => "authenticate",
            Self::List => "list",
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Auth,
    Operation,
    Validation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("{operation} request failed in transport: {reason}")]
    Transport { operation: Operation, reason: String },
    #[error("authentication rejected with status {status}")]
    Auth { status: StatusCode },
    #[error("{operation} failed with status {status}")]
    Operation {
        operation: Operation,
        status: StatusCode,
        body: ErrorBody,
    },
    #[error("unexpected {operation} failure: {reason}")]
    Unexpected { operation: Operation, reason: String },
    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    pub fn transport(operation: Operation, source: &reqwest::Error) -> Self {
        Self::Transport {
            operation,
            reason: source.to_string(),
        }
    }

    pub fn unexpected(operation: Operation, reason: impl fmt::Display) -> Self {
        Self::Unexpected {
            operation,
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Operation { .. } | Self::Unexpected { .. } => ErrorKind::Operation,
            Self::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Text shown to the user. A server `detail` wins; a JSON body without one
    /// gives the bare operation message; anything else appends the status line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { .. } => NETWORK_ERROR_MESSAGE.to_string(),
            Self::Auth { .. } => AUTH_FAILED_MESSAGE.to_string(),
            Self::Operation {
                operation,
                status,
                body,
            } => {
                let generic = operation.generic_failure();
                match (body, status.canonical_reason()) {
                    (ErrorBody::Detail(detail), _) => detail.clone(),
                    (ErrorBody::Structured, _) | (ErrorBody::Unparsed, None) => {
                        generic.to_string()
                    }
                    (ErrorBody::Unparsed, Some(reason)) => format!("{generic}: {reason}"),
                }
            }
            Self::Unexpected { operation, .. } => {
                format!("An unexpected error occurred during {}", operation.gerund())
            }
            Self::Validation(message) => message.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
