//! Seams to the host environment: file selection, save-as and confirmation prompts.

use anyhow::Result;
use async_trait::async_trait;
use shared::protocol::PDF_MIME_TYPE;

/// A file picked by the user, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub filename: String,
    pub mime_type: Option<String>,
    pub content: Vec<u8>,
}

impl SelectedFile {
    pub fn new(filename: impl Into<String>, mime_type: Option<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type,
            content,
        }
    }

    pub fn pdf(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self::new(filename, Some(PDF_MIME_TYPE.to_string()), content)
    }

    pub fn is_pdf(&self) -> bool {
        match self.mime_type.as_deref() {
            Some(mime_type) => mime_type.eq_ignore_ascii_case(PDF_MIME_TYPE),
            None => self.filename.to_ascii_lowercase().ends_with(".pdf"),
        }
    }
}

/// Receives downloaded bytes and offers them to the user under `filename`.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn save(&self, filename: &str, bytes: Vec<u8>) -> Result<()>;
}

/// Yes/no gate consulted before destructive actions.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

pub struct AlwaysConfirm;

#[async_trait]
impl ConfirmationGate for AlwaysConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
