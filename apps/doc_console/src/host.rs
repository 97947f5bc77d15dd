//! Terminal and filesystem adapters for the document controller.

use std::{
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use client_core::{ConfirmationGate, DocumentSink, SelectedFile};
use shared::protocol::PDF_MIME_TYPE;
use tracing::{info, warn};

const FALLBACK_DOWNLOAD_NAME: &str = "document.pdf";

/// Saves downloads into a fixed directory, keeping only the final path
/// component of the server-supplied name.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn target_path(&self, filename: &str) -> PathBuf {
        let name = Path::new(filename)
            .file_name()
            .filter(|name| !name.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(FALLBACK_DOWNLOAD_NAME));
        self.dir.join(name)
    }
}

#[async_trait]
impl DocumentSink for DirectorySink {
    async fn save(&self, filename: &str, bytes: Vec<u8>) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create '{}'", self.dir.display()))?;
        let path = self.target_path(filename);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "saved download");
        println!("Saved {}", path.display());
        Ok(())
    }
}

/// Asks on stdin; anything other than `y`/`yes` declines.
pub struct StdinConfirmation;

#[async_trait]
impl ConfirmationGate for StdinConfirmation {
    async fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if let Err(err) = std::io::stdout().flush() {
            warn!(error = %err, "failed to flush prompt");
        }
        match read_line().await {
            Ok(Some(answer)) => is_affirmative(&answer),
            Ok(None) => false,
            Err(err) => {
                warn!(error = %err, "confirmation prompt failed");
                false
            }
        }
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Reads one line from stdin on the blocking pool. `None` at end of input.
pub async fn read_line() -> Result<Option<String>> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        let read = std::io::stdin().read_line(&mut line)?;
        Ok::<_, std::io::Error>((read > 0).then_some(line))
    })
    .await
    .context("stdin reader task failed")?
    .context("failed to read stdin")
}

/// Loads a file for upload. Only PDF files are accepted.
pub async fn pick_file(path: &Path) -> Result<SelectedFile> {
    let mime_type = mime_guess::from_path(path).first_raw();
    if mime_type != Some(PDF_MIME_TYPE) {
        bail!("'{}' is not a PDF file", path.display());
    }
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("'{}' has no file name", path.display()))?;
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    Ok(SelectedFile::new(
        filename,
        mime_type.map(str::to_string),
        content,
    ))
}

#[cfg(test)]
#[path = "tests/host_tests.rs"]
mod tests;
