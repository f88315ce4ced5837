use crate::error::RotateError;
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Append-only fault file capturing failed writes
#[derive(Debug, Clone)]
pub struct ExceptionLog {
    path: PathBuf,
}

impl ExceptionLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a failure; errors here are logged and swallowed
    pub async fn record(&self, error: &RotateError) {
        let entry = format!(
            "[{}] {}: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            error.kind(),
            error
        );

        if let Err(e) = self.append(entry.as_bytes()).await {
            tracing::warn!(
                path = %self.path.display(),
                "Failed to write exception log: {}",
                e
            );
        }
    }

    async fn append(&self, entry: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry).await?;
        file.flush().await
    }
}
