use crate::error::{Result, RotateError};
use std::io::ErrorKind;
use std::path::Path;

/// Ensure `dir` and all missing ancestors exist
///
/// Idempotent. A concurrent creator winning the race is treated as success.
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(RotateError::DirectoryError(format!(
            "{}: {}",
            dir.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_creates_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("a").join("b").join("c");

        ensure_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_idempotent() {
        let temp_dir = TempDir::new().unwrap();

        ensure_dir(temp_dir.path()).await.unwrap();
        ensure_dir(temp_dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_ensure() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("shared").join("logs");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let dir = dir.clone();
                tokio::spawn(async move { ensure_dir(&dir).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_fails_when_path_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();

        let result = ensure_dir(&file.join("sub")).await;
        assert!(matches!(result, Err(RotateError::DirectoryError(_))));
    }
}
