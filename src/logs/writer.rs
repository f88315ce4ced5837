use crate::error::{Result, RotateError};
use crate::logs::path::LogTarget;
use crate::logs::policy::FileState;
use crate::logs::provision::ensure_dir;
use chrono::{DateTime, Local, NaiveDate};
use std::path::{Path, PathBuf};
use tokio::fs::{File as TokioFile, OpenOptions};
use tokio::io::AsyncWriteExt;

/// The live file currently receiving appends for a target
pub struct ActiveFile {
    /// Path to the live file
    path: PathBuf,
    /// Async handle opened in append mode
    file: TokioFile,
    /// Bytes in the file, including content present before open
    bytes_written: u64,
    /// Creation timestamp used for daily rotation and rotated names
    opened_at: DateTime<Local>,
}

impl ActiveFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn opened_at(&self) -> DateTime<Local> {
        self.opened_at
    }

    pub fn is_empty(&self) -> bool {
        self.bytes_written == 0
    }

    pub fn state(&self) -> FileState {
        FileState {
            bytes_written: self.bytes_written,
            opened_at: self.opened_at,
        }
    }

    /// Move the creation timestamp of an empty file forward
    pub fn rebase(&mut self, now: DateTime<Local>) {
        if self.is_empty() {
            self.opened_at = now;
        }
    }
}

/// An immutable former live file, renamed with a date stamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatedFile {
    pub path: PathBuf,
    pub date: NaiveDate,
    pub seq: u32,
}

/// FileWriterSink owns the file lifecycle for one log target:
/// open, append, rotate and close
#[derive(Debug, Clone)]
pub struct FileWriterSink {
    target: LogTarget,
}

impl FileWriterSink {
    pub fn new(target: LogTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &LogTarget {
        &self.target
    }

    /// Open the live file, creating it and its directory if needed
    ///
    /// An existing file is opened in append mode and its size is carried
    /// over. When it already holds data, its modification time (capped at
    /// `now`) becomes the creation timestamp so a file left over from an
    /// earlier day rotates under that day's date.
    ///
    /// # Arguments
    /// * `now` - Creation timestamp for a new or empty file
    ///
    /// # Returns
    /// * `Ok(ActiveFile)` - Handle positioned at the end of the live file
    /// * `Err(RotateError)` - Directory or file could not be created or opened
    pub async fn open(&self, now: DateTime<Local>) -> Result<ActiveFile> {
        ensure_dir(self.target.directory()).await?;

        let path = self.target.live_path();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| RotateError::LogFileError(format!("{}: {}", path.display(), e)))?;

        let metadata = file
            .metadata()
            .await
            .map_err(|e| RotateError::LogFileError(format!("{}: {}", path.display(), e)))?;

        let bytes_written = metadata.len();
        let opened_at = if bytes_written > 0 {
            metadata
                .modified()
                .map(DateTime::<Local>::from)
                .map(|modified| modified.min(now))
                .unwrap_or(now)
        } else {
            now
        };

        tracing::debug!(
            path = %path.display(),
            bytes = bytes_written,
            "Opened live log file"
        );

        Ok(ActiveFile {
            path,
            file,
            bytes_written,
            opened_at,
        })
    }

    /// Append one line plus terminator and flush it to stable storage
    ///
    /// # Arguments
    /// * `active` - Live file to append to
    /// * `line` - Normalized record without its terminator
    ///
    /// # Returns
    /// * `Ok(u64)` - Cumulative size of the live file
    /// * `Err(RotateError)` - Write, flush or sync failed
    pub async fn append(&self, active: &mut ActiveFile, line: &str) -> Result<u64> {
        let mut entry = Vec::with_capacity(line.len() + 1);
        entry.extend_from_slice(line.as_bytes());
        entry.push(b'\n');

        // write_all retries short writes until the whole entry is out
        active
            .file
            .write_all(&entry)
            .await
            .map_err(|e| RotateError::LogWriteError(format!("{}: {}", active.path.display(), e)))?;

        active
            .file
            .flush()
            .await
            .map_err(|e| RotateError::LogWriteError(format!("Failed to flush log: {}", e)))?;

        active
            .file
            .sync_data()
            .await
            .map_err(|e| RotateError::LogWriteError(format!("Failed to sync log: {}", e)))?;

        active.bytes_written += entry.len() as u64;

        Ok(active.bytes_written)
    }

    /// Close the live file and rename it to the next free rotated name
    ///
    /// The rotated name carries the date of the file's creation timestamp.
    /// An existing rotated file is never overwritten; same-day rotations get
    /// strictly increasing sequence suffixes. The next live file is not
    /// opened here.
    ///
    /// # Arguments
    /// * `active` - Live file to retire; it is closed even if the rename fails
    ///
    /// # Returns
    /// * `Ok(RotatedFile)` - Name, date and sequence of the rotated file
    /// * `Err(RotateError)` - Close, directory listing or rename failed
    pub async fn rotate(&self, active: ActiveFile) -> Result<RotatedFile> {
        let date = active.opened_at.date_naive();
        let from = active.path.clone();

        self.close(active).await?;

        let mut seq = self.next_seq(date).await?;
        let mut rotated_path = self.target.rotated_path(date, seq);
        while tokio::fs::try_exists(&rotated_path)
            .await
            .map_err(|e| RotateError::LogRotationError(format!("{}: {}", rotated_path.display(), e)))?
        {
            seq += 1;
            rotated_path = self.target.rotated_path(date, seq);
        }

        tokio::fs::rename(&from, &rotated_path)
            .await
            .map_err(|e| RotateError::LogRotationError(format!("Failed to rotate log: {}", e)))?;

        tracing::info!(
            from = %from.display(),
            to = %rotated_path.display(),
            "Rotated log file"
        );

        Ok(RotatedFile {
            path: rotated_path,
            date,
            seq,
        })
    }

    /// Flush and close the live file
    pub async fn close(&self, mut active: ActiveFile) -> Result<()> {
        active
            .file
            .flush()
            .await
            .map_err(|e| RotateError::LogWriteError(format!("Failed to flush log: {}", e)))?;

        active
            .file
            .sync_all()
            .await
            .map_err(|e| RotateError::LogWriteError(format!("Failed to sync log: {}", e)))?;

        Ok(())
    }

    /// Sequence following the highest existing rotated file for `date`
    async fn next_seq(&self, date: NaiveDate) -> Result<u32> {
        let mut entries = tokio::fs::read_dir(self.target.directory())
            .await
            .map_err(|e| RotateError::LogRotationError(format!("Failed to list log directory: {}", e)))?;

        let mut highest: Option<u32> = None;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RotateError::LogRotationError(format!("Failed to list log directory: {}", e)))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(seq) = self.target.parse_rotated_seq(name, date) {
                highest = Some(highest.map_or(seq, |h| h.max(seq)));
            }
        }

        Ok(highest.map_or(0, |h| h + 1))
    }
}
