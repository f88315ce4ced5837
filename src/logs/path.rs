use crate::config::LoggerConfig;
use crate::error::{Result, RotateError};
use chrono::NaiveDate;
use std::path::{Component, Path, PathBuf};

/// Date stamp format used in rotated file names
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A logical log: directory plus base filename and extension
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogTarget {
    directory: PathBuf,
    filename: String,
    extension: String,
}

impl LogTarget {
    pub fn new(
        directory: impl Into<PathBuf>,
        filename: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            filename: filename.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::new(&config.directory, &config.filename, &config.extension)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Name of the live file: `_<filename>.<extension>`
    pub fn live_name(&self) -> String {
        format!("_{}.{}", self.filename, self.extension)
    }

    /// Path of the live file: `<directory>/_<filename>.<extension>`
    pub fn live_path(&self) -> PathBuf {
        self.directory.join(self.live_name())
    }

    /// Path of a rotated file: `<live>.<YYYY-MM-DD>[.<seq>]`
    ///
    /// Sequence 0 is the bare date-stamped name.
    pub fn rotated_path(&self, date: NaiveDate, seq: u32) -> PathBuf {
        self.directory.join(self.rotated_name(date, seq))
    }

    pub fn rotated_name(&self, date: NaiveDate, seq: u32) -> String {
        let stamp = date.format(DATE_FORMAT);
        if seq == 0 {
            format!("{}.{}", self.live_name(), stamp)
        } else {
            format!("{}.{}.{}", self.live_name(), stamp, seq)
        }
    }

    /// Parse the sequence number of a rotated file name for `date`
    ///
    /// Returns `None` when the name belongs to another date or target.
    pub fn parse_rotated_seq(&self, name: &str, date: NaiveDate) -> Option<u32> {
        let base = self.rotated_name(date, 0);
        let rest = name.strip_prefix(&base)?;
        if rest.is_empty() {
            return Some(0);
        }
        rest.strip_prefix('.')?.parse().ok()
    }

    /// Path of the auxiliary fault file in the target directory
    pub fn exceptions_path(&self) -> PathBuf {
        self.directory.join("exceptions.log")
    }
}

/// Absolute form of `path` with `.` and `..` folded lexically
///
/// The directory does not need to exist yet.
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .map_err(|e| RotateError::DirectoryError(format!("{}: {}", path.display(), e)))?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}
