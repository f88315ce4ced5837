use crate::config::LoggerConfig;
use crate::error::Result;
use crate::logs::clock::{Clock, SystemClock};
use crate::logs::logger::{LogEvent, RotatingLogger, WriteReceipt, EVENT_CAPACITY};
use crate::logs::mirror::{self, MirrorSink};
use crate::logs::path::{normalize_path, LogTarget};
use crate::record::Record;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

/// LogManager routes records to one RotatingLogger per log target
///
/// Loggers are created on first use from a template configuration whose
/// filename and directory are replaced per target. All loggers share one
/// event channel and one mirror.
pub struct LogManager {
    /// Rotation settings applied to every target
    template: LoggerConfig,
    /// Map of live-file path to logger
    loggers: HashMap<PathBuf, Arc<RotatingLogger>>,
    mirror: Arc<dyn MirrorSink>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<LogEvent>,
}

impl LogManager {
    /// Create a LogManager using the system clock and the template's mirror
    pub fn new(template: LoggerConfig) -> Self {
        let mirror = mirror::from_config(&template.mirror);
        Self::with_parts(template, mirror, Arc::new(SystemClock))
    }

    pub fn with_parts(
        template: LoggerConfig,
        mirror: Arc<dyn MirrorSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            template,
            loggers: HashMap::new(),
            mirror,
            clock,
            events,
        }
    }

    /// Subscribe to events from every managed logger
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.events.subscribe()
    }

    /// Get or create the logger for `filename` in `directory`
    ///
    /// The directory is made absolute and normalized first, so different
    /// spellings of one directory share a logger.
    ///
    /// # Arguments
    /// * `filename` - Base filename of the target
    /// * `directory` - Directory holding the live and rotated files
    ///
    /// # Returns
    /// * `Ok(Arc<RotatingLogger>)` - Existing or newly created logger
    /// * `Err(RotateError)` - Filename or directory is empty or invalid
    pub fn logger_for(&mut self, filename: &str, directory: &Path) -> Result<Arc<RotatingLogger>> {
        let mut config = self.template.clone();
        config.filename = filename.to_string();
        config.directory = directory.to_path_buf();
        config.validate()?;
        config.directory = normalize_path(directory)?;

        let key = LogTarget::from_config(&config).live_path();
        if let Some(logger) = self.loggers.get(&key) {
            return Ok(logger.clone());
        }

        let logger = Arc::new(RotatingLogger::with_parts(
            &config,
            self.mirror.clone(),
            self.clock.clone(),
            self.events.clone(),
        )?);

        tracing::debug!(path = %key.display(), "Created logger for target");
        self.loggers.insert(key, logger.clone());

        Ok(logger)
    }

    /// Write a record to the target named by `filename` and `directory`
    pub async fn write(
        &mut self,
        filename: &str,
        directory: &Path,
        record: Record,
    ) -> Result<WriteReceipt> {
        let logger = self.logger_for(filename, directory)?;
        logger.write(record).await
    }

    /// Check if a logger exists for a live-file path
    pub fn has_logger(&self, live_path: &Path) -> bool {
        normalize_path(live_path)
            .map(|key| self.loggers.contains_key(&key))
            .unwrap_or(false)
    }

    /// Get the number of managed loggers
    pub fn logger_count(&self) -> usize {
        self.loggers.len()
    }

    /// Close every live file; the loggers stay registered
    ///
    /// A failing logger does not stop the others from closing.
    ///
    /// # Returns
    /// * `Ok(())` - Every live file was closed
    /// * `Err(RotateError)` - The first close failure
    pub async fn close_all(&self) -> Result<()> {
        let mut first_error = None;
        for (path, logger) in &self.loggers {
            if let Err(e) = logger.close().await {
                tracing::warn!(path = %path.display(), "Failed to close log file: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
