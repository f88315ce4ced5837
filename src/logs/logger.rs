use crate::config::LoggerConfig;
use crate::error::{ErrorKind, Result};
use crate::logs::clock::{Clock, SystemClock};
use crate::logs::exceptions::ExceptionLog;
use crate::logs::mirror::{self, MirrorSink};
use crate::logs::path::LogTarget;
use crate::logs::policy::{RotationDecision, RotationPolicy};
use crate::logs::writer::{ActiveFile, FileWriterSink, RotatedFile};
use crate::record::Record;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// Capacity of the lifecycle event channel
pub const EVENT_CAPACITY: usize = 1024;

/// Lifecycle events emitted once per write attempt
#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    /// A line was durably appended to the live file at `path`
    Written { path: PathBuf, line: String },
    /// A write attempt failed and the record was not persisted
    Error {
        kind: ErrorKind,
        detail: String,
        record: Record,
    },
}

/// Acknowledgement of a durable append
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReceipt {
    /// The normalized line that was written
    pub line: String,
    /// Cumulative size of the live file after the append
    pub bytes_written: u64,
    /// File produced if the write triggered a rotation
    pub rotated: Option<RotatedFile>,
}

/// RotatingLogger fans each record out to the live file and the mirror,
/// rotating the live file before any write that would break the policy
pub struct RotatingLogger {
    target: LogTarget,
    sink: FileWriterSink,
    policy: RotationPolicy,
    mirror: Arc<dyn MirrorSink>,
    clock: Arc<dyn Clock>,
    exceptions: ExceptionLog,
    events: broadcast::Sender<LogEvent>,
    /// Serializes writes; `None` until the first write or after a failure
    active: Mutex<Option<ActiveFile>>,
}

impl RotatingLogger {
    /// Create a logger with the system clock and the configured mirror
    pub fn new(config: &LoggerConfig) -> Result<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self::with_parts(
            config,
            mirror::from_config(&config.mirror),
            Arc::new(SystemClock),
            events,
        )
    }

    /// Create a logger from explicit collaborators
    pub fn with_parts(
        config: &LoggerConfig,
        mirror: Arc<dyn MirrorSink>,
        clock: Arc<dyn Clock>,
        events: broadcast::Sender<LogEvent>,
    ) -> Result<Self> {
        config.validate()?;

        let target = LogTarget::from_config(config);

        Ok(Self {
            sink: FileWriterSink::new(target.clone()),
            exceptions: ExceptionLog::new(target.exceptions_path()),
            target,
            policy: RotationPolicy::new(config.size_threshold_bytes, config.rotate_daily),
            mirror,
            clock,
            events,
            active: Mutex::new(None),
        })
    }

    pub fn target(&self) -> &LogTarget {
        &self.target
    }

    /// Subscribe to `written` / `error` events
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.events.subscribe()
    }

    /// Persist one record
    ///
    /// Emits exactly one event per call. A failed record is reported, never
    /// retried.
    ///
    /// # Arguments
    /// * `record` - Record to normalize, mirror and append
    ///
    /// # Returns
    /// * `Ok(WriteReceipt)` - The record is durably in the live file
    /// * `Err(RotateError)` - The record was dropped; also logged to
    ///   `exceptions.log` and sent as a `LogEvent::Error`
    pub async fn write(&self, record: Record) -> Result<WriteReceipt> {
        match self.try_write(&record).await {
            Ok(receipt) => {
                let _ = self.events.send(LogEvent::Written {
                    path: self.target.live_path(),
                    line: receipt.line.clone(),
                });
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!(
                    target_path = %self.target.live_path().display(),
                    "Failed to write record: {}",
                    e
                );
                self.exceptions.record(&e).await;
                let _ = self.events.send(LogEvent::Error {
                    kind: e.kind(),
                    detail: e.to_string(),
                    record,
                });
                Err(e)
            }
        }
    }

    async fn try_write(&self, record: &Record) -> Result<WriteReceipt> {
        let line = record.to_line()?;

        self.mirror.append(&line);

        let mut guard = self.active.lock().await;
        let now = self.clock.now();

        // Any failure below leaves the slot empty; the dropped handle is closed
        let mut active = match guard.take() {
            Some(active) => active,
            None => self.sink.open(now).await?,
        };
        active.rebase(now);

        let record_size = line.len() as u64 + 1;
        let rotated = match self.policy.decide(Some(active.state()), record_size, now) {
            RotationDecision::None => None,
            decision => {
                tracing::debug!(
                    ?decision,
                    bytes = active.bytes_written(),
                    "Rotating before write"
                );
                let rotated = self.sink.rotate(active).await?;
                active = self.sink.open(now).await?;
                Some(rotated)
            }
        };

        let bytes_written = self.sink.append(&mut active, &line).await?;
        *guard = Some(active);

        Ok(WriteReceipt {
            line,
            bytes_written,
            rotated,
        })
    }

    /// Flush and close the live file; the next write reopens it
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.active.lock().await;
        match guard.take() {
            Some(active) => self.sink.close(active).await,
            None => Ok(()),
        }
    }

    /// Whether a live file is currently held open
    pub async fn is_open(&self) -> bool {
        self.active.lock().await.is_some()
    }
}
