// Best-effort secondary sinks for records

use crate::config::{MirrorConfig, MirrorLevel};
use chrono::Local;
use colored::*;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Severity at which records are mirrored
const RECORD_LEVEL: MirrorLevel = MirrorLevel::Debug;

/// A secondary, non-authoritative destination for every record
///
/// Implementations must not block and must not fail the caller.
pub trait MirrorSink: Send + Sync {
    fn append(&self, line: &str);
}

/// Mirror that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMirror;

impl MirrorSink for NullMirror {
    fn append(&self, _line: &str) {}
}

/// Console mirror that prints records to stderr from a background task
pub struct ConsoleMirror {
    level: MirrorLevel,
    sender: Option<mpsc::UnboundedSender<String>>,
}

impl ConsoleMirror {
    /// Create a console mirror showing records at or above `level`
    ///
    /// Inside a tokio runtime the printing happens on a spawned task;
    /// outside one, lines are printed inline.
    pub fn new(level: MirrorLevel) -> Self {
        let sender = tokio::runtime::Handle::try_current().ok().map(|handle| {
            let (tx, mut rx) = mpsc::unbounded_channel::<String>();
            handle.spawn(async move {
                while let Some(line) = rx.recv().await {
                    print_line(&line);
                }
            });
            tx
        });

        Self { level, sender }
    }

    fn enabled(&self) -> bool {
        RECORD_LEVEL >= self.level
    }
}

impl MirrorSink for ConsoleMirror {
    fn append(&self, line: &str) {
        if !self.enabled() {
            return;
        }

        match &self.sender {
            Some(sender) => {
                if sender.send(line.to_string()).is_err() {
                    tracing::warn!("Console mirror closed, dropping record");
                }
            }
            None => print_line(line),
        }
    }
}

fn print_line(line: &str) {
    let timestamp = Local::now().format("%H:%M:%S");
    eprintln!("{} - {}: {}", timestamp, "debug".blue(), line);
}

/// Build the mirror described by the configuration
pub fn from_config(config: &MirrorConfig) -> Arc<dyn MirrorSink> {
    if config.enabled {
        Arc::new(ConsoleMirror::new(config.level))
    } else {
        Arc::new(NullMirror)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_mirror_level() {
        assert!(ConsoleMirror::new(MirrorLevel::Debug).enabled());
        assert!(!ConsoleMirror::new(MirrorLevel::Info).enabled());
    }

    #[tokio::test]
    async fn test_console_mirror_never_fails() {
        let mirror = ConsoleMirror::new(MirrorLevel::Debug);
        mirror.append("10,20");
        mirror.append("");
    }

    #[test]
    fn test_console_mirror_without_runtime() {
        let mirror = ConsoleMirror::new(MirrorLevel::Debug);
        assert!(mirror.sender.is_none());
        mirror.append("inline");
    }

    #[test]
    fn test_from_config_disabled() {
        let config = MirrorConfig {
            enabled: false,
            level: MirrorLevel::Debug,
        };
        let mirror = from_config(&config);
        mirror.append("dropped");
    }
}
