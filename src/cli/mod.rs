// CLI module - Feeds records from a line stream into the rotating logger

mod output;

use crate::config::{LoggerConfig, MirrorConfig};
use crate::error::{ErrorKind, Result, RotateError};
use crate::logs::{LogEvent, LogManager, LogTarget};
use crate::record::Record;
use clap::Parser;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

/// csv-rotate - Append records to a daily and size rotated CSV log
#[derive(Parser, Debug)]
#[command(name = "csv-rotate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base filename; the live file is `_<filename>.csv`
    #[arg(short, long)]
    filename: Option<String>,

    /// Directory for the live and rotated files
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Rotate once the live file would exceed this many bytes
    #[arg(long)]
    max_size: Option<u64>,

    /// Disable rotation on calendar date change
    #[arg(long)]
    no_daily: bool,

    /// Do not mirror records to the console
    #[arg(long)]
    no_mirror: bool,

    /// Treat every input line as text instead of parsing JSON
    #[arg(long)]
    raw: bool,

    /// Input lines are JSON messages with `payload` and optional `csvfile`
    #[arg(long, conflicts_with = "raw")]
    envelope: bool,

    /// Print `logged:<line>` for each written record
    #[arg(long)]
    emit: bool,

    /// Read records from this file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,
}

/// Records written, failed and skipped during one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub written: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// One inbound message: a record and an optional per-message target
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub record: Option<Record>,
    pub filename: Option<String>,
    pub directory: Option<PathBuf>,
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> Result<()> {
        init_tracing();
        let cli = Cli::parse();
        cli.execute().await
    }

    async fn execute(&self) -> Result<()> {
        let template = self.build_config()?;

        let reader: Box<dyn AsyncRead + Unpin + Send> = match &self.input {
            Some(path) => Box::new(
                tokio::fs::File::open(path)
                    .await
                    .map_err(|e| RotateError::ConfigError(format!("Failed to open input: {}", e)))?,
            ),
            None => Box::new(tokio::io::stdin()),
        };

        if template.validate().is_ok() {
            output::print_target(
                &LogTarget::from_config(&template).live_path(),
                template.size_threshold_bytes,
                template.rotate_daily,
            );
        }

        let mut manager = LogManager::new(template.clone());
        let events = tokio::spawn(report_events(manager.subscribe(), self.emit));

        let mut tally = Tally::default();
        let fed = self.feed(reader, &template, &mut manager, &mut tally).await;
        if let Err(e) = &fed {
            tracing::error!("Stopped reading input: {}", e);
        }

        let closed = manager.close_all().await;
        drop(manager);
        let _ = events.await;

        output::print_summary(tally.written, tally.failed, tally.skipped);
        fed.and(closed)
    }

    /// Write every line of `reader` through `manager`
    ///
    /// Lines are split on `\n` as raw bytes, so one line that is not UTF-8
    /// is reported and dropped without ending the run.
    ///
    /// # Arguments
    /// * `reader` - Input stream, one record per line
    /// * `template` - Configured target; wins over per-message targets
    /// * `manager` - Logger registry receiving the records
    /// * `tally` - Counters updated per line
    ///
    /// # Returns
    /// * `Ok(())` - Input was read to the end
    /// * `Err(RotateError)` - Reading the input failed
    async fn feed<R: AsyncRead + Unpin>(
        &self,
        reader: R,
        template: &LoggerConfig,
        manager: &mut LogManager,
        tally: &mut Tally,
    ) -> Result<()> {
        let mut lines = BufReader::new(reader).split(b'\n');

        while let Some(mut bytes) = lines.next_segment().await? {
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            if bytes.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let message = parse_bytes(bytes, self.raw, self.envelope);
            let Some(record) = message.record else {
                tally.skipped += 1;
                continue;
            };

            let (filename, directory) = resolve_target(template, message.filename, message.directory);

            match manager.write(&filename, &directory, record).await {
                Ok(receipt) => {
                    tally.written += 1;
                    if let Some(rotated) = &receipt.rotated {
                        output::print_rotated(rotated);
                    }
                }
                Err(e) if e.kind() == ErrorKind::Configuration => {
                    tally.skipped += 1;
                    output::print_warning(&e.to_string());
                }
                Err(_) => tally.failed += 1,
            }
        }

        Ok(())
    }

    /// Merge the configuration file with command-line overrides
    fn build_config(&self) -> Result<LoggerConfig> {
        let mut config = match &self.config {
            Some(path) => LoggerConfig::from_file(path)?,
            None => LoggerConfig::new(String::new(), PathBuf::new()),
        };

        if let Some(filename) = &self.filename {
            config.filename = filename.clone();
        }
        if let Some(directory) = &self.directory {
            config.directory = directory.clone();
        }
        if let Some(max_size) = self.max_size {
            config.size_threshold_bytes = max_size;
        }
        if self.no_daily {
            config.rotate_daily = false;
        }
        if self.no_mirror {
            config.mirror = MirrorConfig {
                enabled: false,
                ..config.mirror
            };
        }

        Ok(config)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Print events until every logger has been dropped
async fn report_events(mut events: tokio::sync::broadcast::Receiver<LogEvent>, emit: bool) {
    loop {
        match events.recv().await {
            Ok(LogEvent::Written { line, .. }) => {
                if emit {
                    output::print_logged(&line);
                }
            }
            Ok(LogEvent::Error { kind, detail, .. }) => output::print_write_error(kind, &detail),
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!("Event reporter lagged, {} events dropped", missed);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Pick the target for a message
///
/// The configured filename and directory win; the message only fills in
/// what the configuration leaves empty.
pub fn resolve_target(
    template: &LoggerConfig,
    filename: Option<String>,
    directory: Option<PathBuf>,
) -> (String, PathBuf) {
    let filename = if template.filename.is_empty() {
        filename.unwrap_or_default()
    } else {
        template.filename.clone()
    };
    let directory = if template.directory.as_os_str().is_empty() {
        directory.unwrap_or_default()
    } else {
        template.directory.clone()
    };
    (filename, directory)
}

/// Parse one raw input line; bytes that are not UTF-8 pass through untouched
pub fn parse_bytes(bytes: Vec<u8>, raw: bool, envelope: bool) -> Message {
    match String::from_utf8(bytes) {
        Ok(line) => parse_message(&line, raw, envelope),
        Err(e) => Message {
            record: Some(Record::Bytes(e.into_bytes())),
            filename: None,
            directory: None,
        },
    }
}

/// Parse one input line into a message
///
/// Plain mode parses JSON and falls back to text. Envelope mode reads
/// `{"payload": ..., "csvfile": {"filename": ..., "path": ...}}` where
/// `path` names a file and its parent is the directory; a line that is not
/// an envelope is treated as plain.
pub fn parse_message(line: &str, raw: bool, envelope: bool) -> Message {
    if raw {
        return Message {
            record: Some(Record::Text(line.to_string())),
            filename: None,
            directory: None,
        };
    }

    let value = match serde_json::from_str::<Value>(line) {
        Ok(value) => value,
        Err(_) => {
            return Message {
                record: Some(Record::Text(line.to_string())),
                filename: None,
                directory: None,
            }
        }
    };

    if envelope {
        if let Value::Object(mut map) = value {
            if map.contains_key("payload") {
                let csvfile = map.remove("csvfile");
                let field = |name: &str| {
                    csvfile
                        .as_ref()
                        .and_then(|c| c.get(name))
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                };
                return Message {
                    record: map.remove("payload").and_then(Record::from_value),
                    filename: field("filename"),
                    directory: field("path").and_then(|path| parent_dir(&path)),
                };
            }
            return Message {
                record: Record::from_value(Value::Object(map)),
                filename: None,
                directory: None,
            };
        }
    }

    Message {
        record: Record::from_value(value),
        filename: None,
        directory: None,
    }
}

/// Directory part of a file path; a bare file name lives in `.`
fn parent_dir(path: &str) -> Option<PathBuf> {
    let parent = Path::new(path).parent()?;
    if parent.as_os_str().is_empty() {
        Some(PathBuf::from("."))
    } else {
        Some(parent.to_path_buf())
    }
}
