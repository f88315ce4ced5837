// Logs module - Rotating file writer, mirror and orchestration

mod clock;
mod exceptions;
mod logger;
mod manager;
mod mirror;
mod path;
mod policy;
mod provision;
mod writer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use exceptions::ExceptionLog;
pub use logger::{LogEvent, RotatingLogger, WriteReceipt, EVENT_CAPACITY};
pub use manager::LogManager;
pub use mirror::{ConsoleMirror, MirrorSink, NullMirror};
pub use path::{normalize_path, LogTarget, DATE_FORMAT};
pub use policy::{FileState, RotationDecision, RotationPolicy};
pub use provision::ensure_dir;
pub use writer::{ActiveFile, FileWriterSink, RotatedFile};
