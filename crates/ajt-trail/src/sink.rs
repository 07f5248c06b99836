//! Judgment trail sinks.
//!
//! Every sink writes one complete line per call while holding an exclusive
//! lock, so concurrent producers never interleave partial lines.

use ajt_core::{ConfigError, Encoding, OutputConfig, OutputKind};
use std::fs::{self, OpenOptions};
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::Level;

use crate::error::TrailError;
use crate::event::JudgmentEvent;

/// Destination for serialized judgment events.
pub trait TrailSink: Send + Sync {
    /// Write one line. `line` carries no trailing newline.
    fn write_line(&self, line: &str) -> Result<(), TrailError>;
}

/// Serialize `event` and append it to `sink` as one newline-terminated line.
///
/// Serialization happens before the sink is touched, so a failure writes
/// nothing.
pub fn append<S: TrailSink + ?Sized>(
    event: &JudgmentEvent,
    sink: &S,
    encoding: Encoding,
) -> Result<(), TrailError> {
    let line = event.to_line(encoding)?;
    sink.write_line(&line)
}

/// Serialize every event, then append them in order.
///
/// Nothing is written unless all events serialize.
pub fn append_batch<S: TrailSink + ?Sized>(
    events: &[JudgmentEvent],
    sink: &S,
    encoding: Encoding,
) -> Result<(), TrailError> {
    let lines = events
        .iter()
        .map(|event| event.to_line(encoding))
        .collect::<Result<Vec<_>, _>>()?;

    for line in &lines {
        sink.write_line(line)?;
    }
    Ok(())
}

/// Create a sink from output configuration.
pub fn create_sink(config: &OutputConfig) -> Result<Arc<dyn TrailSink>, TrailError> {
    let sink: Arc<dyn TrailSink> = match config.kind {
        OutputKind::File => Arc::new(FileSink::new(&config.path)?),
        OutputKind::Stdout => Arc::new(WriterSink::stdout()),
        OutputKind::Tracing => Arc::new(TracingSink::from_level_str(&config.level)?),
        OutputKind::Dual => Arc::new(DualSink::new(&config.path)?),
    };
    Ok(sink)
}

fn with_newline(line: &str) -> String {
    let mut record = String::with_capacity(line.len() + 1);
    record.push_str(line);
    record.push('\n');
    record
}

// The guarded data is only ever written whole, so a poisoned lock is safe to reuse.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Appends to a JSON Lines file.
///
/// The file is opened in append mode for each write and closed afterwards;
/// existing lines are never rewritten.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSink {
    /// Create a file sink, creating the parent directory if needed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, TrailError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrailSink for FileSink {
    fn write_line(&self, line: &str) -> Result<(), TrailError> {
        let record = with_newline(line);

        let _guard = lock(&self.lock);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(record.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Writes lines to any `Write` implementation.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WriterSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TrailSink for WriterSink<W> {
    fn write_line(&self, line: &str) -> Result<(), TrailError> {
        let record = with_newline(line);

        let mut writer = lock(&self.writer);
        writer.write_all(record.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Emits lines as `tracing` events under the `ajt` target.
///
/// Use this to hand judgment lines to whatever subscriber the application
/// already installs.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    level: Level,
}

impl TracingSink {
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Parse a level name (`trace`, `debug`, `info`, `warn`, `error`).
    pub fn from_level_str(level: &str) -> Result<Self, TrailError> {
        let level = level.parse::<Level>().map_err(|_| {
            ConfigError::Config(format!("invalid tracing output level '{}'", level))
        })?;
        Ok(Self::new(level))
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl TrailSink for TracingSink {
    fn write_line(&self, line: &str) -> Result<(), TrailError> {
        if self.level == Level::ERROR {
            tracing::error!(target: "ajt", "{}", line);
        } else if self.level == Level::WARN {
            tracing::warn!(target: "ajt", "{}", line);
        } else if self.level == Level::INFO {
            tracing::info!(target: "ajt", "{}", line);
        } else if self.level == Level::DEBUG {
            tracing::debug!(target: "ajt", "{}", line);
        } else {
            tracing::trace!(target: "ajt", "{}", line);
        }
        Ok(())
    }
}

/// File plus a console copy (stdout by default).
///
/// The file is the record of truth: a failed file write is an error, a failed
/// console write is logged and ignored.
#[derive(Debug)]
pub struct DualSink<W = Stdout> {
    file: FileSink,
    console: WriterSink<W>,
}

impl DualSink {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, TrailError> {
        Self::with_console(path, io::stdout())
    }
}

impl<W: Write + Send> DualSink<W> {
    pub fn with_console(path: impl AsRef<Path>, console: W) -> Result<Self, TrailError> {
        Ok(Self {
            file: FileSink::new(path)?,
            console: WriterSink::new(console),
        })
    }

    /// Consume the sink and return the console writer.
    pub fn into_console(self) -> W {
        self.console.into_inner()
    }
}

impl<W: Write + Send> TrailSink for DualSink<W> {
    fn write_line(&self, line: &str) -> Result<(), TrailError> {
        self.file.write_line(line)?;

        if let Err(e) = self.console.write_line(line) {
            tracing::warn!(
                path = %self.file.path().display(),
                error = %e,
                "Console copy of judgment line failed; file write succeeded"
            );
        }
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        Self
    }
}

impl TrailSink for NullSink {
    fn write_line(&self, _line: &str) -> Result<(), TrailError> {
        Ok(())
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.lines).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.lines).is_empty()
    }
}

impl TrailSink for MemorySink {
    fn write_line(&self, line: &str) -> Result<(), TrailError> {
        lock(&self.lines).push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(decision: &str) -> JudgmentEvent {
        JudgmentEvent::new(decision, "low", "gpt-4", "v1.0", "1.0.0").unwrap()
    }

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ajt_trace.jsonl");
        fs::write(&path, "{\"existing\":true}\n").unwrap();

        let sink = FileSink::new(&path).unwrap();
        append(&event("allow"), &sink, Encoding::Utf8).unwrap();
        append(&event("block"), &sink, Encoding::Utf8).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "{\"existing\":true}");
        assert!(lines[1].contains("\"decision\":\"allow\""));
        assert!(lines[2].contains("\"decision\":\"block\""));
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_file_sink_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("nested").join("trail.jsonl");

        let sink = FileSink::new(&path).unwrap();
        append(&event("allow"), &sink, Encoding::Utf8).unwrap();
        assert!(path.exists());
        assert_eq!(sink.path(), path.as_path());
    }

    #[test]
    fn test_file_sink_io_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let sink = FileSink::new(dir.path()).unwrap();

        let err = append(&event("allow"), &sink, Encoding::Utf8).unwrap_err();
        assert!(matches!(err, TrailError::Io(_)));
    }

    #[test]
    fn test_writer_sink() {
        let sink = WriterSink::new(Vec::new());
        append(&event("escalate"), &sink, Encoding::Utf8).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn test_append_batch() {
        let sink = MemorySink::new();
        let events = vec![event("allow"), event("block"), event("escalate")];

        append_batch(&events, &sink, Encoding::Utf8).unwrap();
        assert_eq!(sink.len(), 3);
        assert!(sink.lines()[2].contains("escalate"));
    }

    #[test]
    fn test_null_sink() {
        let sink = NullSink::new();
        append(&event("allow"), &sink, Encoding::Ascii).unwrap();
    }

    #[test]
    fn test_tracing_sink_levels() {
        assert_eq!(TracingSink::from_level_str("warn").unwrap().level(), Level::WARN);
        assert_eq!(TracingSink::default().level(), Level::INFO);

        let err = TracingSink::from_level_str("loud").unwrap_err();
        assert!(matches!(err, TrailError::Config(_)));

        let sink = TracingSink::new(Level::DEBUG);
        append(&event("allow"), &sink, Encoding::Utf8).unwrap();
    }

    #[test]
    fn test_create_sink_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig {
            kind: OutputKind::File,
            path: dir.path().join("trail.jsonl"),
            ..Default::default()
        };

        let sink = create_sink(&config).unwrap();
        let event = JudgmentEvent::builder()
            .decision("allow")
            .risk_level("low")
            .model("gpt-4")
            .policy_version("v1.0")
            .app_version("1.0.0")
            .context(json!({}))
            .build()
            .unwrap();
        append(&event, sink.as_ref(), Encoding::Utf8).unwrap();

        let content = fs::read_to_string(dir.path().join("trail.jsonl")).unwrap();
        assert!(content.contains("\"context\":{}"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_dual_sink_writes_file_and_console() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trail.jsonl");

        let sink = DualSink::with_console(&path, Vec::new()).unwrap();
        append(&event("allow"), &sink, Encoding::Utf8).unwrap();

        let file = fs::read_to_string(&path).unwrap();
        let console = String::from_utf8(sink.into_console()).unwrap();
        assert_eq!(file.lines().count(), 1);
        assert_eq!(file, console);
    }

    #[test]
    fn test_dual_sink_console_failure_keeps_file_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trail.jsonl");

        let sink = DualSink::with_console(&path, BrokenPipe).unwrap();
        append(&event("allow"), &sink, Encoding::Utf8).unwrap();
        append(&event("block"), &sink, Encoding::Utf8).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"decision\":\"allow\""));
        assert!(lines[1].contains("\"decision\":\"block\""));
    }

    #[test]
    fn test_dual_sink_file_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DualSink::with_console(dir.path(), Vec::new()).unwrap();

        let err = append(&event("allow"), &sink, Encoding::Utf8).unwrap_err();
        assert!(matches!(err, TrailError::Io(_)));
        assert!(sink.into_console().is_empty());
    }

    #[test]
    fn test_create_sink_stdout() {
        let config = OutputConfig {
            kind: OutputKind::Stdout,
            ..Default::default()
        };

        let sink = create_sink(&config).unwrap();
        append(&event("allow"), sink.as_ref(), Encoding::Utf8).unwrap();
    }

    #[test]
    fn test_create_sink_dual() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("trail.jsonl");
        let config = OutputConfig {
            kind: OutputKind::Dual,
            path: path.clone(),
            ..Default::default()
        };

        let sink = create_sink(&config).unwrap();
        append(&event("escalate"), sink.as_ref(), Encoding::Ascii).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("\"decision\":\"escalate\""));
    }

    #[test]
    fn test_create_sink_rejects_bad_level() {
        let config = OutputConfig {
            kind: OutputKind::Tracing,
            level: "chatty".to_string(),
            ..Default::default()
        };
        assert!(create_sink(&config).is_err());
    }
}
