//! Logging pipeline for the bootstrap sequence.
//!
//! Console output is written synchronously so that announcements appear
//! before the output of the hub CLI they introduce. Disk persistence runs on
//! a background thread fed by an unbounded channel.
//!
//! # Architecture
//!
//! ```text
//! log::info!() / log_parsed!()
//!     |
//! [LogCollector] --(stdout / stderr, immediate)
//!     | (crossbeam channel)
//!     v
//! [DiskPersister thread]
//!     |                      |
//! <log_dir>/full/       <log_dir>/parsed/
//! bootstrap_<ts>.log    bootstrap_<ts>.log   (size-rotated, .1 .. .N)
//! ```
//!
//! exec() discards the persister thread along with everything else in the
//! process, so [`LogCollector::wait_for_empty`] must run before handoff.

use chrono::Local;
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Target used for high-level milestones; such lines also go to the parsed log.
pub const PARSED_TARGET: &str = "parsed";

/// Log a milestone line (info level, `parsed` target).
#[macro_export]
macro_rules! log_parsed {
    ($($arg:tt)*) => {
        $crate::log::info!(target: $crate::log_collector::PARSED_TARGET, $($arg)*)
    };
}

/// Internal log line or special marker
enum LogMessage {
    Line(LogLine),
    /// Flush marker with channel sender to signal completion
    Flush(std::sync::mpsc::Sender<()>),
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    /// "full" or "parsed"
    pub log_type: String,
    pub level: Level,
    pub timestamp: String,
}

impl LogLine {
    pub fn new(level: Level, message: String) -> Self {
        LogLine {
            message,
            log_type: "full".to_string(),
            level,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        }
    }

    pub fn parsed(level: Level, message: String) -> Self {
        LogLine {
            log_type: "parsed".to_string(),
            ..LogLine::new(level, message)
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.log_type == "parsed"
    }

    /// `[timestamp] [LEVEL] message\n`
    fn formatted(&self) -> String {
        format!("[{}] [{}] {}\n", self.timestamp, self.level, self.message)
    }
}

/// Size-based rotation settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Roll over before a write would take the file past this size
    pub max_bytes: u64,
    /// Rolled files kept (`.1` newest); 0 truncates instead
    pub backups: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        RotationPolicy {
            max_bytes: crate::config::DEFAULT_LOG_MAX_BYTES,
            backups: crate::config::DEFAULT_LOG_BACKUPS,
        }
    }
}

/// `path` with `.n` appended (`bootstrap_x.log.2`).
pub fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}", n));
    PathBuf::from(name)
}

/// Append-only file that rolls over by size.
struct RotatingFile {
    path: PathBuf,
    file: File,
    written: u64,
    policy: RotationPolicy,
}

impl RotatingFile {
    fn open(path: PathBuf, policy: RotationPolicy) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(RotatingFile {
            path,
            file,
            written,
            policy,
        })
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let len = line.len() as u64;
        if self.written > 0 && self.written + len > self.policy.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(line.as_bytes())?;
        self.written += len;
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.policy.backups > 0 {
            for n in (1..self.policy.backups).rev() {
                let older = backup_path(&self.path, n);
                if older.exists() {
                    fs::rename(&older, backup_path(&self.path, n + 1))?;
                }
            }
            fs::rename(&self.path, backup_path(&self.path, 1))?;
        }

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Unified logger: console echo plus disk persistence
#[derive(Clone)]
pub struct LogCollector {
    /// Channel sender for the persister thread
    tx: Sender<LogMessage>,
    /// Full-log file of this session, when persisting to disk
    session_log: Option<PathBuf>,
    level: LevelFilter,
    console: bool,
}

impl LogCollector {
    /// Create a collector persisting to `<log_dir>/full` and `<log_dir>/parsed`.
    ///
    /// Both session files are created before this returns, so a bad log
    /// directory is reported here rather than lost on the background thread.
    pub fn new(log_dir: &Path, level: LevelFilter, rotation: RotationPolicy) -> Result<Self, String> {
        let full_log_dir = log_dir.join("full");
        let parsed_log_dir = log_dir.join("parsed");
        fs::create_dir_all(&full_log_dir)
            .map_err(|e| format!("Failed to create full log dir: {}", e))?;
        fs::create_dir_all(&parsed_log_dir)
            .map_err(|e| format!("Failed to create parsed log dir: {}", e))?;

        let file_name = format!("bootstrap_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
        let full_path = full_log_dir.join(&file_name);
        let full = RotatingFile::open(full_path.clone(), rotation)
            .map_err(|e| format!("Failed to open {}: {}", full_path.display(), e))?;
        let parsed_path = parsed_log_dir.join(&file_name);
        let parsed = RotatingFile::open(parsed_path.clone(), rotation)
            .map_err(|e| format!("Failed to open {}: {}", parsed_path.display(), e))?;

        let (tx, rx) = unbounded::<LogMessage>();
        std::thread::spawn(move || persist(rx, Some(full), Some(parsed)));

        Ok(LogCollector {
            tx,
            session_log: Some(full_path),
            level,
            console: true,
        })
    }

    /// Collector that only writes to the console.
    pub fn console_only(level: LevelFilter) -> Self {
        let (tx, rx) = unbounded::<LogMessage>();
        std::thread::spawn(move || persist(rx, None, None));

        LogCollector {
            tx,
            session_log: None,
            level,
            console: true,
        }
    }

    /// Disable console echo (disk only).
    pub fn without_console(mut self) -> Self {
        self.console = false;
        self
    }

    /// Register as the global `log` backend.
    pub fn install(&self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self.clone()))?;
        log::set_max_level(self.level);
        Ok(())
    }

    pub fn session_log_path(&self) -> Option<&Path> {
        self.session_log.as_deref()
    }

    /// Send a log line (non-blocking)
    pub fn log_line(&self, line: LogLine) {
        if self.console {
            echo(&line);
        }
        let _ = self.tx.send(LogMessage::Line(line));
    }

    pub fn log_str(&self, message: impl Into<String>) {
        self.log_line(LogLine::new(Level::Info, message.into()));
    }

    pub fn log_parsed(&self, message: impl Into<String>) {
        self.log_line(LogLine::parsed(Level::Info, message.into()));
    }

    /// Block until every line sent before this call is on disk.
    pub fn wait_for_empty(&self) -> Result<(), String> {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        self.tx
            .send(LogMessage::Flush(tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;
        rx.recv()
            .map_err(|e| format!("Flush signal interrupted: {}", e))
    }
}

/// Wires `log::info!()` and friends into the collector.
impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = record.args().to_string();
        if record.target() == PARSED_TARGET {
            self.log_line(LogLine::parsed(record.level(), message));
        } else {
            self.log_line(LogLine::new(record.level(), message));
        }
    }

    fn flush(&self) {
        let _ = self.wait_for_empty();
    }
}

/// Console write. A closed or broken stdout/stderr drops the line.
fn echo(line: &LogLine) {
    let _ = match line.level {
        Level::Error | Level::Warn => write_console(io::stderr().lock(), line),
        _ => write_console(io::stdout().lock(), line),
    };
}

fn write_console<W: Write>(mut out: W, line: &LogLine) -> io::Result<()> {
    writeln!(out, "[{}] {}", line.level, line.message)?;
    out.flush()
}

/// Disk persister loop. Write errors are reported once on stderr and the
/// affected stream is dropped; logging never aborts the bootstrap.
fn persist(rx: Receiver<LogMessage>, mut full: Option<RotatingFile>, mut parsed: Option<RotatingFile>) {
    while let Ok(msg) = rx.recv() {
        match msg {
            LogMessage::Line(line) => {
                let formatted = line.formatted();
                write_or_drop(&mut full, &formatted);
                if line.is_parsed() {
                    write_or_drop(&mut parsed, &formatted);
                }
            }
            LogMessage::Flush(done) => {
                for file in [&mut full, &mut parsed].into_iter().flatten() {
                    let _ = file.flush();
                }
                let _ = done.send(());
            }
        }
    }
}

fn write_or_drop(target: &mut Option<RotatingFile>, line: &str) {
    if let Some(file) = target {
        if let Err(e) = file.write_line(line) {
            let _ = writeln!(
                io::stderr().lock(),
                "[Log] WARNING: disabling {} after write failure: {}",
                file.path.display(),
                e
            );
            *target = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_collector_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let collector =
            LogCollector::new(temp_dir.path(), LevelFilter::Info, RotationPolicy::default()).unwrap();

        assert!(temp_dir.path().join("full").is_dir());
        assert!(temp_dir.path().join("parsed").is_dir());
        assert!(collector.session_log_path().unwrap().exists());
    }

    #[test]
    fn test_rotation_keeps_bounded_backups() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bootstrap.log");
        let policy = RotationPolicy {
            max_bytes: 16,
            backups: 2,
        };
        let mut file = RotatingFile::open(path.clone(), policy).unwrap();

        for i in 0..5 {
            file.write_line(&format!("line number {}\n", i)).unwrap();
        }
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "line number 4\n");
        assert_eq!(
            fs::read_to_string(backup_path(&path, 1)).unwrap(),
            "line number 3\n"
        );
        assert_eq!(
            fs::read_to_string(backup_path(&path, 2)).unwrap(),
            "line number 2\n"
        );
        assert!(!backup_path(&path, 3).exists());
    }

    #[test]
    fn test_rotation_without_backups_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bootstrap.log");
        let policy = RotationPolicy {
            max_bytes: 8,
            backups: 0,
        };
        let mut file = RotatingFile::open(path.clone(), policy).unwrap();
        file.write_line("first!!\n").unwrap();
        file.write_line("second\n").unwrap();
        file.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
        assert!(!backup_path(&path, 1).exists());
    }

    #[test]
    fn test_oversized_line_still_written() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bootstrap.log");
        let policy = RotationPolicy {
            max_bytes: 4,
            backups: 1,
        };
        let mut file = RotatingFile::open(path.clone(), policy).unwrap();
        file.write_line("much longer than four bytes\n").unwrap();
        file.flush().unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "much longer than four bytes\n"
        );
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn test_console_write_reports_broken_pipe() {
        let line = LogLine::new(Level::Info, "Downloading a/b to ./b".to_string());
        let err = write_console(ClosedPipe, &line).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let mut buf = Vec::new();
        write_console(&mut buf, &line).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "[INFO] Downloading a/b to ./b\n");
    }

    #[test]
    fn test_level_filter() {
        let collector = LogCollector::console_only(LevelFilter::Warn);
        let info = Metadata::builder().level(Level::Info).build();
        let error = Metadata::builder().level(Level::Error).build();
        assert!(!collector.enabled(&info));
        assert!(collector.enabled(&error));
    }

    #[test]
    fn test_console_only_flush_returns() {
        let collector = LogCollector::console_only(LevelFilter::Info).without_console();
        collector.log_str("nothing persisted");
        assert!(collector.wait_for_empty().is_ok());
        assert!(collector.session_log_path().is_none());
    }
}
