//! Rolling File Logger
//!
//! Installs a `tracing` subscriber that appends to `<dir>/<app>.log`.
//! The file is rotated to `<app>.log.1` once it grows past a size limit, and
//! the most recent lines are kept in a circular buffer so the host can show
//! them without touching the disk. `log` records are captured through the
//! `tracing-log` bridge that `tracing-subscriber` installs on init.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

/// Size after which the active file is rotated.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Number of lines kept in memory.
pub const DEFAULT_BUFFER_LINES: usize = 500;

// ========================
// Errors
// ========================

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Log file error: {0}")]
    Io(#[from] io::Error),

    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(String),
}

// ========================
// Rolling file
// ========================

/// Limits for one rolling log.
#[derive(Debug, Clone, Copy)]
pub struct RollingOptions {
    pub max_file_bytes: u64,
    pub buffer_lines: usize,
}

impl Default for RollingOptions {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            buffer_lines: DEFAULT_BUFFER_LINES,
        }
    }
}

struct RollingFile {
    path: PathBuf,
    file: File,
    written: u64,
    options: RollingOptions,
    recent: VecDeque<String>,
    // Bytes of a line whose newline has not arrived yet
    partial: String,
}

impl RollingFile {
    fn open(path: PathBuf, options: RollingOptions) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            file,
            written,
            options,
            recent: VecDeque::with_capacity(options.buffer_lines),
            partial: String::new(),
        })
    }

    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.written > 0 && self.written + buf.len() as u64 > self.options.max_file_bytes {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.written += buf.len() as u64;
        self.remember(buf);
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let backup = backup_path(&self.path);
        if backup.exists() {
            fs::remove_file(&backup)?;
        }
        fs::rename(&self.path, &backup)?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.written = 0;
        Ok(())
    }

    fn remember(&mut self, buf: &[u8]) {
        if self.options.buffer_lines == 0 {
            return;
        }
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            if self.recent.len() == self.options.buffer_lines {
                self.recent.pop_front();
            }
            self.recent.push_back(line.trim_end().to_string());
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".1");
    PathBuf::from(name)
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "log file lock poisoned")
}

/// `io::Write` handle shared by every event the subscriber formats.
#[derive(Clone)]
pub struct RollingWriter {
    inner: Arc<Mutex<RollingFile>>,
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.inner.lock().map_err(|_| poisoned())?;
        file.append(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self.inner.lock().map_err(|_| poisoned())?;
        file.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Read access to an open rolling log.
#[derive(Clone)]
pub struct LoggerHandle {
    inner: Arc<Mutex<RollingFile>>,
    path: PathBuf,
}

impl LoggerHandle {
    /// Lines currently held in the circular buffer, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        match self.inner.lock() {
            Ok(file) => file.recent.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.path
    }

    /// A writer appending to this log.
    pub fn writer(&self) -> RollingWriter {
        RollingWriter { inner: self.inner.clone() }
    }
}

/// Open (or continue) `<dir>/<app_name>.log` without installing a subscriber.
pub fn open_log(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    options: RollingOptions,
) -> Result<LoggerHandle, LoggerError> {
    let path = log_dir.as_ref().join(format!("{}.log", app_name));
    let file = RollingFile::open(path.clone(), options)?;
    Ok(LoggerHandle {
        inner: Arc::new(Mutex::new(file)),
        path,
    })
}

// ========================
// Subscriber
// ========================

struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Build the subscriber used by [`init_logger`], writing to `handle`.
pub fn subscriber(handle: &LoggerHandle) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_writer(handle.writer())
        .with_ansi(false)
        .with_timer(LocalTime)
        .with_max_level(tracing::Level::DEBUG)
        .finish()
}

/// Install the global subscriber writing to `<log_dir>/<app_name>.log`.
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<LoggerHandle, LoggerError> {
    let handle = open_log(log_dir, app_name, RollingOptions::default())?;
    subscriber(&handle)
        .try_init()
        .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))?;
    Ok(handle)
}
