//! Append-only on-disk event log.
//!
//! Two partitions, `access.json` and `error.json`, each a JSON array of
//! `{timestamp, message}` entries. Every append is a locked
//! read-modify-write of the whole array; once a partition grows past the
//! size ceiling it is renamed to `<name>.json.old` and restarted with a
//! single truncation marker.
//!
//! Appends run on tokio's blocking pool so the file rewrite never holds a
//! runtime worker. Logging is best effort: failures are reported through
//! `tracing` and never reach the caller.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::config::EventLogConfig;

/// Message written as the only entry of a freshly rotated partition.
pub const TRUNCATION_MARKER: &str = "Log truncated due to size limit";

/// Partition an entry is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Access,
    Error,
}

impl LogKind {
    pub fn file_name(self) -> &'static str {
        match self {
            LogKind::Access => "access.json",
            LogKind::Error => "error.json",
        }
    }
}

/// One log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
}

impl LogEntry {
    fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            message: message.into(),
        }
    }
}

/// Shared, lock-guarded writer for both partitions. Construct once at
/// startup and pass around in an `Arc`.
#[derive(Debug)]
pub struct EventLog {
    partitions: Arc<Partitions>,
    enabled: bool,
}

/// State moved onto the blocking pool for each append.
#[derive(Debug)]
struct Partitions {
    directory: PathBuf,
    max_bytes: u64,
    access: Mutex<()>,
    error: Mutex<()>,
}

impl EventLog {
    /// Create the log, making sure the directory exists.
    pub fn new(config: &EventLogConfig) -> Self {
        let directory = PathBuf::from(&config.directory);
        if config.enabled {
            if let Err(e) = fs::create_dir_all(&directory) {
                tracing::warn!(directory = ?directory, error = %e, "Failed to create event log directory");
            }
        }

        Self {
            partitions: Arc::new(Partitions {
                directory,
                max_bytes: config.max_bytes,
                access: Mutex::new(()),
                error: Mutex::new(()),
            }),
            enabled: config.enabled,
        }
    }

    /// A log that drops every entry.
    pub fn disabled() -> Self {
        Self::new(&EventLogConfig {
            enabled: false,
            ..EventLogConfig::default()
        })
    }

    pub async fn access(&self, message: impl Into<String>) {
        self.log(message, LogKind::Access).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(message, LogKind::Error).await;
    }

    /// Append an entry to a partition. Never fails.
    pub async fn log(&self, message: impl Into<String>, kind: LogKind) {
        if !self.enabled {
            return;
        }

        let entry = LogEntry::now(message);
        let partitions = self.partitions.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || partitions.append(kind, entry)).await {
            tracing::warn!(partition = kind.file_name(), error = %e, "Event log append task failed");
        }
    }

    /// Current entries of a partition. Missing or unreadable partitions read
    /// as empty.
    pub fn entries(&self, kind: LogKind) -> Vec<LogEntry> {
        let _guard = self.partitions.lock(kind);
        read_entries(&self.path(kind)).unwrap_or_default()
    }

    pub fn path(&self, kind: LogKind) -> PathBuf {
        self.partitions.path(kind)
    }
}

impl Partitions {
    fn path(&self, kind: LogKind) -> PathBuf {
        self.directory.join(kind.file_name())
    }

    fn lock(&self, kind: LogKind) -> MutexGuard<'_, ()> {
        let mutex = match kind {
            LogKind::Access => &self.access,
            LogKind::Error => &self.error,
        };
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Blocking append under the partition lock.
    fn append(&self, kind: LogKind, entry: LogEntry) {
        let path = self.path(kind);
        let _guard = self.lock(kind);
        if let Err(e) = self.append_locked(&path, entry) {
            tracing::warn!(path = ?path, error = %e, "Event log append failed");
        }
    }

    fn append_locked(&self, path: &Path, entry: LogEntry) -> io::Result<()> {
        let mut entries = match read_entries(path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!(path = ?path, error = %e, "Event log partition unreadable, starting over");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        entries.push(entry);
        write_entries(path, &entries)?;

        if fs::metadata(path)?.len() > self.max_bytes {
            self.rotate_locked(path)?;
        }
        Ok(())
    }

    fn rotate_locked(&self, path: &Path) -> io::Result<()> {
        let mut backup = path.as_os_str().to_owned();
        backup.push(".old");
        fs::rename(path, &backup)?;
        write_entries(path, &[LogEntry::now(TRUNCATION_MARKER)])?;
        tracing::info!(path = ?path, "Event log partition rotated");
        Ok(())
    }
}

fn read_entries(path: &Path) -> io::Result<Vec<LogEntry>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn write_entries(path: &Path, entries: &[LogEntry]) -> io::Result<()> {
    let data = serde_json::to_vec_pretty(entries)?;
    fs::write(path, data)
}
