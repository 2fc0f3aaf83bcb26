//! Append-only JSONL audit trail for store activity.
//!
//! Each line is a self-contained JSON object. Lines are assembled in memory
//! and written with a single `write_all` so a process tailing the file never
//! observes a partial line. Persistence must never fail because logging did:
//! on write failure the sink degrades to stderr, then to silent discard.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::core::config::AuditConfig;
use crate::core::time::now_rfc3339;

/// Store activity recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    LedgerWritten,
    LedgerUnchanged,
    RevisionConflict,
    LedgerReadFailed,
}

/// A single audit line. `ts`, `event`, and `business` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// RFC 3339 UTC timestamp.
    pub ts: String,
    pub event: AuditEvent,
    pub business: String,
    /// Revision of the document as written or as found on disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_revision: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_revision: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_revision: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AuditEntry {
    /// New entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: AuditEvent, business: impl Into<String>) -> Self {
        Self {
            ts: now_rfc3339(),
            event,
            business: business.into(),
            ledger_revision: None,
            expected_revision: None,
            actual_revision: None,
            error_code: None,
            details: None,
        }
    }
}

/// Degradation state of the audit sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Normal,
    Stderr,
    Discard,
}

#[derive(Debug)]
struct AuditSink {
    path: PathBuf,
    file: Option<File>,
    state: SinkState,
}

impl AuditSink {
    fn write_line(&mut self, line: &str) {
        match self.state {
            SinkState::Normal => {
                let written = self
                    .file
                    .as_mut()
                    .is_some_and(|file| file.write_all(line.as_bytes()).is_ok());
                if !written {
                    self.degrade();
                    self.write_line(line);
                }
            }
            SinkState::Stderr => {
                let _ = write!(io::stderr(), "[GL-AUDIT] {line}");
            }
            SinkState::Discard => {}
        }
    }

    fn degrade(&mut self) {
        self.file = None;
        match self.state {
            SinkState::Normal => {
                self.state = SinkState::Stderr;
                let _ = writeln!(
                    io::stderr(),
                    "[GL-AUDIT] write to {} failed, using stderr",
                    self.path.display()
                );
            }
            SinkState::Stderr => {
                self.state = SinkState::Discard;
            }
            SinkState::Discard => {}
        }
    }
}

/// Append-only audit log with a stderr-then-discard degradation chain.
#[derive(Debug)]
pub struct AuditLog {
    inner: Mutex<AuditSink>,
}

impl AuditLog {
    /// Opens the log file for appending, creating parent directories as
    /// needed. An unwritable path degrades immediately instead of failing.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let sink = match open_append(&path) {
            Ok(file) => AuditSink {
                path,
                file: Some(file),
                state: SinkState::Normal,
            },
            Err(error) => {
                let _ = writeln!(
                    io::stderr(),
                    "[GL-AUDIT] cannot open {}: {error}, using stderr",
                    path.display()
                );
                AuditSink {
                    path,
                    file: None,
                    state: SinkState::Stderr,
                }
            }
        };
        Self {
            inner: Mutex::new(sink),
        }
    }

    /// Audit log per configuration; `None` when auditing is disabled.
    #[must_use]
    pub fn from_config(config: &AuditConfig) -> Option<Self> {
        config.enabled.then(|| Self::open(config.log_file.clone()))
    }

    /// Writes one entry as one line. Never fails; serialization problems go
    /// to stderr and the entry is dropped.
    pub fn record(&self, entry: &AuditEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(error) => {
                let _ = writeln!(io::stderr(), "[GL-AUDIT] serialize error: {error}");
                return;
            }
        };
        self.sink().write_line(&line);
    }

    /// Current degradation state.
    #[must_use]
    pub fn state(&self) -> &'static str {
        match self.sink().state {
            SinkState::Normal => "normal",
            SinkState::Stderr => "stderr",
            SinkState::Discard => "discard",
        }
    }

    fn sink(&self) -> std::sync::MutexGuard<'_, AuditSink> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Open or create the file for appending.
fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
