//! Filesystem-backed ledger store.
//!
//! One JSON document per business at `<data_root>/<business>/growth-ledger.json`.
//! Writes replace the target atomically (unique temp file, then rename), and
//! [`GrowthLedgerStore::update`] layers optimistic concurrency on top: an
//! `expected_revision` compare against the stored document, an idempotence
//! check that keeps byte-identical updates off the disk, and a revision
//! counter owned by the store rather than the caller.
//!
//! The store never retries and never locks. Two writers racing past the same
//! read both pass the revision check and the later rename wins silently;
//! callers needing strict mutual exclusion must serialize updates themselves.

#![allow(missing_docs)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::canonical::{canonical_compact, canonical_pretty};
use crate::core::config::GrowthConfig;
use crate::core::errors::{LedgerError, Result};
use crate::core::paths;
use crate::ledger::audit::{AuditEntry, AuditEvent, AuditLog};
use crate::ledger::schema::GrowthLedger;

// ──────────────────────────── file ops seam ────────────────────────────

/// Filesystem operations the store needs, injectable for fault testing.
///
/// Errors stay at the `io` level so the store can treat `NotFound` specially
/// and attach path context itself.
pub trait LedgerFileOps: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// Direct `std::fs` implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileOps;

impl LedgerFileOps for StdFileOps {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}

// ──────────────────────────── store ────────────────────────────

/// Result of an [`GrowthLedgerStore::update`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Whether a new document revision reached the disk.
    pub changed: bool,
    /// The stored document after the call: the freshly written one, or the
    /// untouched current one when nothing changed.
    pub ledger: GrowthLedger,
}

/// Per-business ledger persistence over a data root directory.
#[derive(Debug)]
pub struct GrowthLedgerStore<F = StdFileOps> {
    data_root: PathBuf,
    ops: F,
    audit: Option<AuditLog>,
}

impl GrowthLedgerStore<StdFileOps> {
    /// Store over `data_root` using the real filesystem, no audit trail.
    #[must_use]
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self::with_ops(data_root, StdFileOps)
    }

    /// Store wired from configuration, including the audit trail when
    /// enabled.
    #[must_use]
    pub fn from_config(config: &GrowthConfig) -> Self {
        Self {
            data_root: config.store.data_root.clone(),
            ops: StdFileOps,
            audit: AuditLog::from_config(&config.audit),
        }
    }
}

impl<F: LedgerFileOps> GrowthLedgerStore<F> {
    /// Store over `data_root` with injected filesystem operations.
    #[must_use]
    pub fn with_ops(data_root: impl Into<PathBuf>, ops: F) -> Self {
        Self {
            data_root: data_root.into(),
            ops,
            audit: None,
        }
    }

    /// Attaches an audit trail.
    #[must_use]
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    #[must_use]
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Deterministic document path for a business.
    pub fn ledger_path(&self, business: &str) -> Result<PathBuf> {
        paths::ledger_path(&self.data_root, business)
    }

    /// Reads the stored document. A file that does not exist yet is `None`;
    /// a file that exists but does not parse or validate is an error.
    pub fn read(&self, business: &str) -> Result<Option<GrowthLedger>> {
        let path = self.ledger_path(business)?;

        let raw = match self.ops.read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                let failure = LedgerError::io(&path, error);
                self.audit_read_failed(business, &failure);
                return Err(failure);
            }
        };

        let ledger: GrowthLedger = match serde_json::from_str(&raw) {
            Ok(ledger) => ledger,
            Err(error) => {
                let failure = LedgerError::SchemaViolation {
                    path,
                    details: error.to_string(),
                };
                self.audit_read_failed(business, &failure);
                return Err(failure);
            }
        };

        if let Err(failure) = ledger.validate(&path) {
            self.audit_read_failed(business, &failure);
            return Err(failure);
        }

        Ok(Some(ledger))
    }

    /// Writes the document unconditionally, replacing the target atomically.
    ///
    /// The document lands fully or not at all: bytes go to a uniquely named
    /// temp file in the target directory first, and only a successful rename
    /// makes them visible. This bypasses revision and idempotence handling;
    /// outside of a business's very first document, go through [`Self::update`].
    pub fn write(&self, business: &str, ledger: &GrowthLedger) -> Result<()> {
        let target = self.ledger_path(business)?;
        if let Some(parent) = target.parent() {
            self.ops
                .create_dir_all(parent)
                .map_err(|error| LedgerError::io(parent, error))?;
        }

        let payload = canonical_pretty(ledger)?;
        let temp = temp_path_for(&target);

        if let Err(error) = self.ops.write(&temp, payload.as_bytes()) {
            // Cleanup is best-effort; the original error wins.
            let _ = self.ops.remove_file(&temp);
            return Err(LedgerError::io(&temp, error));
        }
        if let Err(error) = self.ops.rename(&temp, &target) {
            let _ = self.ops.remove_file(&temp);
            return Err(LedgerError::io(&target, error));
        }

        let mut entry = AuditEntry::new(AuditEvent::LedgerWritten, business);
        entry.ledger_revision = Some(ledger.ledger_revision);
        self.audit_record(&entry);
        Ok(())
    }

    /// Read-check-compute-write cycle with optimistic concurrency.
    ///
    /// `expected_revision`, when given, must equal the stored revision (0 for
    /// a missing document) or the call fails with a revision conflict and
    /// storage stays untouched. `compute_next` sees the current document and
    /// produces the candidate; the store then discards the candidate when it
    /// is canonically equal to what is stored, and otherwise forces
    /// `ledger_revision` to current + 1 no matter what the candidate said.
    /// A candidate differing only in its revision field collapses back to
    /// unchanged after that fix-up.
    pub fn update(
        &self,
        business: &str,
        expected_revision: Option<u64>,
        compute_next: impl FnOnce(Option<&GrowthLedger>) -> GrowthLedger,
    ) -> Result<UpdateOutcome> {
        let current = self.read(business)?;

        if let Some(expected) = expected_revision {
            let actual = current.as_ref().map_or(0, |ledger| ledger.ledger_revision);
            if expected != actual {
                let mut entry = AuditEntry::new(AuditEvent::RevisionConflict, business);
                entry.expected_revision = Some(expected);
                entry.actual_revision = Some(actual);
                entry.error_code = Some("GL-2101".to_string());
                self.audit_record(&entry);
                return Err(LedgerError::RevisionConflict {
                    business: business.to_string(),
                    expected,
                    actual,
                });
            }
        }

        let mut next = compute_next(current.as_ref());

        if let Some(current) = current {
            let stored = canonical_compact(&current)?;
            if canonical_compact(&next)? == stored {
                return self.unchanged(business, current);
            }

            next.ledger_revision = current.ledger_revision + 1;

            // A candidate that differs from the stored document only in its
            // revision counter is still a vacuous update. Compare with the
            // counter normalized out so such writes are skipped too.
            let mut probe = next.clone();
            probe.ledger_revision = current.ledger_revision;
            if canonical_compact(&probe)? == stored {
                return self.unchanged(business, current);
            }
        }

        self.write(business, &next)?;
        Ok(UpdateOutcome {
            changed: true,
            ledger: next,
        })
    }

    fn unchanged(&self, business: &str, current: GrowthLedger) -> Result<UpdateOutcome> {
        let mut entry = AuditEntry::new(AuditEvent::LedgerUnchanged, business);
        entry.ledger_revision = Some(current.ledger_revision);
        self.audit_record(&entry);
        Ok(UpdateOutcome {
            changed: false,
            ledger: current,
        })
    }

    fn audit_read_failed(&self, business: &str, failure: &LedgerError) {
        let mut entry = AuditEntry::new(AuditEvent::LedgerReadFailed, business);
        entry.error_code = Some(failure.code().to_string());
        entry.details = Some(failure.to_string());
        self.audit_record(&entry);
    }

    fn audit_record(&self, entry: &AuditEntry) {
        if let Some(audit) = &self.audit {
            audit.record(entry);
        }
    }
}

/// Unique sibling path for staged bytes. Pid plus nanoseconds keeps
/// concurrent writers from clobbering each other's temp files.
fn temp_path_for(target: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    let mut name = target.as_os_str().to_owned();
    name.push(format!(".tmp-{}-{nanos}", process::id()));
    PathBuf::from(name)
}
