//! GL-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Top-level error type for the growth ledger subsystem.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("[GL-1001] invalid growth catalog: {details}")]
    InvalidCatalog { details: String },

    #[error("[GL-1002] invalid threshold set: {details}")]
    InvalidThresholdSet { details: String },

    #[error("[GL-1003] invalid business id: {business:?}")]
    InvalidBusinessId { business: String },

    #[error("[GL-1004] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[GL-1005] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[GL-1006] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[GL-2001] ledger schema violation at {path}: {details}")]
    SchemaViolation { path: PathBuf, details: String },

    #[error("[GL-2002] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error(
        "[GL-2101] ledger revision conflict for {business}: expected {expected}, actual {actual}"
    )]
    RevisionConflict {
        business: String,
        expected: u64,
        actual: u64,
    },

    #[error("[GL-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LedgerError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidCatalog { .. } => "GL-1001",
            Self::InvalidThresholdSet { .. } => "GL-1002",
            Self::InvalidBusinessId { .. } => "GL-1003",
            Self::ConfigParse { .. } => "GL-1004",
            Self::MissingConfig { .. } => "GL-1005",
            Self::InvalidConfig { .. } => "GL-1006",
            Self::SchemaViolation { .. } => "GL-2001",
            Self::Serialization { .. } => "GL-2002",
            Self::RevisionConflict { .. } => "GL-2101",
            Self::Io { .. } => "GL-3001",
        }
    }

    /// Whether retrying might resolve the failure.
    ///
    /// A revision conflict is retryable by re-reading the ledger and
    /// recomputing against the fresh state; validation failures are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RevisionConflict { .. } | Self::Io { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
