//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use growth_ledger::prelude::*;
//! ```

// Core
pub use crate::core::config::GrowthConfig;
pub use crate::core::errors::{LedgerError, Result};
pub use crate::core::stage::{BlockingMode, GrowthStageKey, LedgerStatus, PerStage, StagePolicy};

// Catalog
pub use crate::catalog::definitions::{
    GrowthCatalog, MetricDefinition, MetricUnit, StageDefinition, ThresholdDirection,
    ThresholdRule, builtin_catalog,
};
pub use crate::catalog::threshold_set::{
    ThresholdSet, ThresholdStages, build_threshold_set, threshold_set_from_catalog,
};
pub use crate::catalog::validate::validate_catalog;

// Engine
pub use crate::engine::evaluation::{GuardrailEngine, StageEvaluation, StageMetrics};
pub use crate::engine::verdict::{GuardrailSignal, GuardrailVerdict};

// Ledger
pub use crate::ledger::audit::{AuditEntry, AuditEvent, AuditLog};
pub use crate::ledger::schema::{GrowthLedger, LedgerPeriod, StageState};
pub use crate::ledger::store::{GrowthLedgerStore, LedgerFileOps, StdFileOps, UpdateOutcome};
