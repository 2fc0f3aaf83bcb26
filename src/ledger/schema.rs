//! Persisted ledger document: one JSON file per business.

#![allow(missing_docs)]

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::threshold_set::{ThresholdSet, is_threshold_set_hash, is_threshold_set_id};
use crate::core::errors::{LedgerError, Result};
use crate::core::stage::{LedgerStatus, PerStage, StagePolicy};
use crate::core::time::{is_calendar_date, is_rfc3339};
use crate::engine::evaluation::{StageEvaluation, StageMetrics};
use crate::engine::verdict::GuardrailVerdict;

/// Current on-disk document version. A forward-compatibility marker, not
/// currently branched on.
pub const SCHEMA_VERSION: u32 = 1;

/// Reporting period an evaluation covers. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPeriod {
    pub period_id: String,
    pub start_date: String,
    pub end_date: String,
    pub forecast_id: String,
}

/// Post-evaluation state of one stage as persisted in the ledger.
///
/// Whether the stage blocked the verdict is recomputable from status and
/// policy, so it is not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageState {
    pub status: LedgerStatus,
    pub policy: StagePolicy,
    pub metrics: StageMetrics,
    pub reasons: Vec<String>,
}

impl From<&StageEvaluation> for StageState {
    fn from(evaluation: &StageEvaluation) -> Self {
        Self {
            status: evaluation.status,
            policy: evaluation.policy,
            metrics: evaluation.metrics.clone(),
            reasons: evaluation.reasons.clone(),
        }
    }
}

/// The aggregate root persisted at `<data_root>/<business>/growth-ledger.json`.
///
/// `ledger_revision` starts at 0 and moves up by exactly 1 on every
/// materially-changed write. Unknown JSON keys are ignored on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthLedger {
    pub schema_version: u32,
    pub ledger_revision: u64,
    pub business: String,
    pub period: LedgerPeriod,
    pub threshold_set_id: String,
    pub threshold_set_hash: String,
    pub threshold_locked_at: String,
    pub updated_at: String,
    pub stages: PerStage<StageState>,
}

impl GrowthLedger {
    /// Folds a verdict into a persistable document bound to one threshold set.
    #[must_use]
    pub fn assemble(
        business: impl Into<String>,
        period: LedgerPeriod,
        thresholds: &ThresholdSet,
        verdict: &GuardrailVerdict,
        ledger_revision: u64,
        threshold_locked_at: impl Into<String>,
        updated_at: impl Into<String>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            ledger_revision,
            business: business.into(),
            period,
            threshold_set_id: thresholds.threshold_set_id.clone(),
            threshold_set_hash: thresholds.threshold_set_hash.clone(),
            threshold_locked_at: threshold_locked_at.into(),
            updated_at: updated_at.into(),
            stages: verdict.stages.map(|_, evaluation| StageState::from(evaluation)),
        }
    }

    /// Shape and invariant problems; empty means valid.
    #[must_use]
    pub fn validation_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.schema_version != SCHEMA_VERSION {
            issues.push(format!(
                "schema_version must be {SCHEMA_VERSION}, got {}",
                self.schema_version
            ));
        }
        if self.business.is_empty() {
            issues.push("business must not be empty".to_string());
        }
        if self.period.period_id.is_empty() {
            issues.push("period_id must not be empty".to_string());
        }
        if !is_calendar_date(&self.period.start_date) {
            issues.push(format!(
                "start_date must be a YYYY-MM-DD calendar date, got {:?}",
                self.period.start_date
            ));
        }
        if !is_calendar_date(&self.period.end_date) {
            issues.push(format!(
                "end_date must be a YYYY-MM-DD calendar date, got {:?}",
                self.period.end_date
            ));
        }
        if self.period.forecast_id.is_empty() {
            issues.push("forecast_id must not be empty".to_string());
        }
        if !is_threshold_set_id(&self.threshold_set_id) {
            issues.push(format!(
                "threshold_set_id must match gts_<12 hex chars>, got {:?}",
                self.threshold_set_id
            ));
        }
        if !is_threshold_set_hash(&self.threshold_set_hash) {
            issues.push(format!(
                "threshold_set_hash must match sha256:<64 hex chars>, got {:?}",
                self.threshold_set_hash
            ));
        }
        if !is_rfc3339(&self.threshold_locked_at) {
            issues.push(format!(
                "threshold_locked_at must be an RFC 3339 timestamp, got {:?}",
                self.threshold_locked_at
            ));
        }
        if !is_rfc3339(&self.updated_at) {
            issues.push(format!(
                "updated_at must be an RFC 3339 timestamp, got {:?}",
                self.updated_at
            ));
        }

        issues
    }

    /// Validates a document as read from `path`.
    pub fn validate(&self, path: &Path) -> Result<()> {
        let issues = self.validation_issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::SchemaViolation {
                path: path.to_path_buf(),
                details: issues.join("; "),
            })
        }
    }
}
