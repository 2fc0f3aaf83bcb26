//! Overall verdict assembly: status, signal, coverage, and actions.

#![allow(missing_docs)]

use std::fmt;

use serde::Serialize;

use crate::core::stage::{GrowthStageKey, LedgerStatus, PerStage};
use crate::engine::evaluation::StageEvaluation;

/// Scale/hold/kill recommendation derived from the overall status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailSignal {
    Scale,
    Hold,
    Kill,
}

impl GuardrailSignal {
    /// Maps an overall status to its signal.
    #[must_use]
    pub const fn from_status(status: LedgerStatus) -> Self {
        match status {
            LedgerStatus::Green => Self::Scale,
            LedgerStatus::Red => Self::Kill,
            LedgerStatus::NotTracked | LedgerStatus::InsufficientData | LedgerStatus::Yellow => {
                Self::Hold
            }
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scale => "scale",
            Self::Hold => "hold",
            Self::Kill => "kill",
        }
    }
}

impl fmt::Display for GuardrailSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed remediation advice for a stage in the red.
#[must_use]
pub const fn remediation_for(stage: GrowthStageKey) -> &'static str {
    match stage {
        GrowthStageKey::Acquisition => {
            "stop cold acquisition expansion and audit channel spend against blended CAC"
        }
        GrowthStageKey::Activation => {
            "pause funnel experiments and clear landing and checkout conversion blockers"
        }
        GrowthStageKey::Revenue => {
            "freeze discount campaigns and review pricing and basket composition"
        }
        GrowthStageKey::Retention => {
            "investigate return drivers and tighten quality and sizing guidance"
        }
        GrowthStageKey::Referral => {
            "rework referral incentives and review the invite flow"
        }
    }
}

/// Full evaluation output for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardrailVerdict {
    pub overall_status: LedgerStatus,
    pub signal: GuardrailSignal,
    /// Fraction of all five stages with a decision-valid status.
    pub overall_coverage: f64,
    /// Fraction of blocking stages with a decision-valid status; `1.0` when
    /// nothing blocks.
    pub blocking_confidence: f64,
    /// One remediation string per red stage, in funnel order.
    pub actions: Vec<String>,
    pub stages: PerStage<StageEvaluation>,
}

impl GuardrailVerdict {
    /// Folds per-stage evaluations into the overall verdict.
    ///
    /// Overall status looks only at blocking stages: red wins, anything
    /// non-green demotes to yellow, otherwise green. Non-blocking stages are
    /// still reported and still contribute actions when red.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_stages(stages: PerStage<StageEvaluation>) -> Self {
        let mut any_blocking_red = false;
        let mut any_blocking_nongreen = false;
        let mut decision_valid_total = 0_usize;
        let mut blocking_total = 0_usize;
        let mut blocking_valid = 0_usize;
        let mut actions = Vec::new();

        for (stage, evaluation) in stages.iter() {
            if evaluation.status.is_decision_valid() {
                decision_valid_total += 1;
            }

            if evaluation.blocking {
                blocking_total += 1;
                if evaluation.status.is_decision_valid() {
                    blocking_valid += 1;
                }
                if evaluation.status == LedgerStatus::Red {
                    any_blocking_red = true;
                }
                if evaluation.status != LedgerStatus::Green {
                    any_blocking_nongreen = true;
                }
            }

            if evaluation.status == LedgerStatus::Red {
                actions.push(remediation_for(stage).to_string());
            }
        }

        let overall_status = if any_blocking_red {
            LedgerStatus::Red
        } else if any_blocking_nongreen {
            LedgerStatus::Yellow
        } else {
            LedgerStatus::Green
        };

        let stage_count = GrowthStageKey::ALL.len() as f64;
        let blocking_confidence = if blocking_total == 0 {
            1.0
        } else {
            blocking_valid as f64 / blocking_total as f64
        };

        Self {
            overall_status,
            signal: GuardrailSignal::from_status(overall_status),
            overall_coverage: decision_valid_total as f64 / stage_count,
            blocking_confidence,
            actions,
            stages,
        }
    }

    /// One-line rendering for logs.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "overall={} signal={} coverage={:.2} confidence={:.2} actions={}",
            self.overall_status,
            self.signal,
            self.overall_coverage,
            self.blocking_confidence,
            self.actions.len()
        )
    }
}
