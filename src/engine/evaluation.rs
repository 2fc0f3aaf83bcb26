//! Guardrail evaluation over per-stage metrics.
//!
//! Evaluation is pure: thresholds and policies go in at construction, raw
//! metric readings go in per call, and a verdict comes out. Nothing here
//! touches the clock or the filesystem.

#![allow(missing_docs)]

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::definitions::{
    GrowthCatalog, ThresholdDirection, ThresholdRule, default_stage_policies,
};
use crate::catalog::threshold_set::{ThresholdSet, ThresholdStages};
use crate::core::stage::{BlockingMode, GrowthStageKey, LedgerStatus, PerStage, StagePolicy};
use crate::engine::verdict::GuardrailVerdict;

/// Raw metric readings for one stage. `None` marks a metric reported as not
/// collected; an absent key means the same thing.
pub type StageMetrics = BTreeMap<String, Option<i64>>;

/// Verdict for a single threshold rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThresholdEvaluation {
    pub metric: String,
    pub status: LedgerStatus,
    pub reason: String,
}

/// Verdict for one stage after merging its rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageEvaluation {
    pub stage: GrowthStageKey,
    pub status: LedgerStatus,
    pub policy: StagePolicy,
    pub blocking: bool,
    pub metrics: StageMetrics,
    pub reasons: Vec<String>,
}

/// Whether a stage's status may force the overall verdict.
#[must_use]
pub const fn is_stage_blocking(status: LedgerStatus, policy: StagePolicy) -> bool {
    match policy.blocking_mode {
        BlockingMode::Never => false,
        BlockingMode::AfterValid => status.is_decision_valid(),
        BlockingMode::Always => true,
    }
}

/// Evaluates one rule against one stage's metrics.
///
/// Order matters: a missing metric short-circuits to `not_tracked` before the
/// validity gate, and the validity gate short-circuits to `insufficient_data`
/// before any directional comparison.
#[must_use]
pub fn evaluate_threshold(rule: &ThresholdRule, metrics: &StageMetrics) -> ThresholdEvaluation {
    let Some(value) = metrics.get(&rule.metric).copied().flatten() else {
        return ThresholdEvaluation {
            metric: rule.metric.clone(),
            status: LedgerStatus::NotTracked,
            reason: format!("{}: metric not tracked", rule.metric),
        };
    };

    if rule.validity_min_denominator > 0 {
        let denominator_key = rule.denominator_metric.as_deref().unwrap_or("denominator");
        let denominator = rule
            .denominator_metric
            .as_ref()
            .and_then(|key| metrics.get(key).copied().flatten());

        match denominator {
            None => {
                return ThresholdEvaluation {
                    metric: rule.metric.clone(),
                    status: LedgerStatus::InsufficientData,
                    reason: format!(
                        "{}: insufficient data ({denominator_key} not tracked)",
                        rule.metric
                    ),
                };
            }
            Some(denominator_value) if denominator_value < rule.validity_min_denominator => {
                return ThresholdEvaluation {
                    metric: rule.metric.clone(),
                    status: LedgerStatus::InsufficientData,
                    reason: format!(
                        "{}: insufficient data ({denominator_key}={denominator_value}, needs >= {})",
                        rule.metric, rule.validity_min_denominator
                    ),
                };
            }
            Some(_) => {}
        }
    }

    let status = match rule.direction {
        ThresholdDirection::Higher => {
            if value >= rule.green_threshold {
                LedgerStatus::Green
            } else if value <= rule.red_threshold {
                LedgerStatus::Red
            } else {
                LedgerStatus::Yellow
            }
        }
        ThresholdDirection::Lower => {
            if value <= rule.green_threshold {
                LedgerStatus::Green
            } else if value >= rule.red_threshold {
                LedgerStatus::Red
            } else {
                LedgerStatus::Yellow
            }
        }
    };

    let (green_op, red_op) = match rule.direction {
        ThresholdDirection::Higher => (">=", "<="),
        ThresholdDirection::Lower => ("<=", ">="),
    };
    let reason = format!(
        "{}={value} ({} is better, green {green_op} {}, red {red_op} {}): {status}",
        rule.metric,
        rule.direction.as_str(),
        rule.green_threshold,
        rule.red_threshold
    );

    ThresholdEvaluation {
        metric: rule.metric.clone(),
        status,
        reason,
    }
}

/// Merges every rule of a stage: the worst status wins, reasons concatenate
/// in rule order.
#[must_use]
pub fn evaluate_stage(
    stage: GrowthStageKey,
    rules: &[ThresholdRule],
    policy: StagePolicy,
    metrics: &StageMetrics,
) -> StageEvaluation {
    let (status, reasons) = if rules.is_empty() {
        (
            LedgerStatus::NotTracked,
            vec!["no thresholds configured".to_string()],
        )
    } else {
        let mut status = LedgerStatus::Green;
        let mut reasons = Vec::with_capacity(rules.len());
        for rule in rules {
            let evaluation = evaluate_threshold(rule, metrics);
            status = status.merge(evaluation.status);
            reasons.push(evaluation.reason);
        }
        (status, reasons)
    };

    let blocking = is_stage_blocking(status, policy);
    StageEvaluation {
        stage,
        status,
        policy,
        blocking,
        metrics: metrics.clone(),
        reasons,
    }
}

// ──────────────────────────── engine ────────────────────────────

/// Evaluates raw metrics against locked thresholds and per-stage policies.
#[derive(Debug, Clone)]
pub struct GuardrailEngine {
    thresholds: ThresholdStages,
    policies: PerStage<StagePolicy>,
}

impl GuardrailEngine {
    /// Engine using the thresholds and policies a catalog declares.
    #[must_use]
    pub fn from_catalog(catalog: &GrowthCatalog) -> Self {
        Self {
            thresholds: catalog.map(|_, definition| definition.thresholds.clone()),
            policies: catalog.map(|_, definition| definition.stage_policy),
        }
    }

    /// Engine using a locked threshold set with the default stage policies.
    #[must_use]
    pub fn from_threshold_set(set: &ThresholdSet) -> Self {
        Self {
            thresholds: set.stages.clone(),
            policies: default_stage_policies(),
        }
    }

    /// Replaces the policy for one stage.
    #[must_use]
    pub fn with_policy(mut self, stage: GrowthStageKey, policy: StagePolicy) -> Self {
        *self.policies.get_mut(stage) = policy;
        self
    }

    #[must_use]
    pub const fn thresholds(&self) -> &ThresholdStages {
        &self.thresholds
    }

    #[must_use]
    pub const fn policies(&self) -> &PerStage<StagePolicy> {
        &self.policies
    }

    /// Evaluates a full period of metrics.
    ///
    /// A stage the caller has no readings for evaluates against empty
    /// metrics, which turns all of its rules `not_tracked`.
    #[must_use]
    pub fn evaluate(&self, metrics: &PerStage<StageMetrics>) -> GuardrailVerdict {
        let stages = PerStage::from_fn(|stage| {
            evaluate_stage(
                stage,
                self.thresholds.get(stage),
                *self.policies.get(stage),
                metrics.get(stage),
            )
        });
        GuardrailVerdict::from_stages(stages)
    }
}
