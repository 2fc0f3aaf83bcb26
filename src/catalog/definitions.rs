//! Metric and threshold definitions for the five growth stages.
//!
//! The built-in catalog carries the calibrated v1 constants. Authoring tools
//! may supply their own catalog as long as it passes
//! [`validate_catalog`](crate::catalog::validate::validate_catalog).

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::core::stage::{BlockingMode, GrowthStageKey, PerStage, StagePolicy};

// ──────────────────────────── metric vocabulary ────────────────────────────

/// Unit of a metric value. Money is carried in euro minor units and rates in
/// basis points so every metric stays an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    Count,
    EurCents,
    Bps,
}

impl MetricUnit {
    /// Metric key suffix this unit demands, if any.
    #[must_use]
    pub const fn required_suffix(self) -> Option<&'static str> {
        match self {
            Self::Count => None,
            Self::EurCents => Some("_eur_cents"),
            Self::Bps => Some("_bps"),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::EurCents => "eur_cents",
            Self::Bps => "bps",
        }
    }
}

/// Whether a metric is reported directly or computed from other metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Primitive,
    Derived,
}

/// One metric a stage tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub key: String,
    pub label: String,
    pub unit: MetricUnit,
    pub kind: MetricKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_metrics: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denominator_metric: Option<String>,
}

// ──────────────────────────── threshold rules ────────────────────────────

/// Which side of the cutoffs is healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdDirection {
    Higher,
    Lower,
}

impl ThresholdDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Higher => "higher",
            Self::Lower => "lower",
        }
    }
}

/// Directional guardrail cutoffs for one metric.
///
/// For `direction=higher` the invariant is `green_threshold >= red_threshold`;
/// for `direction=lower` it flips. A positive `validity_min_denominator`
/// gates the verdict on `denominator_metric` reaching that sample size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub metric: String,
    pub unit: MetricUnit,
    pub direction: ThresholdDirection,
    pub green_threshold: i64,
    pub red_threshold: i64,
    pub validity_min_denominator: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denominator_metric: Option<String>,
}

// ──────────────────────────── stage definitions ────────────────────────────

/// Full definition of one stage: metrics tracked plus guardrail thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub key: GrowthStageKey,
    pub label: String,
    pub stage_policy: StagePolicy,
    pub metrics: Vec<MetricDefinition>,
    pub thresholds: Vec<ThresholdRule>,
}

/// Catalog covering exactly the five funnel stages.
pub type GrowthCatalog = PerStage<StageDefinition>;

/// Fixed blocking policy per stage.
///
/// Acquisition, activation, and revenue gate spend unconditionally; retention
/// gates once its data is valid; referral stays advisory in v1.
#[must_use]
pub fn default_stage_policies() -> PerStage<StagePolicy> {
    PerStage {
        acquisition: StagePolicy::new(BlockingMode::Always),
        activation: StagePolicy::new(BlockingMode::Always),
        revenue: StagePolicy::new(BlockingMode::Always),
        retention: StagePolicy::new(BlockingMode::AfterValid),
        referral: StagePolicy::new(BlockingMode::Never),
    }
}

fn primitive(key: &str, label: &str, unit: MetricUnit) -> MetricDefinition {
    MetricDefinition {
        key: key.to_string(),
        label: label.to_string(),
        unit,
        kind: MetricKind::Primitive,
        formula: None,
        required_metrics: None,
        denominator_metric: None,
    }
}

fn derived(
    key: &str,
    label: &str,
    unit: MetricUnit,
    formula: &str,
    required_metrics: &[&str],
    denominator_metric: &str,
) -> MetricDefinition {
    MetricDefinition {
        key: key.to_string(),
        label: label.to_string(),
        unit,
        kind: MetricKind::Derived,
        formula: Some(formula.to_string()),
        required_metrics: Some(required_metrics.iter().map(ToString::to_string).collect()),
        denominator_metric: Some(denominator_metric.to_string()),
    }
}

fn rule(
    metric: &str,
    unit: MetricUnit,
    direction: ThresholdDirection,
    green_threshold: i64,
    red_threshold: i64,
    validity_min_denominator: i64,
    denominator_metric: &str,
) -> ThresholdRule {
    ThresholdRule {
        metric: metric.to_string(),
        unit,
        direction,
        green_threshold,
        red_threshold,
        validity_min_denominator,
        denominator_metric: Some(denominator_metric.to_string()),
    }
}

/// The calibrated v1 catalog.
#[must_use]
pub fn builtin_catalog() -> GrowthCatalog {
    let policies = default_stage_policies();
    PerStage {
        acquisition: StageDefinition {
            key: GrowthStageKey::Acquisition,
            label: "Acquisition".to_string(),
            stage_policy: policies.acquisition,
            metrics: vec![
                primitive("spend_eur_cents", "Spend", MetricUnit::EurCents),
                primitive("new_customers_count", "New customers", MetricUnit::Count),
                derived(
                    "blended_cac_eur_cents",
                    "Blended CAC",
                    MetricUnit::EurCents,
                    "spend_eur_cents / new_customers_count",
                    &["spend_eur_cents", "new_customers_count"],
                    "new_customers_count",
                ),
            ],
            thresholds: vec![rule(
                "blended_cac_eur_cents",
                MetricUnit::EurCents,
                ThresholdDirection::Lower,
                1300,
                1500,
                1,
                "new_customers_count",
            )],
        },
        activation: StageDefinition {
            key: GrowthStageKey::Activation,
            label: "Activation".to_string(),
            stage_policy: policies.activation,
            metrics: vec![
                primitive("sessions_count", "Sessions", MetricUnit::Count),
                primitive("orders_count", "Orders", MetricUnit::Count),
                derived(
                    "sitewide_cvr_bps",
                    "Sitewide CVR",
                    MetricUnit::Bps,
                    "orders_count * 10000 / sessions_count",
                    &["orders_count", "sessions_count"],
                    "sessions_count",
                ),
            ],
            thresholds: vec![rule(
                "sitewide_cvr_bps",
                MetricUnit::Bps,
                ThresholdDirection::Higher,
                140,
                90,
                500,
                "sessions_count",
            )],
        },
        revenue: StageDefinition {
            key: GrowthStageKey::Revenue,
            label: "Revenue".to_string(),
            stage_policy: policies.revenue,
            metrics: vec![
                primitive("gross_revenue_eur_cents", "Gross revenue", MetricUnit::EurCents),
                primitive("orders_count", "Orders", MetricUnit::Count),
                derived(
                    "aov_eur_cents",
                    "AOV",
                    MetricUnit::EurCents,
                    "gross_revenue_eur_cents / orders_count",
                    &["gross_revenue_eur_cents", "orders_count"],
                    "orders_count",
                ),
            ],
            thresholds: vec![rule(
                "aov_eur_cents",
                MetricUnit::EurCents,
                ThresholdDirection::Higher,
                3300,
                3100,
                10,
                "orders_count",
            )],
        },
        retention: StageDefinition {
            key: GrowthStageKey::Retention,
            label: "Retention".to_string(),
            stage_policy: policies.retention,
            metrics: vec![
                primitive("orders_shipped_count", "Orders shipped", MetricUnit::Count),
                primitive("returned_orders_count", "Returned orders", MetricUnit::Count),
                derived(
                    "return_rate_30d_bps",
                    "Return rate",
                    MetricUnit::Bps,
                    "returned_orders_count * 10000 / orders_shipped_count",
                    &["returned_orders_count", "orders_shipped_count"],
                    "orders_shipped_count",
                ),
            ],
            thresholds: vec![rule(
                "return_rate_30d_bps",
                MetricUnit::Bps,
                ThresholdDirection::Lower,
                700,
                800,
                25,
                "orders_shipped_count",
            )],
        },
        referral: StageDefinition {
            key: GrowthStageKey::Referral,
            label: "Referral".to_string(),
            stage_policy: policies.referral,
            metrics: vec![
                primitive("referral_sessions_count", "Referral sessions", MetricUnit::Count),
                primitive("referral_orders_count", "Referral orders", MetricUnit::Count),
                derived(
                    "referral_conversion_rate_bps",
                    "Referral conversion",
                    MetricUnit::Bps,
                    "referral_orders_count * 10000 / referral_sessions_count",
                    &["referral_orders_count", "referral_sessions_count"],
                    "referral_sessions_count",
                ),
            ],
            thresholds: vec![rule(
                "referral_conversion_rate_bps",
                MetricUnit::Bps,
                ThresholdDirection::Higher,
                120,
                50,
                100,
                "referral_sessions_count",
            )],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_stage_keys_match_their_slots() {
        let catalog = builtin_catalog();
        for (stage, definition) in catalog.iter() {
            assert_eq!(definition.key, stage);
            assert!(!definition.label.is_empty());
        }
    }

    #[test]
    fn builtin_policies_are_the_fixed_defaults() {
        let catalog = builtin_catalog();
        assert_eq!(
            catalog.acquisition.stage_policy.blocking_mode,
            BlockingMode::Always
        );
        assert_eq!(
            catalog.revenue.stage_policy.blocking_mode,
            BlockingMode::Always
        );
        assert_eq!(
            catalog.retention.stage_policy.blocking_mode,
            BlockingMode::AfterValid
        );
        assert_eq!(
            catalog.referral.stage_policy.blocking_mode,
            BlockingMode::Never
        );
    }

    #[test]
    fn builtin_stages_declare_at_least_two_metrics_and_one_threshold() {
        let catalog = builtin_catalog();
        for (stage, definition) in catalog.iter() {
            assert!(definition.metrics.len() >= 2, "{stage} metrics");
            assert!(!definition.thresholds.is_empty(), "{stage} thresholds");
        }
    }

    #[test]
    fn builtin_acquisition_threshold_constants() {
        let catalog = builtin_catalog();
        let cac = &catalog.acquisition.thresholds[0];
        assert_eq!(cac.metric, "blended_cac_eur_cents");
        assert_eq!(cac.direction, ThresholdDirection::Lower);
        assert_eq!(cac.green_threshold, 1300);
        assert_eq!(cac.red_threshold, 1500);
        assert_eq!(cac.validity_min_denominator, 1);
        assert_eq!(
            cac.denominator_metric.as_deref(),
            Some("new_customers_count")
        );
    }

    #[test]
    fn builtin_referral_threshold_constants() {
        let catalog = builtin_catalog();
        let conversion = &catalog.referral.thresholds[0];
        assert_eq!(conversion.direction, ThresholdDirection::Higher);
        assert_eq!(conversion.green_threshold, 120);
        assert_eq!(conversion.red_threshold, 50);
        assert_eq!(conversion.validity_min_denominator, 100);
    }

    #[test]
    fn unit_suffix_requirements() {
        assert_eq!(MetricUnit::Count.required_suffix(), None);
        assert_eq!(MetricUnit::EurCents.required_suffix(), Some("_eur_cents"));
        assert_eq!(MetricUnit::Bps.required_suffix(), Some("_bps"));
    }

    #[test]
    fn direction_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ThresholdDirection::Higher).unwrap(),
            "\"higher\""
        );
        assert_eq!(
            serde_json::to_string(&ThresholdDirection::Lower).unwrap(),
            "\"lower\""
        );
    }

    #[test]
    fn threshold_rule_serde_omits_absent_denominator() {
        let bare = ThresholdRule {
            metric: "orders_count".to_string(),
            unit: MetricUnit::Count,
            direction: ThresholdDirection::Higher,
            green_threshold: 10,
            red_threshold: 2,
            validity_min_denominator: 0,
            denominator_metric: None,
        };
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("denominator_metric").is_none());

        let back: ThresholdRule = serde_json::from_value(json).unwrap();
        assert_eq!(back, bare);
    }

    #[test]
    fn primitive_metric_serde_omits_derived_fields() {
        let catalog = builtin_catalog();
        let spend = &catalog.acquisition.metrics[0];
        let json = serde_json::to_value(spend).unwrap();
        assert!(json.get("formula").is_none());
        assert!(json.get("required_metrics").is_none());
        assert_eq!(json["kind"], "primitive");
    }
}
