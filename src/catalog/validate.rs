//! Catalog validation rules.
//!
//! Issues are collected rather than short-circuited so authoring tools can
//! report every problem in one pass; [`validate_catalog`] folds them into a
//! single fatal error for callers that just need a yes/no.

use std::collections::BTreeSet;

use crate::catalog::definitions::{
    GrowthCatalog, MetricUnit, StageDefinition, ThresholdDirection, ThresholdRule,
    default_stage_policies,
};
use crate::core::errors::{LedgerError, Result};
use crate::core::stage::{GrowthStageKey, StagePolicy};

/// Every problem in `catalog`; empty means valid.
#[must_use]
pub fn catalog_issues(catalog: &GrowthCatalog) -> Vec<String> {
    let defaults = default_stage_policies();
    let mut issues = Vec::new();
    for (stage, definition) in catalog.iter() {
        check_stage(stage, definition, defaults.get(stage), &mut issues);
    }
    issues
}

/// Validates `catalog`, folding all issues into one `GL-1001` error.
pub fn validate_catalog(catalog: &GrowthCatalog) -> Result<()> {
    let issues = catalog_issues(catalog);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::InvalidCatalog {
            details: issues.join("; "),
        })
    }
}

/// Shape problems of a single threshold rule. `context` names the owning
/// stage or set for the messages.
#[must_use]
pub fn threshold_rule_issues(context: &str, rule: &ThresholdRule) -> Vec<String> {
    let mut issues = Vec::new();

    match rule.direction {
        ThresholdDirection::Higher => {
            if rule.green_threshold < rule.red_threshold {
                issues.push(format!(
                    "{context}.{}: green_threshold must be >= red_threshold when direction=higher",
                    rule.metric
                ));
            }
        }
        ThresholdDirection::Lower => {
            if rule.green_threshold > rule.red_threshold {
                issues.push(format!(
                    "{context}.{}: green_threshold must be <= red_threshold when direction=lower",
                    rule.metric
                ));
            }
        }
    }

    if rule.validity_min_denominator < 0 {
        issues.push(format!(
            "{context}.{}: validity_min_denominator must be >= 0",
            rule.metric
        ));
    }

    if rule.unit == MetricUnit::Bps && rule.validity_min_denominator <= 0 {
        issues.push(format!(
            "{context}.{} must declare a positive validity_min_denominator",
            rule.metric
        ));
    }

    issues
}

fn check_stage(
    stage: GrowthStageKey,
    definition: &StageDefinition,
    expected_policy: &StagePolicy,
    issues: &mut Vec<String>,
) {
    if definition.key != stage {
        issues.push(format!(
            "{stage} definition carries key {}",
            definition.key
        ));
    }

    if definition.stage_policy.blocking_mode != expected_policy.blocking_mode {
        issues.push(format!(
            "{stage} blocking mode must be {}",
            expected_policy.blocking_mode
        ));
    }

    if definition.metrics.len() < 2 {
        issues.push(format!("{stage} must declare at least 2 metrics"));
    }

    let metric_keys: BTreeSet<&str> = definition
        .metrics
        .iter()
        .map(|metric| metric.key.as_str())
        .collect();

    for metric in &definition.metrics {
        if metric.key.is_empty() {
            issues.push(format!("{stage} declares a metric with an empty key"));
            continue;
        }
        if metric.label.is_empty() {
            issues.push(format!("{stage}.{} has an empty label", metric.key));
        }

        // Suffix law, both directions: the unit dictates the suffix and the
        // suffix dictates the unit.
        if let Some(suffix) = metric.unit.required_suffix()
            && !metric.key.ends_with(suffix)
        {
            issues.push(format!(
                "Metric {} must end with {suffix} for {} unit",
                metric.key,
                metric.unit.as_str()
            ));
        }
        for (suffix, required_unit) in [
            ("_eur_cents", MetricUnit::EurCents),
            ("_bps", MetricUnit::Bps),
        ] {
            if metric.key.ends_with(suffix) && metric.unit != required_unit {
                issues.push(format!(
                    "Metric {} must declare unit={} for its {suffix} suffix",
                    metric.key,
                    required_unit.as_str()
                ));
            }
        }

        for required in metric.required_metrics.iter().flatten() {
            if !metric_keys.contains(required.as_str()) {
                issues.push(format!(
                    "{stage}.{} requires unknown metric {required}",
                    metric.key
                ));
            }
        }

        if let Some(denominator) = &metric.denominator_metric
            && !metric_keys.contains(denominator.as_str())
        {
            issues.push(format!(
                "{stage}.{} uses unknown denominator {denominator}",
                metric.key
            ));
        }
    }

    for threshold in &definition.thresholds {
        if !metric_keys.contains(threshold.metric.as_str()) {
            issues.push(format!(
                "{stage} threshold references unknown metric {}",
                threshold.metric
            ));
        }

        if let Some(denominator) = &threshold.denominator_metric
            && !metric_keys.contains(denominator.as_str())
        {
            issues.push(format!(
                "{stage}.{} threshold uses unknown denominator {denominator}",
                threshold.metric
            ));
        }

        issues.extend(threshold_rule_issues(stage.as_str(), threshold));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::definitions::builtin_catalog;
    use crate::core::stage::BlockingMode;

    #[test]
    fn builtin_catalog_is_valid() {
        let issues = catalog_issues(&builtin_catalog());
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        assert!(validate_catalog(&builtin_catalog()).is_ok());
    }

    #[test]
    fn wrong_blocking_mode_flagged() {
        let mut catalog = builtin_catalog();
        catalog.referral.stage_policy.blocking_mode = BlockingMode::Always;
        let issues = catalog_issues(&catalog);
        assert!(
            issues.iter().any(|i| i.contains("referral blocking mode")),
            "{issues:?}"
        );
    }

    #[test]
    fn mismatched_stage_key_flagged() {
        let mut catalog = builtin_catalog();
        catalog.acquisition.key = GrowthStageKey::Referral;
        let issues = catalog_issues(&catalog);
        assert!(
            issues
                .iter()
                .any(|i| i.contains("acquisition definition carries key referral")),
            "{issues:?}"
        );
    }

    #[test]
    fn fewer_than_two_metrics_flagged() {
        let mut catalog = builtin_catalog();
        catalog.revenue.metrics.truncate(1);
        let issues = catalog_issues(&catalog);
        assert!(
            issues
                .iter()
                .any(|i| i.contains("revenue must declare at least 2 metrics")),
            "{issues:?}"
        );
    }

    #[test]
    fn unit_suffix_enforced_in_both_directions() {
        let mut catalog = builtin_catalog();
        // eur_cents unit without the suffix.
        catalog.acquisition.metrics[0].key = "spend".to_string();
        // _bps suffix without the unit.
        catalog.activation.metrics[0].key = "sessions_bps".to_string();

        let issues = catalog_issues(&catalog);
        assert!(
            issues
                .iter()
                .any(|i| i.contains("spend must end with _eur_cents")),
            "{issues:?}"
        );
        assert!(
            issues
                .iter()
                .any(|i| i.contains("sessions_bps must declare unit=bps")),
            "{issues:?}"
        );
    }

    #[test]
    fn unknown_required_metric_flagged() {
        let mut catalog = builtin_catalog();
        catalog.retention.metrics[2].required_metrics =
            Some(vec!["missing_metric_count".to_string()]);
        let issues = catalog_issues(&catalog);
        assert!(
            issues
                .iter()
                .any(|i| i.contains("requires unknown metric missing_metric_count")),
            "{issues:?}"
        );
    }

    #[test]
    fn threshold_referencing_unknown_metric_flagged() {
        let mut catalog = builtin_catalog();
        catalog.referral.thresholds[0].metric = "ghost_bps".to_string();
        let issues = catalog_issues(&catalog);
        assert!(
            issues
                .iter()
                .any(|i| i.contains("referral threshold references unknown metric ghost_bps")),
            "{issues:?}"
        );
    }

    #[test]
    fn inverted_thresholds_flagged_per_direction() {
        let mut catalog = builtin_catalog();
        // higher: green must be >= red.
        catalog.activation.thresholds[0].green_threshold = 50;
        catalog.activation.thresholds[0].red_threshold = 90;
        // lower: green must be <= red.
        catalog.acquisition.thresholds[0].green_threshold = 1600;
        catalog.acquisition.thresholds[0].red_threshold = 1500;

        let issues = catalog_issues(&catalog);
        assert!(
            issues
                .iter()
                .any(|i| i.contains("green_threshold must be >= red_threshold when direction=higher")),
            "{issues:?}"
        );
        assert!(
            issues
                .iter()
                .any(|i| i.contains("green_threshold must be <= red_threshold when direction=lower")),
            "{issues:?}"
        );
    }

    #[test]
    fn bps_threshold_requires_positive_min_denominator() {
        let mut catalog = builtin_catalog();
        catalog.activation.thresholds[0].validity_min_denominator = 0;
        let issues = catalog_issues(&catalog);
        assert!(
            issues
                .iter()
                .any(|i| i.contains("must declare a positive validity_min_denominator")),
            "{issues:?}"
        );
    }

    #[test]
    fn negative_min_denominator_flagged() {
        let mut catalog = builtin_catalog();
        catalog.revenue.thresholds[0].validity_min_denominator = -5;
        let issues = catalog_issues(&catalog);
        assert!(
            issues
                .iter()
                .any(|i| i.contains("validity_min_denominator must be >= 0")),
            "{issues:?}"
        );
    }

    #[test]
    fn validate_catalog_joins_issues_into_one_error() {
        let mut catalog = builtin_catalog();
        catalog.referral.stage_policy.blocking_mode = BlockingMode::Always;
        catalog.revenue.metrics.truncate(1);

        let err = validate_catalog(&catalog).expect_err("expected invalid catalog");
        assert_eq!(err.code(), "GL-1001");
        let msg = err.to_string();
        assert!(msg.contains("referral blocking mode"), "{msg}");
        assert!(msg.contains("at least 2 metrics"), "{msg}");
    }
}
