//! Shared fixtures: builtin-catalog metrics and assembled ledger documents.

use growth_ledger::catalog::definitions::builtin_catalog;
use growth_ledger::catalog::threshold_set::{ThresholdSet, threshold_set_from_catalog};
use growth_ledger::core::stage::PerStage;
use growth_ledger::engine::evaluation::{GuardrailEngine, StageMetrics};
use growth_ledger::ledger::schema::{GrowthLedger, LedgerPeriod};

pub const LOCKED_AT: &str = "2025-02-10T00:00:00.000Z";
pub const UPDATED_AT: &str = "2025-02-10T06:00:00.000Z";

pub fn readings(pairs: &[(&str, i64)]) -> StageMetrics {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), Some(*value)))
        .collect()
}

/// Healthy readings for every stage of the builtin catalog.
pub fn all_green_metrics() -> PerStage<StageMetrics> {
    PerStage {
        acquisition: readings(&[("blended_cac_eur_cents", 1_200), ("new_customers_count", 40)]),
        activation: readings(&[("sitewide_cvr_bps", 150), ("sessions_count", 4_000)]),
        revenue: readings(&[("aov_eur_cents", 3_400), ("orders_count", 180)]),
        retention: readings(&[("return_rate_30d_bps", 650), ("orders_shipped_count", 140)]),
        referral: readings(&[
            ("referral_conversion_rate_bps", 130),
            ("referral_sessions_count", 260),
        ]),
    }
}

pub fn sample_period() -> LedgerPeriod {
    LedgerPeriod {
        period_id: "2025-W07".to_string(),
        start_date: "2025-02-10".to_string(),
        end_date: "2025-02-16".to_string(),
        forecast_id: "fc_baseline".to_string(),
    }
}

pub fn locked_builtin_set() -> ThresholdSet {
    threshold_set_from_catalog(&builtin_catalog(), LOCKED_AT).expect("builtin catalog locks")
}

/// Evaluates `metrics` against the builtin catalog and folds the verdict into
/// a document. Timestamps are fixed so canonical equality is deterministic.
pub fn assemble_ledger(
    business: &str,
    revision: u64,
    metrics: &PerStage<StageMetrics>,
) -> GrowthLedger {
    let set = locked_builtin_set();
    let verdict = GuardrailEngine::from_catalog(&builtin_catalog()).evaluate(metrics);
    GrowthLedger::assemble(
        business,
        sample_period(),
        &set,
        &verdict,
        revision,
        LOCKED_AT,
        UPDATED_AT,
    )
}
