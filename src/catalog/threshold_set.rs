//! Content-addressed threshold snapshots.
//!
//! A threshold set is locked once per calibration event and referenced from
//! ledgers by id and hash. The hash covers the canonical compact JSON of the
//! per-stage rules, so two sets with the same rules address identically no
//! matter who serialized them.

#![allow(missing_docs)]

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::definitions::{GrowthCatalog, ThresholdRule};
use crate::catalog::validate::threshold_rule_issues;
use crate::core::canonical::{canonical_compact, sha256_hex};
use crate::core::errors::{LedgerError, Result};
use crate::core::stage::PerStage;
use crate::core::time::is_rfc3339;

/// Stage-keyed threshold rules, the hashed payload of a set.
pub type ThresholdStages = PerStage<Vec<ThresholdRule>>;

/// An immutable snapshot of thresholds for all five stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub threshold_set_id: String,
    pub threshold_set_hash: String,
    pub generated_at: String,
    pub stages: ThresholdStages,
}

fn id_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^gts_[a-f0-9]{12}$").expect("static pattern"))
}

fn hash_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^sha256:[a-f0-9]{64}$").expect("static pattern"))
}

/// Whether `value` has the `gts_<hex12>` id shape.
#[must_use]
pub fn is_threshold_set_id(value: &str) -> bool {
    id_shape().is_match(value)
}

/// Whether `value` has the `sha256:<hex64>` hash shape.
#[must_use]
pub fn is_threshold_set_hash(value: &str) -> bool {
    hash_shape().is_match(value)
}

/// Content hash of `stages`: `sha256:` plus the hex digest of the compact
/// canonical JSON.
pub fn threshold_set_hash(stages: &ThresholdStages) -> Result<String> {
    let payload = canonical_compact(stages)?;
    Ok(format!("sha256:{}", sha256_hex(payload.as_bytes())))
}

/// Set id derived from a `sha256:`-prefixed hash: `gts_` plus the first 12
/// digest characters.
pub fn threshold_set_id(hash: &str) -> Result<String> {
    let digest = hash
        .strip_prefix("sha256:")
        .ok_or_else(|| LedgerError::InvalidThresholdSet {
            details: format!("hash {hash:?} is not sha256-prefixed"),
        })?;
    if digest.len() < 12 {
        return Err(LedgerError::InvalidThresholdSet {
            details: format!("hash digest {digest:?} is shorter than 12 characters"),
        });
    }
    Ok(format!("gts_{}", &digest[..12]))
}

/// Builds a content-addressed set from per-stage rules.
pub fn build_threshold_set(
    stages: ThresholdStages,
    generated_at: impl Into<String>,
) -> Result<ThresholdSet> {
    let hash = threshold_set_hash(&stages)?;
    let id = threshold_set_id(&hash)?;
    Ok(ThresholdSet {
        threshold_set_id: id,
        threshold_set_hash: hash,
        generated_at: generated_at.into(),
        stages,
    })
}

/// Locks the threshold rules of `catalog` into a new set.
pub fn threshold_set_from_catalog(
    catalog: &GrowthCatalog,
    generated_at: impl Into<String>,
) -> Result<ThresholdSet> {
    let stages = catalog.map(|_, definition| definition.thresholds.clone());
    build_threshold_set(stages, generated_at)
}

impl ThresholdSet {
    /// Shape and invariant problems; empty means valid.
    #[must_use]
    pub fn validation_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !is_threshold_set_id(&self.threshold_set_id) {
            issues.push(format!(
                "threshold_set_id {:?} does not match gts_<hex12>",
                self.threshold_set_id
            ));
        }
        if !is_threshold_set_hash(&self.threshold_set_hash) {
            issues.push(format!(
                "threshold_set_hash {:?} does not match sha256:<hex64>",
                self.threshold_set_hash
            ));
        }
        if !is_rfc3339(&self.generated_at) {
            issues.push(format!(
                "generated_at {:?} is not an RFC 3339 timestamp",
                self.generated_at
            ));
        }

        for (stage, rules) in self.stages.iter() {
            for rule in rules {
                issues.extend(threshold_rule_issues(stage.as_str(), rule));
            }
        }

        issues
    }

    /// Validates shape and invariants, folding issues into one `GL-1002` error.
    pub fn validate(&self) -> Result<()> {
        let issues = self.validation_issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::InvalidThresholdSet {
                details: issues.join("; "),
            })
        }
    }

    /// Recomputes the content address from `stages` and checks that both the
    /// recorded hash and id still match.
    pub fn verify_integrity(&self) -> Result<()> {
        let expected_hash = threshold_set_hash(&self.stages)?;
        if self.threshold_set_hash != expected_hash {
            return Err(LedgerError::InvalidThresholdSet {
                details: format!(
                    "hash mismatch: recorded {}, content {expected_hash}",
                    self.threshold_set_hash
                ),
            });
        }

        let expected_id = threshold_set_id(&expected_hash)?;
        if self.threshold_set_id != expected_id {
            return Err(LedgerError::InvalidThresholdSet {
                details: format!(
                    "id mismatch: recorded {}, content {expected_id}",
                    self.threshold_set_id
                ),
            });
        }

        Ok(())
    }
}
