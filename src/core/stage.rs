//! Stage keys, ledger statuses, and blocking policies.
//!
//! Every part of the crate speaks in terms of the five funnel stages, so the
//! vocabulary lives here rather than in the catalog or the engine.

#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};

// ──────────────────────────── stage keys ────────────────────────────

/// The five growth funnel stages, in funnel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStageKey {
    Acquisition,
    Activation,
    Revenue,
    Retention,
    Referral,
}

impl GrowthStageKey {
    /// All stages in funnel order.
    pub const ALL: [Self; 5] = [
        Self::Acquisition,
        Self::Activation,
        Self::Revenue,
        Self::Retention,
        Self::Referral,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acquisition => "acquisition",
            Self::Activation => "activation",
            Self::Revenue => "revenue",
            Self::Retention => "retention",
            Self::Referral => "referral",
        }
    }
}

impl fmt::Display for GrowthStageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────── ledger status ────────────────────────────

/// Per-stage verdict for a period.
///
/// Variants are declared in ascending severity so the derived `Ord` makes
/// merging two statuses a plain `max`. `Green` is the healthiest outcome and
/// `Red` the worst; the unknown-data states sit strictly between `Green` and
/// `Yellow` so missing data can never mask a breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Green,
    NotTracked,
    InsufficientData,
    Yellow,
    Red,
}

impl LedgerStatus {
    /// Numeric severity rank, `0` for `Green` through `4` for `Red`.
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::Green => 0,
            Self::NotTracked => 1,
            Self::InsufficientData => 2,
            Self::Yellow => 3,
            Self::Red => 4,
        }
    }

    /// Combines two statuses, keeping the more severe one.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }

    /// Whether the status reflects an actual measurement.
    ///
    /// `not_tracked` and `insufficient_data` describe missing or unusable
    /// input, not a verdict, so they do not count as decision-valid.
    #[must_use]
    pub const fn is_decision_valid(self) -> bool {
        matches!(self, Self::Green | Self::Yellow | Self::Red)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::NotTracked => "not_tracked",
            Self::InsufficientData => "insufficient_data",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────── stage policy ────────────────────────────

/// When a red stage is allowed to block downstream spend decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingMode {
    /// A red status always blocks, even on invalid data.
    Always,
    /// A red status blocks only once the stage has valid data.
    AfterValid,
    /// The stage is advisory and never blocks.
    Never,
}

impl BlockingMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::AfterValid => "after_valid",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for BlockingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blocking policy attached to a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePolicy {
    pub blocking_mode: BlockingMode,
}

impl StagePolicy {
    #[must_use]
    pub const fn new(blocking_mode: BlockingMode) -> Self {
        Self { blocking_mode }
    }
}

// ──────────────────────────── per-stage container ────────────────────────────

/// A value per funnel stage.
///
/// Using named fields instead of a map fixes the key set at the type level:
/// a ledger or threshold set can neither omit a stage nor smuggle in an
/// unknown one, and serde ignores stray keys on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerStage<T> {
    pub acquisition: T,
    pub activation: T,
    pub revenue: T,
    pub retention: T,
    pub referral: T,
}

impl<T> PerStage<T> {
    /// Builds a container by calling `f` once per stage, in funnel order.
    pub fn from_fn(mut f: impl FnMut(GrowthStageKey) -> T) -> Self {
        Self {
            acquisition: f(GrowthStageKey::Acquisition),
            activation: f(GrowthStageKey::Activation),
            revenue: f(GrowthStageKey::Revenue),
            retention: f(GrowthStageKey::Retention),
            referral: f(GrowthStageKey::Referral),
        }
    }

    /// Fallible variant of [`PerStage::from_fn`]; stops at the first error.
    pub fn try_from_fn<E>(
        mut f: impl FnMut(GrowthStageKey) -> std::result::Result<T, E>,
    ) -> std::result::Result<Self, E> {
        Ok(Self {
            acquisition: f(GrowthStageKey::Acquisition)?,
            activation: f(GrowthStageKey::Activation)?,
            revenue: f(GrowthStageKey::Revenue)?,
            retention: f(GrowthStageKey::Retention)?,
            referral: f(GrowthStageKey::Referral)?,
        })
    }

    #[must_use]
    pub const fn get(&self, stage: GrowthStageKey) -> &T {
        match stage {
            GrowthStageKey::Acquisition => &self.acquisition,
            GrowthStageKey::Activation => &self.activation,
            GrowthStageKey::Revenue => &self.revenue,
            GrowthStageKey::Retention => &self.retention,
            GrowthStageKey::Referral => &self.referral,
        }
    }

    pub const fn get_mut(&mut self, stage: GrowthStageKey) -> &mut T {
        match stage {
            GrowthStageKey::Acquisition => &mut self.acquisition,
            GrowthStageKey::Activation => &mut self.activation,
            GrowthStageKey::Revenue => &mut self.revenue,
            GrowthStageKey::Retention => &mut self.retention,
            GrowthStageKey::Referral => &mut self.referral,
        }
    }

    /// Iterates `(stage, value)` pairs in funnel order.
    pub fn iter(&self) -> impl Iterator<Item = (GrowthStageKey, &T)> {
        GrowthStageKey::ALL.iter().map(|stage| (*stage, self.get(*stage)))
    }

    /// Maps every stage value through `f`, preserving structure.
    pub fn map<U>(&self, mut f: impl FnMut(GrowthStageKey, &T) -> U) -> PerStage<U> {
        PerStage {
            acquisition: f(GrowthStageKey::Acquisition, &self.acquisition),
            activation: f(GrowthStageKey::Activation, &self.activation),
            revenue: f(GrowthStageKey::Revenue, &self.revenue),
            retention: f(GrowthStageKey::Retention, &self.retention),
            referral: f(GrowthStageKey::Referral, &self.referral),
        }
    }
}

impl<T: Clone> PerStage<T> {
    /// Fills every stage with a clone of `value`.
    #[must_use]
    pub fn uniform(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl<T: Default> Default for PerStage<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}
