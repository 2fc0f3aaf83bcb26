//! Guardrail evaluation: per-stage threshold checks and the overall verdict.

pub mod evaluation;
pub mod verdict;
