//! Metric and threshold catalog: stage definitions, locked threshold sets,
//! and structural validation.

pub mod definitions;
pub mod threshold_set;
pub mod validate;
