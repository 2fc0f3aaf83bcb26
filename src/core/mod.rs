//! Core types: errors, configuration, canonical JSON, shared vocabulary.

pub mod canonical;
pub mod config;
pub mod errors;
pub mod paths;
pub mod stage;
pub mod time;
