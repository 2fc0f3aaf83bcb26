#![forbid(unsafe_code)]

//! Growth Ledger — guardrail evaluation and durable per-business verdicts
//! for a five-stage growth funnel.
//!
//! Three cooperating parts:
//! 1. **Catalog** — metric and threshold definitions per stage, locked into
//!    immutable, content-addressed threshold sets
//! 2. **Engine** — pure evaluation of raw metrics against locked thresholds
//!    into per-stage statuses and an overall scale/hold/kill verdict
//! 3. **Store** — one canonical JSON document per business, replaced
//!    atomically and guarded by optimistic revision checks
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use growth_ledger::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use growth_ledger::catalog::definitions::builtin_catalog;
//! use growth_ledger::ledger::store::GrowthLedgerStore;
//! ```

pub mod prelude;

pub mod catalog;
pub mod core;
pub mod engine;
pub mod ledger;
