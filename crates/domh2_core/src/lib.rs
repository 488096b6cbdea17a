//! domh2 core - backend logic for the dominance-heritability batch pipeline.
//!
//! This crate contains all pipeline logic with zero CLI dependencies.
//! The flow per trait is: fetch two GWAS summary-statistic files, merge and
//! filter them against a reference variant panel, and hand the merged
//! artifact to an external heritability estimator. A separate compiler pass
//! reconciles the estimator's per-trait output files into one validated
//! summary table.

pub mod compiler;
pub mod config;
pub mod estimator;
pub mod fetch;
pub mod logging;
pub mod merge;
pub mod models;
pub mod orchestrator;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
