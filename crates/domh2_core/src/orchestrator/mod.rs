//! Per-trait pipeline orchestration.
//!
//! The pipeline architecture separates concerns:
//! - **Steps** are composable stages implementing [`PipelineStep`]
//! - **Context** holds one trait's read-only inputs and shared resources
//! - **TraitState** accumulates each step's outputs
//! - **Pipeline** executes steps with validation before and after each
//! - **BatchRunner** loads run-wide inputs and isolates trait failures
//!
//! A trait job's working files live in a [`ScratchDir`] that is removed
//! when the job ends, however it ends.

pub mod batch;
pub mod errors;
pub mod pipeline;
pub mod scratch;
pub mod step;
pub mod steps;
pub mod types;

pub use batch::{BatchRunner, BatchSummary, SetupError, TraitRunResult, TraitSelection};
pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use scratch::ScratchDir;
pub use step::PipelineStep;
pub use steps::{EstimateStep, FetchStep, MergeStep};
pub use types::{Context, EstimateOutput, FetchOutput, MergeOutput, StepOutcome, TraitState};

/// Build the standard per-trait pipeline: fetch both statistic files,
/// merge them against the reference panel, run the estimator.
pub fn create_trait_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(FetchStep::new())
        .with_step(MergeStep::new())
        .with_step(EstimateStep::new())
}
