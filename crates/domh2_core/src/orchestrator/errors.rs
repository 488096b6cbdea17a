//! Error types for the per-trait pipeline.
//!
//! Errors carry context that chains through layers:
//! Trait → Step → Operation → Detail.
//!
//! Everything here is local to one trait. The batch runner catches
//! `PipelineError`, logs it with trait context, and moves on; only
//! registry/catalog-level failures (see `orchestrator::batch::SetupError`)
//! abort the whole run.

use std::io;

use thiserror::Error;

use crate::estimator::EstimatorError;
use crate::fetch::FetchError;
use crate::merge::MergeError;

/// Top-level pipeline error with trait context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Trait '{trait_id}' failed at step '{step_name}': {source}")]
    StepFailed {
        trait_id: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Failed to set up the trait job (scratch directory, logger).
    #[error("Trait '{trait_id}' setup failed: {message}")]
    SetupFailed { trait_id: String, message: String },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        trait_id: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            trait_id: trait_id.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a setup failed error.
    pub fn setup_failed(trait_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            trait_id: trait_id.into(),
            message: message.into(),
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// A remote retrieval failed; this trait's input is unavailable.
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] FetchError),

    /// The merge/filter stage hit malformed or incompatible input.
    #[error("Preprocessing failed: {0}")]
    Preprocessing(#[from] MergeError),

    /// The external estimator failed.
    #[error("Estimation failed: {0}")]
    Estimation(#[from] EstimatorError),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create an I/O error with operation context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;

    #[test]
    fn step_error_displays_context() {
        let err = StepError::Retrieval(FetchError::NonZeroExit {
            program: "wget".to_string(),
            exit_code: 8,
            message: "server error".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.contains("Retrieval failed"));
        assert!(msg.contains("wget"));
        assert!(msg.contains("8"));
    }

    #[test]
    fn pipeline_error_chains_context() {
        let step_err = StepError::invalid_output("merged artifact missing");
        let pipeline_err = PipelineError::step_failed("50_irnt", "Merge", step_err);

        let msg = pipeline_err.to_string();
        assert!(msg.contains("50_irnt"));
        assert!(msg.contains("Merge"));
    }
}
