//! Pipeline step trait definition.
//!
//! All per-trait steps implement this trait, providing a consistent
//! interface for validation and execution.

use super::errors::StepResult;
use super::types::{Context, StepOutcome, TraitState};

/// Trait for per-trait pipeline steps.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - check preconditions before execution
/// 2. `execute` - perform the step's work
/// 3. `validate_output` - verify the step produced valid output
///
/// Steps record their results in `TraitState`; the read-only `Context`
/// carries trait configuration and shared resources.
pub trait PipelineStep: Send + Sync {
    /// Get the step name (for logging and error context).
    fn name(&self) -> &str;

    /// Validate inputs before execution.
    fn validate_input(&self, ctx: &Context, state: &TraitState) -> StepResult<()>;

    /// Execute the step's main work.
    ///
    /// Returns `StepOutcome::Success` on completion, or
    /// `StepOutcome::Skipped` if the step determined it should be skipped
    /// (not an error).
    fn execute(&self, ctx: &Context, state: &mut TraitState) -> StepResult<StepOutcome>;

    /// Validate outputs after execution.
    ///
    /// Called only after `execute` returns `Success`.
    fn validate_output(&self, ctx: &Context, state: &TraitState) -> StepResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockStep {
        name: &'static str,
        should_skip: bool,
    }

    impl PipelineStep for MockStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context, _state: &TraitState) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut TraitState) -> StepResult<StepOutcome> {
            if self.should_skip {
                Ok(StepOutcome::Skipped("Test skip".to_string()))
            } else {
                Ok(StepOutcome::Success)
            }
        }

        fn validate_output(&self, _ctx: &Context, _state: &TraitState) -> StepResult<()> {
            Ok(())
        }
    }

    #[test]
    fn step_trait_object_works() {
        let step: Box<dyn PipelineStep> = Box::new(MockStep {
            name: "TestStep",
            should_skip: false,
        });

        assert_eq!(step.name(), "TestStep");
    }
}
