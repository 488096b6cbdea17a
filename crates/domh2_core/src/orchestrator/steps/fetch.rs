//! Fetch step: retrieve both statistic files into the scratch directory.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, FetchOutput, StepOutcome, TraitState};

/// Retrieves the additive and dominance statistic files for one trait.
///
/// Both retrievals must succeed before the pipeline moves on to merging.
/// A failed retrieval marks this trait failed; it never aborts the batch.
pub struct FetchStep;

impl FetchStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FetchStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for FetchStep {
    fn name(&self) -> &str {
        "Fetch"
    }

    fn validate_input(&self, ctx: &Context, _state: &TraitState) -> StepResult<()> {
        if !ctx.scratch_dir.is_dir() {
            return Err(StepError::invalid_input(format!(
                "Scratch directory does not exist: {}",
                ctx.scratch_dir.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut TraitState) -> StepResult<StepOutcome> {
        ctx.logger.info("Downloading summary statistics...");

        ctx.logger.command(&ctx.additive_fetch.display());
        let additive_path = ctx.additive_fetch.execute(&ctx.scratch_dir)?;

        ctx.logger.command(&ctx.dominance_fetch.display());
        let dominance_path = ctx.dominance_fetch.execute(&ctx.scratch_dir)?;

        state.fetch = Some(FetchOutput {
            additive_path,
            dominance_path,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &TraitState) -> StepResult<()> {
        let fetch = state
            .fetch
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Fetch results not recorded"))?;

        // The expected paths were derived from the instructions, not from
        // the tool's writes; verify the tool actually delivered them.
        for path in [&fetch.additive_path, &fetch.dominance_path] {
            if !path.is_file() {
                return Err(StepError::invalid_output(format!(
                    "Declared output file was not created: {}",
                    path.display()
                )));
            }
        }
        ctx.logger
            .validation("Both statistic files present in scratch");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::fetch::FetchCommand;
    use crate::logging::TraitLogger;
    use crate::models::ReferenceIndex;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context_in(dir: &Path, additive: &str, dominance: &str) -> Context {
        Context {
            trait_id: "T1".to_string(),
            additive_fetch: FetchCommand::parse(additive).unwrap(),
            dominance_fetch: FetchCommand::parse(dominance).unwrap(),
            settings: Settings::default(),
            scratch_dir: dir.to_path_buf(),
            merged_dir: dir.to_path_buf(),
            results_dir: dir.to_path_buf(),
            reference: Arc::new(ReferenceIndex::default()),
            logger: Arc::new(TraitLogger::detached("T1", None)),
        }
    }

    #[test]
    fn missing_scratch_dir_fails_input_validation() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("missing");
        let ctx = context_in(&gone, "true -O a.tsv", "true -O d.tsv");

        let err = FetchStep::new()
            .validate_input(&ctx, &TraitState::new("T1"))
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidInput(_)));
    }

    #[test]
    fn failed_retrieval_is_a_retrieval_error() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(dir.path(), "false -O a.tsv", "true -O d.tsv");

        let mut state = TraitState::new("T1");
        let err = FetchStep::new().execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::Retrieval(_)));
        assert!(!state.has_fetch());
    }

    #[test]
    fn undelivered_output_fails_output_validation() {
        let dir = TempDir::new().unwrap();
        // `true` exits zero but writes nothing
        let ctx = context_in(dir.path(), "true -O a.tsv", "true -O d.tsv");

        let mut state = TraitState::new("T1");
        let step = FetchStep::new();
        step.execute(&ctx, &mut state).unwrap();
        let err = step.validate_output(&ctx, &state).unwrap_err();
        assert!(matches!(err, StepError::InvalidOutput(_)));
    }

    #[test]
    fn successful_fetch_records_both_paths() {
        let dir = TempDir::new().unwrap();
        // `touch --` treats every later token as a filename to create,
        // including the declared output
        let ctx = context_in(dir.path(), "touch -- -O a.tsv", "touch -- -O d.tsv");

        let mut state = TraitState::new("T1");
        let step = FetchStep::new();
        step.execute(&ctx, &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();

        let fetch = state.fetch.unwrap();
        assert_eq!(fetch.additive_path, dir.path().join("a.tsv"));
        assert_eq!(fetch.dominance_path, dir.path().join("d.tsv"));
    }
}
