//! Estimate step: run the external heritability estimator and collect its
//! result files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::estimator::{EstimatorCommand, OUT_PREFIX_SUFFIX};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, EstimateOutput, StepOutcome, TraitState};

/// Runs the external estimator against the merged artifact, then copies
/// every file written under the output prefix into the results directory.
///
/// When no estimator executable is configured the step is skipped, leaving
/// the merged artifacts in place for a separately provisioned estimation
/// run.
pub struct EstimateStep;

impl EstimateStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EstimateStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for EstimateStep {
    fn name(&self) -> &str {
        "Estimate"
    }

    fn validate_input(&self, ctx: &Context, state: &TraitState) -> StepResult<()> {
        if !ctx.settings.estimator.is_configured() {
            return Ok(());
        }
        let merge = state
            .merge
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("Merge step has not run"))?;
        if !merge.artifact_path.is_file() {
            return Err(StepError::invalid_input(format!(
                "Merged artifact is missing: {}",
                merge.artifact_path.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut TraitState) -> StepResult<StepOutcome> {
        if !ctx.settings.estimator.is_configured() {
            return Ok(StepOutcome::Skipped(
                "No estimator executable configured".to_string(),
            ));
        }

        let merge = state
            .merge
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("Merge step has not run"))?;

        // The estimator runs with scratch as its working directory, so a
        // relative configured path would resolve against scratch instead
        // of the process working directory. Both paths it receives must
        // be absolute.
        let sumstats = fs::canonicalize(&merge.artifact_path)
            .map_err(|e| StepError::io_error("resolve merged artifact path", e))?;
        let scratch_dir = fs::canonicalize(&ctx.scratch_dir)
            .map_err(|e| StepError::io_error("resolve scratch directory", e))?;
        let out_prefix = scratch_dir.join(format!("{}{}", ctx.trait_id, OUT_PREFIX_SUFFIX));

        let command = EstimatorCommand::build(
            &ctx.settings.estimator,
            &sumstats,
            &out_prefix,
            &ctx.trait_id,
        );

        ctx.logger.command(&command.display());
        command.run(&ctx.scratch_dir)?;

        let result_files = self.collect_results(ctx, &out_prefix)?;
        state.estimate = Some(EstimateOutput { result_files });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &TraitState) -> StepResult<()> {
        let estimate = state
            .estimate
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Estimation results not recorded"))?;

        if estimate.result_files.is_empty() {
            return Err(StepError::invalid_output(
                "Estimator exited cleanly but wrote no result files",
            ));
        }
        for path in &estimate.result_files {
            if !path.is_file() {
                return Err(StepError::invalid_output(format!(
                    "Collected result file is missing: {}",
                    path.display()
                )));
            }
        }
        ctx.logger.validation(&format!(
            "{} result file(s) collected",
            estimate.result_files.len()
        ));
        Ok(())
    }
}

impl EstimateStep {
    /// Copy every scratch file whose name starts with the output prefix
    /// into the results directory. Scratch is transient; only copied
    /// files survive the trait job.
    fn collect_results(&self, ctx: &Context, out_prefix: &Path) -> StepResult<Vec<PathBuf>> {
        let prefix_name = out_prefix
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let entries = fs::read_dir(&ctx.scratch_dir)
            .map_err(|e| StepError::io_error("read scratch directory", e))?;

        let mut collected = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StepError::io_error("read scratch entry", e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&prefix_name) {
                continue;
            }
            let dest = ctx.results_dir.join(&name);
            fs::copy(entry.path(), &dest)
                .map_err(|e| StepError::io_error("copy result file", e))?;
            ctx.logger
                .info(&format!("Collected {}", dest.display()));
            collected.push(dest);
        }
        collected.sort_unstable();
        Ok(collected)
    }
}
