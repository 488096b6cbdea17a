//! Merge step: join fetched statistics against the reference panel and
//! publish the estimator input artifact.

use crate::merge;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, MergeOutput, StepOutcome, TraitState};

/// Merges the two fetched statistic files with the reference panel and
/// writes the per-trait artifact into the merged directory.
pub struct MergeStep;

impl MergeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MergeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for MergeStep {
    fn name(&self) -> &str {
        "Merge"
    }

    fn validate_input(&self, _ctx: &Context, state: &TraitState) -> StepResult<()> {
        let fetch = state
            .fetch
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("Fetch step has not run"))?;
        for path in [&fetch.additive_path, &fetch.dominance_path] {
            if !path.is_file() {
                return Err(StepError::invalid_input(format!(
                    "Fetched file is missing: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut TraitState) -> StepResult<StepOutcome> {
        let fetch = state
            .fetch
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("Fetch step has not run"))?;

        let artifact_path = ctx.merged_artifact_path();
        ctx.logger.info(&format!(
            "Merging statistics into {}",
            artifact_path.display()
        ));

        let stats = merge::merge(
            &fetch.additive_path,
            &fetch.dominance_path,
            &ctx.reference,
            &artifact_path,
        )?;

        ctx.logger.info(&format!(
            "Joined {} additive x {} dominance rows, kept {}",
            stats.additive_rows, stats.dominance_rows, stats.rows_written
        ));

        state.merge = Some(MergeOutput {
            artifact_path,
            rows_written: stats.rows_written,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &TraitState) -> StepResult<()> {
        let merge = state
            .merge
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Merge results not recorded"))?;

        if !merge.artifact_path.is_file() {
            return Err(StepError::invalid_output(format!(
                "Merged artifact was not written: {}",
                merge.artifact_path.display()
            )));
        }
        if merge.rows_written == 0 {
            return Err(StepError::invalid_output(
                "Merged artifact contains no variants",
            ));
        }
        ctx.logger.validation(&format!(
            "Merged artifact present with {} variants",
            merge.rows_written
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::fetch::FetchCommand;
    use crate::logging::TraitLogger;
    use crate::models::{ReferenceIndex, VariantRecord};
    use crate::orchestrator::types::FetchOutput;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_gz_tsv(path: &Path, lines: &[&str]) {
        let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        for line in lines {
            writeln!(enc, "{}", line).unwrap();
        }
        enc.finish().unwrap();
    }

    fn context_in(dir: &Path, reference: ReferenceIndex) -> Context {
        Context {
            trait_id: "50_irnt".to_string(),
            additive_fetch: FetchCommand::parse("true -O a.bgz").unwrap(),
            dominance_fetch: FetchCommand::parse("true -O d.bgz").unwrap(),
            settings: Settings::default(),
            scratch_dir: dir.to_path_buf(),
            merged_dir: dir.to_path_buf(),
            results_dir: dir.to_path_buf(),
            reference: Arc::new(reference),
            logger: Arc::new(TraitLogger::detached("50_irnt", None)),
        }
    }

    #[test]
    fn requires_fetch_to_have_run() {
        let dir = TempDir::new().unwrap();
        let ctx = context_in(dir.path(), ReferenceIndex::default());
        let err = MergeStep::new()
            .validate_input(&ctx, &TraitState::new("50_irnt"))
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidInput(_)));
    }

    #[test]
    fn merges_fetched_files_into_named_artifact() {
        let dir = TempDir::new().unwrap();
        let add = dir.path().join("a.bgz");
        let dom = dir.path().join("d.bgz");
        write_gz_tsv(
            &add,
            &[
                "variant\tn_complete_samples\ttstat",
                "1:100:A:G\t360000\t1.5",
            ],
        );
        write_gz_tsv(&dom, &["variant\tdominance_tstat", "1:100:A:G\t0.3"]);

        let reference = ReferenceIndex::from_records([(
            "1:100:A:G".to_string(),
            VariantRecord {
                snp: "rs100".to_string(),
                a1: "A".to_string(),
                a2: "G".to_string(),
            },
        )]);
        let ctx = context_in(dir.path(), reference);

        let mut state = TraitState::new("50_irnt");
        state.fetch = Some(FetchOutput {
            additive_path: add,
            dominance_path: dom,
        });

        let step = MergeStep::new();
        step.validate_input(&ctx, &state).unwrap();
        step.execute(&ctx, &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();

        let merge = state.merge.unwrap();
        assert_eq!(merge.rows_written, 1);
        assert_eq!(
            merge.artifact_path,
            dir.path().join("50_irnt_gwas_merged.chisq.gz")
        );
        assert!(merge.artifact_path.is_file());
    }

    #[test]
    fn disjoint_inputs_fail_as_preprocessing_error() {
        let dir = TempDir::new().unwrap();
        let add = dir.path().join("a.bgz");
        let dom = dir.path().join("d.bgz");
        write_gz_tsv(
            &add,
            &[
                "variant\tn_complete_samples\ttstat",
                "1:100:A:G\t360000\t1.5",
            ],
        );
        write_gz_tsv(&dom, &["variant\tdominance_tstat", "2:200:C:T\t0.3"]);

        let ctx = context_in(dir.path(), ReferenceIndex::default());
        let mut state = TraitState::new("50_irnt");
        state.fetch = Some(FetchOutput {
            additive_path: add,
            dominance_path: dom,
        });

        let err = MergeStep::new().execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::Preprocessing(_)));
    }
}
