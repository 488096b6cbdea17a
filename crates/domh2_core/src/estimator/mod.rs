//! External heritability estimator invocation.
//!
//! The estimator is a black box: a fixed flag set requesting additive and
//! dominance estimation, a block-jackknife parameter, LD-score path
//! templates, a statistic cap large enough to disable truncation, and a
//! trait-name tag. Success is exit status zero; its output files are
//! opaque to this crate until the result compiler parses them.
//!
//! Arguments are passed as a structured list to the process API - no shell
//! string interpolation.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::config::EstimatorSettings;

/// Output-prefix suffix appended to the trait code (`<code>_dom_h2`).
pub const OUT_PREFIX_SUFFIX: &str = "_dom_h2";

/// Errors from running the estimator. Local to the current trait; no
/// automatic retry.
#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("Failed to start estimator '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Estimator exited with code {exit_code} for trait '{trait_id}': {message}")]
    NonZeroExit {
        trait_id: String,
        exit_code: i32,
        message: String,
    },
}

/// A fully-resolved estimator invocation for one trait.
#[derive(Debug, Clone)]
pub struct EstimatorCommand {
    program: PathBuf,
    args: Vec<String>,
    trait_id: String,
}

impl EstimatorCommand {
    /// Build the invocation from settings and per-trait paths.
    ///
    /// `sumstats` is the merged artifact, `out_prefix` the path prefix the
    /// estimator writes its result files under.
    pub fn build(
        settings: &EstimatorSettings,
        sumstats: &Path,
        out_prefix: &Path,
        trait_id: &str,
    ) -> Self {
        let mut args = Vec::new();
        if let Some(script) = &settings.script {
            args.push(script.display().to_string());
        }

        args.push("--additive".to_string());
        args.push("--dominance".to_string());
        args.push("--ref-ld-chr".to_string());
        args.push(settings.ld_scores_prefix.clone());
        args.push("--w-ld-chr".to_string());
        args.push(settings.ld_scores_prefix.clone());
        args.push("--n-blocks".to_string());
        args.push(settings.n_blocks.to_string());
        if settings.write_h2 {
            args.push("--write-h2".to_string());
        }
        args.push("--h2".to_string());
        args.push(sumstats.display().to_string());
        args.push("--chisq-max".to_string());
        args.push(settings.chisq_max.to_string());
        args.push("--out".to_string());
        args.push(out_prefix.display().to_string());
        args.push("--pheno-name".to_string());
        args.push(trait_id.to_string());

        Self {
            program: settings.executable.clone(),
            args,
            trait_id: trait_id.to_string(),
        }
    }

    /// The argument list (for logging and inspection).
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Render the command for logging.
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Run the estimator with `work_dir` as the working directory.
    ///
    /// Blocks until the process exits; the core enforces no timeout.
    pub fn run(&self, work_dir: &Path) -> Result<(), EstimatorError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(work_dir)
            .output()
            .map_err(|e| EstimatorError::Spawn {
                program: self.program.display().to_string(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EstimatorError::NonZeroExit {
                trait_id: self.trait_id.clone(),
                exit_code: output.status.code().unwrap_or(-1),
                message: stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}
