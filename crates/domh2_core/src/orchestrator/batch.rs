//! Batch runner: loads run-wide inputs once, then processes traits with
//! per-trait failure isolation.
//!
//! Setup failures (catalogs, registry, reference panel, output
//! directories) abort the whole run; anything that goes wrong while
//! processing one trait is recorded and the runner moves on to the next.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::config::Settings;
use crate::logging::{LogConfig, TraitLogger};
use crate::models::{Catalog, CatalogError, ReferenceError, ReferenceIndex, RegistryError, TraitRegistry};

use super::create_trait_pipeline;
use super::errors::PipelineError;
use super::scratch::ScratchDir;
use super::types::{Context, TraitState};

/// Which traits of the registry a run covers.
///
/// A single interface serves both the whole-batch mode and the
/// scheduler-array mode, where each array task processes the trait at
/// its task index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraitSelection {
    /// Every trait in the registry, in sorted order.
    All,
    /// The trait at the given registry index (array-task mode).
    Index(usize),
    /// An explicit list of phenotype codes.
    Codes(Vec<String>),
}

/// Fatal errors during run setup, before any trait work starts.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("Failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of one trait job.
#[derive(Debug, Clone)]
pub struct TraitRunResult {
    /// Phenotype code.
    pub trait_id: String,
    /// Whether the trait's pipeline ran to completion.
    pub success: bool,
    /// Rendered error when the trait failed.
    pub error: Option<String>,
    /// Names of the steps that completed.
    pub steps_completed: Vec<String>,
    /// Wall-clock duration of the trait job in seconds.
    pub elapsed_secs: f64,
}

/// Summary of a whole batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Per-trait outcomes, in processing order.
    pub results: Vec<TraitRunResult>,
}

impl BatchSummary {
    /// Codes of traits that completed.
    pub fn succeeded(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.trait_id.as_str())
            .collect()
    }

    /// Codes of traits that failed.
    pub fn failed(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.trait_id.as_str())
            .collect()
    }

    /// Whether every processed trait completed.
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }
}

/// Loads run-wide inputs and drives the per-trait pipeline.
#[derive(Debug)]
pub struct BatchRunner {
    settings: Settings,
    additive: Catalog,
    dominance: Catalog,
    registry: TraitRegistry,
    reference: Arc<ReferenceIndex>,
}

impl BatchRunner {
    /// Load both catalogs, build the registry, load the reference panel,
    /// and create the output directories.
    ///
    /// Any failure here aborts the run; no trait has been touched yet.
    pub fn new(mut settings: Settings) -> Result<Self, SetupError> {
        let additive = Catalog::load(&settings.paths.additive_catalog)?;
        let dominance = Catalog::load(&settings.paths.dominance_catalog)?;
        let registry = TraitRegistry::build(&additive, &dominance)?;
        let reference = Arc::new(ReferenceIndex::load(&settings.paths.reference_file)?);

        tracing::info!(
            "Registry holds {} trait(s); reference panel holds {} variant(s)",
            registry.len(),
            reference.len()
        );

        // Resolved to absolute paths so external processes launched with
        // a scratch working directory still see the right locations; the
        // default configuration ships these as relative paths.
        for dir in [
            &mut settings.paths.scratch_root,
            &mut settings.paths.merged_dir,
            &mut settings.paths.results_dir,
        ] {
            fs::create_dir_all(&dir).map_err(|e| SetupError::Io {
                operation: format!("create directory {}", dir.display()),
                source: e,
            })?;
            *dir = fs::canonicalize(&dir).map_err(|e| SetupError::Io {
                operation: format!("resolve directory {}", dir.display()),
                source: e,
            })?;
        }

        Ok(Self {
            settings,
            additive,
            dominance,
            registry,
            reference,
        })
    }

    /// The validated trait registry for this run.
    pub fn registry(&self) -> &TraitRegistry {
        &self.registry
    }

    /// Process the selected traits sequentially.
    ///
    /// One trait's failure never stops the batch; the summary records
    /// every outcome. An out-of-range index selection is a clean no-op,
    /// so over-provisioned scheduler arrays exit quietly.
    pub fn run(&self, selection: &TraitSelection) -> BatchSummary {
        let codes = self.resolve_selection(selection);
        let mut summary = BatchSummary::default();

        for code in &codes {
            let result = self.run_trait(code);
            if result.success {
                tracing::info!("Trait '{}' completed in {:.1}s", code, result.elapsed_secs);
            } else {
                tracing::error!(
                    "Trait '{}' failed after {:.1}s: {}",
                    code,
                    result.elapsed_secs,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            summary.results.push(result);
        }

        tracing::info!(
            "Batch finished: {} succeeded, {} failed of {} selected",
            summary.succeeded().len(),
            summary.failed().len(),
            codes.len()
        );
        if !summary.failed().is_empty() {
            tracing::warn!("Failed traits: {}", summary.failed().join(", "));
        }
        summary
    }

    /// Run the full pipeline for a single trait.
    pub fn run_trait(&self, code: &str) -> TraitRunResult {
        let start = Instant::now();
        let outcome = self.execute_trait(code);

        match outcome {
            Ok(steps_completed) => TraitRunResult {
                trait_id: code.to_string(),
                success: true,
                error: None,
                steps_completed,
                elapsed_secs: start.elapsed().as_secs_f64(),
            },
            Err(e) => TraitRunResult {
                trait_id: code.to_string(),
                success: false,
                error: Some(e.to_string()),
                steps_completed: Vec::new(),
                elapsed_secs: start.elapsed().as_secs_f64(),
            },
        }
    }

    fn resolve_selection(&self, selection: &TraitSelection) -> Vec<String> {
        match selection {
            TraitSelection::All => self.registry.codes().to_vec(),
            TraitSelection::Index(index) => match self.registry.get(*index) {
                Some(code) => vec![code.to_string()],
                None => {
                    tracing::warn!(
                        "Task index {} is beyond the registry ({} traits); nothing to do",
                        index,
                        self.registry.len()
                    );
                    Vec::new()
                }
            },
            TraitSelection::Codes(codes) => codes.clone(),
        }
    }

    fn execute_trait(&self, code: &str) -> Result<Vec<String>, PipelineError> {
        if !self.registry.contains(code) {
            return Err(PipelineError::setup_failed(
                code,
                "phenotype code is not in the registry",
            ));
        }

        // Registry membership guarantees presence in both catalogs.
        let additive_entry = self
            .additive
            .get(code)
            .ok_or_else(|| PipelineError::setup_failed(code, "missing from additive catalog"))?;
        let dominance_entry = self
            .dominance
            .get(code)
            .ok_or_else(|| PipelineError::setup_failed(code, "missing from dominance catalog"))?;

        let scratch = ScratchDir::create(&self.settings.paths.scratch_root, code)
            .map_err(|e| PipelineError::setup_failed(code, e.to_string()))?;

        let logger = self
            .make_logger(code)
            .map_err(|e| PipelineError::setup_failed(code, e.to_string()))?;

        let ctx = Context {
            trait_id: code.to_string(),
            additive_fetch: additive_entry.fetch.clone(),
            dominance_fetch: dominance_entry.fetch.clone(),
            settings: self.settings.clone(),
            scratch_dir: scratch.path().to_path_buf(),
            merged_dir: self.settings.paths.merged_dir.clone(),
            results_dir: self.settings.paths.results_dir.clone(),
            reference: Arc::clone(&self.reference),
            logger: Arc::new(logger),
        };

        let mut state = TraitState::new(code);
        let run = create_trait_pipeline().run(&ctx, &mut state)?;
        // `scratch` drops here, removing the trait's working files on
        // success and failure alike.
        Ok(run.steps_completed)
    }

    fn make_logger(&self, code: &str) -> std::io::Result<TraitLogger> {
        let config = LogConfig {
            level: self.settings.logging.level,
            show_timestamps: self.settings.logging.show_timestamps,
        };
        if self.settings.logging.per_trait_files {
            TraitLogger::new(code, &self.settings.paths.logs_dir, config, None)
        } else {
            Ok(TraitLogger::detached(code, None))
        }
    }

    /// Path of the log file a trait job would write.
    pub fn log_path_for(&self, code: &str) -> PathBuf {
        self.settings.paths.logs_dir.join(format!("{}.log", code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_catalog(path: &Path, rows: &[(&str, &str, &str)]) {
        let mut file = File::create(path).unwrap();
        writeln!(file, "phenotype_code\tdescription\twget").unwrap();
        for (code, desc, cmd) in rows {
            writeln!(file, "{}\t{}\t{}", code, desc, cmd).unwrap();
        }
    }

    fn write_reference(path: &Path, keys: &[(&str, &str)]) {
        let mut file = File::create(path).unwrap();
        writeln!(file, "variant\tA1\tA2\tSNP").unwrap();
        for (key, snp) in keys {
            writeln!(file, "{}\tA\tG\t{}", key, snp).unwrap();
        }
    }

    fn settings_in(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.paths.additive_catalog = dir.join("a.tsv");
        settings.paths.dominance_catalog = dir.join("d.tsv");
        settings.paths.reference_file = dir.join("ref.txt");
        settings.paths.scratch_root = dir.join("scratch");
        settings.paths.merged_dir = dir.join("merged");
        settings.paths.results_dir = dir.join("results");
        settings.paths.logs_dir = dir.join("logs");
        settings.logging.per_trait_files = false;
        settings
    }

    fn failing_fixture(dir: &Path, codes: &[&str]) -> Settings {
        // `false` exits non-zero, so every trait fails at the fetch step
        let rows: Vec<(&str, &str, String)> = codes
            .iter()
            .map(|c| (*c, "desc", format!("false -O {}.bgz", c)))
            .collect();
        let borrowed: Vec<(&str, &str, &str)> = rows
            .iter()
            .map(|(c, d, w)| (*c, *d, w.as_str()))
            .collect();
        write_catalog(&dir.join("a.tsv"), &borrowed);
        write_catalog(&dir.join("d.tsv"), &borrowed);
        write_reference(&dir.join("ref.txt"), &[("1:100:A:G", "rs100")]);
        settings_in(dir)
    }

    #[test]
    fn setup_fails_on_catalog_mismatch() {
        let dir = TempDir::new().unwrap();
        write_catalog(
            &dir.path().join("a.tsv"),
            &[("X1", "d", "wget https://x/a -O a.bgz")],
        );
        write_catalog(
            &dir.path().join("d.tsv"),
            &[("X2", "d", "wget https://x/b -O b.bgz")],
        );
        write_reference(&dir.path().join("ref.txt"), &[("1:100:A:G", "rs100")]);

        let err = BatchRunner::new(settings_in(dir.path())).unwrap_err();
        assert!(matches!(err, SetupError::Registry(_)));
    }

    #[test]
    fn one_failing_trait_does_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let settings = failing_fixture(dir.path(), &["T1", "T2", "T3"]);

        let runner = BatchRunner::new(settings).unwrap();
        let summary = runner.run(&TraitSelection::All);

        // All three traits were attempted despite each one failing
        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.failed(), vec!["T1", "T2", "T3"]);
        assert!(!summary.all_succeeded());
        for result in &summary.results {
            assert!(result.error.as_deref().unwrap_or("").contains("Fetch"));
        }
    }

    #[test]
    fn scratch_is_removed_after_retrieval_failure() {
        let dir = TempDir::new().unwrap();
        let settings = failing_fixture(dir.path(), &["T1"]);
        let scratch_root = settings.paths.scratch_root.clone();

        let runner = BatchRunner::new(settings).unwrap();
        let result = runner.run_trait("T1");
        assert!(!result.success);

        let leftovers: Vec<_> = fs::read_dir(&scratch_root).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn index_selection_maps_to_sorted_registry() {
        let dir = TempDir::new().unwrap();
        let settings = failing_fixture(dir.path(), &["B2", "A1"]);

        let runner = BatchRunner::new(settings).unwrap();
        // Registry order is sorted, so index 0 is A1
        let summary = runner.run(&TraitSelection::Index(0));
        assert_eq!(summary.results.len(), 1);
        assert_eq!(summary.results[0].trait_id, "A1");
    }

    #[test]
    fn out_of_range_index_is_a_clean_noop() {
        let dir = TempDir::new().unwrap();
        let settings = failing_fixture(dir.path(), &["T1"]);

        let runner = BatchRunner::new(settings).unwrap();
        let summary = runner.run(&TraitSelection::Index(5));
        assert!(summary.results.is_empty());
        assert!(summary.all_succeeded());
    }

    #[test]
    fn unknown_code_is_recorded_as_failure() {
        let dir = TempDir::new().unwrap();
        let settings = failing_fixture(dir.path(), &["T1"]);

        let runner = BatchRunner::new(settings).unwrap();
        let summary = runner.run(&TraitSelection::Codes(vec!["NOPE".to_string()]));
        assert_eq!(summary.failed(), vec!["NOPE"]);
        assert!(summary.results[0]
            .error
            .as_deref()
            .unwrap_or("")
            .contains("not in the registry"));
    }

    #[test]
    fn per_trait_log_file_is_written() {
        let dir = TempDir::new().unwrap();
        let mut settings = failing_fixture(dir.path(), &["T1"]);
        settings.logging.per_trait_files = true;

        let runner = BatchRunner::new(settings).unwrap();
        runner.run_trait("T1");

        let log = runner.log_path_for("T1");
        let content = fs::read_to_string(&log).unwrap();
        assert!(content.contains("=== Fetch ==="));
    }
}
