//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Every path the pipeline touches is an explicit configuration value;
//! no component reads the ambient current directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// External estimator invocation settings.
    #[serde(default)]
    pub estimator: EstimatorSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration for inputs, scratch space, and outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Catalog of additive summary statistics (trait code, description,
    /// retrieval command).
    #[serde(default = "default_additive_catalog")]
    pub additive_catalog: PathBuf,

    /// Catalog of dominance summary statistics.
    #[serde(default = "default_dominance_catalog")]
    pub dominance_catalog: PathBuf,

    /// Pre-filtered reference variant panel (TSV with variant/A1/A2/SNP).
    #[serde(default = "default_reference_file")]
    pub reference_file: PathBuf,

    /// Root under which per-trait scratch directories are created.
    #[serde(default = "default_scratch_root")]
    pub scratch_root: PathBuf,

    /// Directory for merged per-trait artifacts.
    #[serde(default = "default_merged_dir")]
    pub merged_dir: PathBuf,

    /// Directory the estimator's result files are collected into.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Directory for per-trait log files.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    /// Path of the compiled summary CSV.
    #[serde(default = "default_summary_csv")]
    pub summary_csv: PathBuf,
}

fn default_additive_catalog() -> PathBuf {
    PathBuf::from("catalogs/a_sumStats.tsv")
}

fn default_dominance_catalog() -> PathBuf {
    PathBuf::from("catalogs/d_sumStats.tsv")
}

fn default_reference_file() -> PathBuf {
    PathBuf::from("ref_genome/snp_hm3_adj.txt")
}

fn default_scratch_root() -> PathBuf {
    PathBuf::from(".scratch")
}

fn default_merged_dir() -> PathBuf {
    PathBuf::from("sumstats_merged")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("ldsc_results")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from(".logs")
}

fn default_summary_csv() -> PathBuf {
    PathBuf::from("dominance_h2_results.csv")
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            additive_catalog: default_additive_catalog(),
            dominance_catalog: default_dominance_catalog(),
            reference_file: default_reference_file(),
            scratch_root: default_scratch_root(),
            merged_dir: default_merged_dir(),
            results_dir: default_results_dir(),
            logs_dir: default_logs_dir(),
            summary_csv: default_summary_csv(),
        }
    }
}

/// External estimator configuration.
///
/// The estimator is treated as a black box invoked with a fixed flag set.
/// Its executable path is supplied here explicitly, resolved once before the
/// pipeline starts; there is no runtime environment discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorSettings {
    /// Path to the estimator executable (e.g. a legacy interpreter).
    /// When empty, the estimation step is skipped and the pipeline only
    /// produces merged artifacts.
    #[serde(default)]
    pub executable: PathBuf,

    /// Optional script passed as the executable's first argument.
    #[serde(default)]
    pub script: Option<PathBuf>,

    /// LD-score path template; `@` is substituted per chromosome by the
    /// estimator itself.
    #[serde(default = "default_ld_scores_prefix")]
    pub ld_scores_prefix: String,

    /// Block-jackknife block count.
    #[serde(default = "default_n_blocks")]
    pub n_blocks: u32,

    /// Statistic-value cap. The default is large enough to disable outlier
    /// truncation.
    #[serde(default = "default_chisq_max")]
    pub chisq_max: u64,

    /// Ask the estimator to write its `.h2` result file.
    #[serde(default = "default_true")]
    pub write_h2: bool,
}

fn default_ld_scores_prefix() -> String {
    "LD_scores/1000G.EUR.QC.chr@".to_string()
}

fn default_n_blocks() -> u32 {
    200
}

fn default_chisq_max() -> u64 {
    10_000_000_000
}

fn default_true() -> bool {
    true
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            executable: PathBuf::new(),
            script: None,
            ld_scores_prefix: default_ld_scores_prefix(),
            n_blocks: default_n_blocks(),
            chisq_max: default_chisq_max(),
            write_h2: true,
        }
    }
}

impl EstimatorSettings {
    /// Whether an estimator executable has been configured.
    pub fn is_configured(&self) -> bool {
        !self.executable.as_os_str().is_empty()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level for per-trait log output.
    #[serde(default)]
    pub level: crate::logging::LogLevel,

    /// Write a per-trait log file under `paths.logs_dir`.
    #[serde(default = "default_true")]
    pub per_trait_files: bool,

    /// Show timestamps in per-trait log output.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: crate::logging::LogLevel::default(),
            per_trait_files: true,
            show_timestamps: true,
        }
    }
}
