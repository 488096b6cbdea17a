//! Result compiler: reconcile per-trait estimator output files into one
//! validated summary table.
//!
//! The estimator writes one whitespace-delimited result file per trait,
//! named `<code>_dom_h2.h2`. The first line carries the trait code
//! followed by the estimates; the heritability fields sit at fixed
//! positions. Each file is validated independently: a malformed file is
//! rejected with a reason and the rest of the batch still compiles.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::TraitResult;

/// Filename suffix of per-trait estimator result files.
pub const RESULT_SUFFIX: &str = "_dom_h2.h2";

/// Minimum number of whitespace-delimited fields on the result line.
pub const MIN_RESULT_FIELDS: usize = 25;

/// Field positions on the result line (0-based).
pub const TRAIT_CODE_FIELD: usize = 0;
pub const ADDITIVE_H2_FIELD: usize = 9;
pub const ADDITIVE_SE_FIELD: usize = 10;
pub const DOMINANCE_H2_FIELD: usize = 23;
pub const DOMINANCE_SE_FIELD: usize = 24;

/// Description used when a trait code is absent from the catalog.
const UNKNOWN_DESCRIPTION: &str = "Unknown";

/// Validation failures for one result file. Rejection is per-file; the
/// compile pass continues with the remaining files.
#[derive(Error, Debug)]
pub enum ResultFileError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is empty")]
    Empty { path: PathBuf },

    #[error("{path} has {found} fields, expected at least {MIN_RESULT_FIELDS}")]
    TooFewFields { path: PathBuf, found: usize },

    #[error(
        "{path} is named for trait '{filename_code}' but its result line \
         reports trait '{embedded_code}'"
    )]
    IdentityMismatch {
        path: PathBuf,
        filename_code: String,
        embedded_code: String,
    },
}

/// Fatal errors for the compile pass as a whole.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Failed to read results directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write summary {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// A result file that failed validation, with the reason.
#[derive(Debug)]
pub struct RejectedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a compile pass.
#[derive(Debug, Default)]
pub struct CompileReport {
    /// Accepted results, sorted by trait code.
    pub results: Vec<TraitResult>,
    /// Files that failed validation.
    pub rejected: Vec<RejectedFile>,
}

/// Scan `results_dir` for estimator result files and compile the accepted
/// ones, sorted by trait code. `descriptions` maps trait codes to catalog
/// descriptions; codes without an entry get "Unknown".
pub fn compile(
    results_dir: &Path,
    descriptions: &std::collections::HashMap<String, String>,
) -> Result<CompileReport, CompileError> {
    let entries = fs::read_dir(results_dir).map_err(|e| CompileError::ReadDir {
        path: results_dir.to_path_buf(),
        source: e,
    })?;

    let mut accepted = BTreeMap::new();
    let mut rejected = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| CompileError::ReadDir {
            path: results_dir.to_path_buf(),
            source: e,
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(code) = name.strip_suffix(RESULT_SUFFIX) else {
            continue;
        };

        let path = entry.path();
        match parse_result_file(&path, code) {
            Ok(fields) => {
                let description = descriptions
                    .get(code)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string());
                accepted.insert(
                    code.to_string(),
                    TraitResult {
                        trait_id: code.to_string(),
                        trait_name: description,
                        additive_h2: fields.additive_h2,
                        additive_se: fields.additive_se,
                        dominance_h2: fields.dominance_h2,
                        dominance_se: fields.dominance_se,
                    },
                );
            }
            Err(e) => {
                tracing::warn!("Rejected {}: {}", path.display(), e);
                rejected.push(RejectedFile {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Compiled {} result(s), rejected {}",
        accepted.len(),
        rejected.len()
    );
    Ok(CompileReport {
        // BTreeMap iteration order gives the sorted summary
        results: accepted.into_values().collect(),
        rejected,
    })
}

/// Write the compiled results as a CSV summary.
///
/// Returns `false` without touching the filesystem when there is nothing
/// to write; an empty summary file would look like a completed batch.
pub fn write_summary(results: &[TraitResult], path: &Path) -> Result<bool, CompileError> {
    if results.is_empty() {
        tracing::warn!("No valid results to compile; summary not written");
        return Ok(false);
    }

    let map_err = |e: csv::Error| CompileError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    let mut writer = csv::Writer::from_path(path).map_err(map_err)?;
    for result in results {
        writer.serialize(result).map_err(map_err)?;
    }
    writer.flush().map_err(|e| CompileError::Write {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;

    tracing::info!("Wrote {} result(s) to {}", results.len(), path.display());
    Ok(true)
}

struct ResultFields {
    additive_h2: String,
    additive_se: String,
    dominance_h2: String,
    dominance_se: String,
}

/// Parse and validate one result file. `filename_code` is the trait code
/// derived from the filename; the embedded code must match it exactly.
fn parse_result_file(path: &Path, filename_code: &str) -> Result<ResultFields, ResultFileError> {
    let content = fs::read_to_string(path).map_err(|e| ResultFileError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let line = content
        .lines()
        .next()
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| ResultFileError::Empty {
            path: path.to_path_buf(),
        })?;

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_RESULT_FIELDS {
        return Err(ResultFileError::TooFewFields {
            path: path.to_path_buf(),
            found: fields.len(),
        });
    }

    let embedded_code = fields[TRAIT_CODE_FIELD];
    if embedded_code != filename_code {
        return Err(ResultFileError::IdentityMismatch {
            path: path.to_path_buf(),
            filename_code: filename_code.to_string(),
            embedded_code: embedded_code.to_string(),
        });
    }

    Ok(ResultFields {
        additive_h2: fields[ADDITIVE_H2_FIELD].to_string(),
        additive_se: fields[ADDITIVE_SE_FIELD].to_string(),
        dominance_h2: fields[DOMINANCE_H2_FIELD].to_string(),
        dominance_se: fields[DOMINANCE_SE_FIELD].to_string(),
    })
}
