//! Merge/filter stage: join additive and dominance statistics against the
//! reference panel and emit the estimator's input artifact.
//!
//! Both GWAS downloads are gzip TSV files (often block-gzipped, which a
//! multi-member decoder handles transparently). The join is an inner join
//! on the shared variant key, first between the two statistic files and
//! then against the reference panel, so only variants present in all three
//! inputs survive. Rows with a missing or non-numeric statistic are
//! dropped; the estimator cannot handle missing inputs.
//!
//! Output identity is fully determined by the join keys: rows are written
//! sorted by variant key, so identical inputs always produce byte-identical
//! artifacts regardless of input row order.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

use crate::models::ReferenceIndex;

/// Filename suffix of merged per-trait artifacts.
pub const MERGED_SUFFIX: &str = "_gwas_merged.chisq.gz";

/// Column order the external estimator expects.
pub const MERGED_HEADER: [&str; 6] = ["SNP", "A1", "A2", "Z_A", "Z_D", "N"];

const VARIANT_COLUMN: &str = "variant";
const N_COLUMN: &str = "n_complete_samples";
const ADDITIVE_STAT_COLUMN: &str = "tstat";
const DOMINANCE_STAT_COLUMN: &str = "dominance_tstat";

/// Errors from the merge/filter stage. Local to the current trait.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Failed to write merged artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Merge produced no rows for artifact {path}")]
    EmptyOutput { path: PathBuf },
}

/// Counts reported by a successful merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    /// Variants read from the additive file.
    pub additive_rows: usize,
    /// Variants read from the dominance file.
    pub dominance_rows: usize,
    /// Variants written to the merged artifact.
    pub rows_written: usize,
}

struct AdditiveStat {
    n: String,
    tstat: String,
}

/// Merge one trait's additive and dominance statistics against the
/// reference panel and write the gzip TSV artifact to `output_path`.
///
/// The output row count is always ≤ min of the three input row counts.
/// A merge that keeps zero rows removes the artifact and fails with
/// [`MergeError::EmptyOutput`].
pub fn merge(
    additive_path: &Path,
    dominance_path: &Path,
    reference: &ReferenceIndex,
    output_path: &Path,
) -> Result<MergeStats, MergeError> {
    let additive = read_additive(additive_path)?;
    let dominance = read_dominance(dominance_path)?;

    // Inner join additive ⋈ dominance ⋈ reference on the variant key,
    // collected into sorted order for deterministic output.
    let mut keys: Vec<&String> = additive
        .keys()
        .filter(|k| dominance.contains_key(*k) && reference.contains(k))
        .collect();
    keys.sort_unstable();

    let stats = MergeStats {
        additive_rows: additive.len(),
        dominance_rows: dominance.len(),
        rows_written: keys.len(),
    };

    write_artifact(output_path, &keys, &additive, &dominance, reference)?;

    if stats.rows_written == 0 {
        // Never leave an empty artifact behind; the estimator would choke
        // on it and the file would shadow a later successful run.
        let _ = std::fs::remove_file(output_path);
        return Err(MergeError::EmptyOutput {
            path: output_path.to_path_buf(),
        });
    }

    tracing::info!(
        "Merged {} variants into {}",
        stats.rows_written,
        output_path.display()
    );
    Ok(stats)
}

/// A statistic value the estimator can consume: non-empty, not an NA
/// marker, and parseable as a finite float.
fn is_valid_stat(value: &str) -> bool {
    if value.is_empty() || value.eq_ignore_ascii_case("na") || value.eq_ignore_ascii_case("nan") {
        return false;
    }
    value.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

fn gz_reader(path: &Path) -> Result<csv::Reader<BufReader<MultiGzDecoder<File>>>, MergeError> {
    let file = File::open(path).map_err(|e| MergeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(BufReader::new(MultiGzDecoder::new(file))))
}

fn find_column(
    headers: &csv::StringRecord,
    name: &str,
    path: &Path,
) -> Result<usize, MergeError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| MergeError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

fn read_additive(path: &Path) -> Result<HashMap<String, AdditiveStat>, MergeError> {
    let mut reader = gz_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|e| MergeError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?
        .clone();

    let variant_idx = find_column(&headers, VARIANT_COLUMN, path)?;
    let n_idx = find_column(&headers, N_COLUMN, path)?;
    let tstat_idx = find_column(&headers, ADDITIVE_STAT_COLUMN, path)?;

    let mut rows = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| MergeError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

        let key = match record.get(variant_idx) {
            Some(k) if !k.is_empty() => k,
            _ => continue,
        };
        let tstat = record.get(tstat_idx).unwrap_or("");
        if !is_valid_stat(tstat) {
            continue;
        }

        rows.insert(
            key.to_string(),
            AdditiveStat {
                n: record.get(n_idx).unwrap_or("").to_string(),
                tstat: tstat.to_string(),
            },
        );
    }
    Ok(rows)
}

fn read_dominance(path: &Path) -> Result<HashMap<String, String>, MergeError> {
    let mut reader = gz_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|e| MergeError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?
        .clone();

    let variant_idx = find_column(&headers, VARIANT_COLUMN, path)?;
    let dstat_idx = find_column(&headers, DOMINANCE_STAT_COLUMN, path)?;

    let mut rows = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| MergeError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

        let key = match record.get(variant_idx) {
            Some(k) if !k.is_empty() => k,
            _ => continue,
        };
        let dstat = record.get(dstat_idx).unwrap_or("");
        if !is_valid_stat(dstat) {
            continue;
        }

        rows.insert(key.to_string(), dstat.to_string());
    }
    Ok(rows)
}

fn write_artifact(
    output_path: &Path,
    keys: &[&String],
    additive: &HashMap<String, AdditiveStat>,
    dominance: &HashMap<String, String>,
    reference: &ReferenceIndex,
) -> Result<(), MergeError> {
    let write_err = |e: std::io::Error| MergeError::Write {
        path: output_path.to_path_buf(),
        source: e,
    };
    let csv_err = |e: csv::Error| MergeError::Csv {
        path: output_path.to_path_buf(),
        source: e,
    };

    let file = File::create(output_path).map_err(write_err)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(encoder);

    writer.write_record(MERGED_HEADER).map_err(csv_err)?;

    for key in keys {
        // Keys were filtered against all three maps; the lookups cannot
        // miss, but stay on the error path rather than panicking.
        let (add, dom, var) = match (
            additive.get(*key),
            dominance.get(*key),
            reference.get(key),
        ) {
            (Some(a), Some(d), Some(v)) => (a, d, v),
            _ => continue,
        };

        writer
            .write_record([
                var.snp.as_str(),
                var.a1.as_str(),
                var.a2.as_str(),
                add.tstat.as_str(),
                dom.as_str(),
                add.n.as_str(),
            ])
            .map_err(csv_err)?;
    }

    let encoder = writer
        .into_inner()
        .map_err(|e| write_err(std::io::Error::other(e.to_string())))?;
    encoder.finish().map_err(write_err)?;
    Ok(())
}
