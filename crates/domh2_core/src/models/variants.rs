//! Reference variant panel.
//!
//! The reference index restricts every trait's merged output to a
//! pre-filtered, analysis-ready variant set. It is loaded once per run
//! from an externally-prepared TSV and shared read-only across all trait
//! jobs.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use thiserror::Error;

const VARIANT_COLUMN: &str = "variant";
const A1_COLUMN: &str = "A1";
const A2_COLUMN: &str = "A2";
const SNP_COLUMN: &str = "SNP";

/// Errors from loading the reference panel.
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Failed to open reference file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read reference file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Reference file {path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Reference file {path} contains no variants")]
    Empty { path: PathBuf },
}

/// Allele and identifier metadata for one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    /// Stable SNP identifier (rsid).
    pub snp: String,
    /// Effect allele label.
    pub a1: String,
    /// Other allele label.
    pub a2: String,
}

/// Immutable map from variant key to allele/identifier metadata.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    variants: HashMap<String, VariantRecord>,
}

impl ReferenceIndex {
    /// Load the reference panel from a TSV file with header columns
    /// `variant`, `A1`, `A2`, `SNP`.
    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let file = File::open(path).map_err(|e| ReferenceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(BufReader::new(file));

        let headers = reader
            .headers()
            .map_err(|e| ReferenceError::Csv {
                path: path.to_path_buf(),
                source: e,
            })?
            .clone();

        let variant_idx = find_column(&headers, VARIANT_COLUMN, path)?;
        let a1_idx = find_column(&headers, A1_COLUMN, path)?;
        let a2_idx = find_column(&headers, A2_COLUMN, path)?;
        let snp_idx = find_column(&headers, SNP_COLUMN, path)?;

        let mut variants = HashMap::new();
        for record in reader.records() {
            let record = record.map_err(|e| ReferenceError::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;

            let key = match record.get(variant_idx) {
                Some(k) if !k.is_empty() => k.to_string(),
                _ => continue,
            };

            variants.insert(
                key,
                VariantRecord {
                    snp: record.get(snp_idx).unwrap_or("").to_string(),
                    a1: record.get(a1_idx).unwrap_or("").to_string(),
                    a2: record.get(a2_idx).unwrap_or("").to_string(),
                },
            );
        }

        if variants.is_empty() {
            return Err(ReferenceError::Empty {
                path: path.to_path_buf(),
            });
        }

        tracing::info!("Loaded {} reference variants from {}", variants.len(), path.display());
        Ok(Self { variants })
    }

    /// Look up a variant by key.
    pub fn get(&self, variant_key: &str) -> Option<&VariantRecord> {
        self.variants.get(variant_key)
    }

    /// Whether the panel contains a variant key.
    pub fn contains(&self, variant_key: &str) -> bool {
        self.variants.contains_key(variant_key)
    }

    /// Number of variants in the panel.
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Whether the panel is empty.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Build an index directly from records (test support and embedding).
    pub fn from_records(records: impl IntoIterator<Item = (String, VariantRecord)>) -> Self {
        Self {
            variants: records.into_iter().collect(),
        }
    }
}

fn find_column(
    headers: &csv::StringRecord,
    name: &str,
    path: &Path,
) -> Result<usize, ReferenceError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ReferenceError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn load_indexes_by_variant_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ref.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "variant\tchr\tA1\tA2\tSNP").unwrap();
        writeln!(file, "1:100:A:G\t1\tA\tG\trs100").unwrap();
        writeln!(file, "2:200:C:T\t2\tC\tT\trs200").unwrap();

        let index = ReferenceIndex::load(&path).unwrap();
        assert_eq!(index.len(), 2);
        let rec = index.get("1:100:A:G").unwrap();
        assert_eq!(rec.snp, "rs100");
        assert_eq!(rec.a1, "A");
        assert_eq!(rec.a2, "G");
        assert!(!index.contains("3:300:G:A"));
    }

    #[test]
    fn load_rejects_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ref.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "variant\tA1\tA2").unwrap();
        writeln!(file, "1:100:A:G\tA\tG").unwrap();

        let err = ReferenceIndex::load(&path).unwrap_err();
        assert!(matches!(err, ReferenceError::MissingColumn { column, .. } if column == "SNP"));
    }

    #[test]
    fn load_rejects_empty_panel() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ref.txt");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "variant\tA1\tA2\tSNP").unwrap();

        let err = ReferenceIndex::load(&path).unwrap_err();
        assert!(matches!(err, ReferenceError::Empty { .. }));
    }
}
