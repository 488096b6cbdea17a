//! Trait catalogs: code, description, and retrieval instruction per trait.
//!
//! A catalog is a TSV file with a header row naming at least the columns
//! `phenotype_code`, `description`, and `wget`. Two catalogs exist per run,
//! one for additive and one for dominance statistics, and both are loaded
//! read-only before any trait work begins.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::fetch::{FetchCommand, FetchParseError};

/// Required catalog columns.
const CODE_COLUMN: &str = "phenotype_code";
const DESCRIPTION_COLUMN: &str = "description";
const COMMAND_COLUMN: &str = "wget";

/// Errors from loading a catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to open catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read catalog {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Catalog {path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Catalog {path} row {row} has an empty phenotype code")]
    EmptyCode { path: PathBuf, row: usize },

    #[error("Catalog {path} lists phenotype code '{code}' more than once")]
    DuplicateCode { path: PathBuf, code: String },

    #[error("Catalog {path}: bad retrieval instruction for '{code}': {source}")]
    BadInstruction {
        path: PathBuf,
        code: String,
        #[source]
        source: FetchParseError,
    },
}

/// One catalog row.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Canonical phenotype code.
    pub code: String,
    /// Human-readable trait description.
    pub description: String,
    /// Structured retrieval command for this trait's statistic file.
    pub fetch: FetchCommand,
}

/// An immutable mapping from phenotype code to catalog entry.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    /// Load a catalog from a TSV file.
    ///
    /// Every row's retrieval instruction is parsed up front so that a
    /// malformed instruction fails the run before any trait work starts.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let file = File::open(path).map_err(|e| CatalogError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| CatalogError::Csv {
                path: path.to_path_buf(),
                source: e,
            })?
            .clone();

        let code_idx = find_column(&headers, CODE_COLUMN, path)?;
        let desc_idx = find_column(&headers, DESCRIPTION_COLUMN, path)?;
        let cmd_idx = find_column(&headers, COMMAND_COLUMN, path)?;

        let mut entries = BTreeMap::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| CatalogError::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;

            let code = record.get(code_idx).unwrap_or("").trim().to_string();
            if code.is_empty() {
                return Err(CatalogError::EmptyCode {
                    path: path.to_path_buf(),
                    // +2: one for the header line, one for 1-based counting
                    row: row + 2,
                });
            }

            let description = record.get(desc_idx).unwrap_or("").trim().to_string();
            let instruction = record.get(cmd_idx).unwrap_or("");

            let fetch =
                FetchCommand::parse(instruction).map_err(|e| CatalogError::BadInstruction {
                    path: path.to_path_buf(),
                    code: code.clone(),
                    source: e,
                })?;

            let entry = CatalogEntry {
                code: code.clone(),
                description,
                fetch,
            };
            if entries.insert(code.clone(), entry).is_some() {
                return Err(CatalogError::DuplicateCode {
                    path: path.to_path_buf(),
                    code,
                });
            }
        }

        Ok(Self { entries })
    }

    /// Look up an entry by phenotype code.
    pub fn get(&self, code: &str) -> Option<&CatalogEntry> {
        self.entries.get(code)
    }

    /// Iterate over phenotype codes in sorted order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of traits in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a code → description map for the result compiler.
    pub fn descriptions(&self) -> HashMap<String, String> {
        self.entries
            .values()
            .map(|e| (e.code.clone(), e.description.clone()))
            .collect()
    }
}

fn find_column(
    headers: &csv::StringRecord,
    name: &str,
    path: &Path,
) -> Result<usize, CatalogError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| CatalogError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_catalog(dir: &TempDir, name: &str, rows: &[(&str, &str, &str)]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "phenotype_code\tdescription\twget").unwrap();
        for (code, desc, cmd) in rows {
            writeln!(file, "{}\t{}\t{}", code, desc, cmd).unwrap();
        }
        path
    }

    #[test]
    fn load_parses_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(
            &dir,
            "a.tsv",
            &[
                ("50_irnt", "Standing height", "wget https://x/50.bgz -O 50_irnt.add.bgz"),
                ("21001", "Body mass index", "wget https://x/21001.bgz -O 21001.add.bgz"),
            ],
        );

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        let entry = catalog.get("50_irnt").unwrap();
        assert_eq!(entry.description, "Standing height");
        assert_eq!(entry.fetch.output_name(), "50_irnt.add.bgz");
        // Codes iterate in sorted order
        let codes: Vec<_> = catalog.codes().collect();
        assert_eq!(codes, vec!["21001", "50_irnt"]);
    }

    #[test]
    fn load_rejects_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.tsv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "phenotype_code\tdescription").unwrap();
        writeln!(file, "50_irnt\tHeight").unwrap();

        let err = Catalog::load(&path).unwrap_err();
        assert!(matches!(err, CatalogError::MissingColumn { column, .. } if column == "wget"));
    }

    #[test]
    fn load_rejects_bad_instruction() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(&dir, "a.tsv", &[("50_irnt", "Height", "wget https://x/50")]);

        let err = Catalog::load(&path).unwrap_err();
        assert!(matches!(err, CatalogError::BadInstruction { code, .. } if code == "50_irnt"));
    }

    #[test]
    fn load_rejects_duplicate_code() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(
            &dir,
            "a.tsv",
            &[
                ("50_irnt", "Height", "wget https://x/a -O a.bgz"),
                ("50_irnt", "Height again", "wget https://x/b -O b.bgz"),
            ],
        );

        let err = Catalog::load(&path).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateCode { code, .. } if code == "50_irnt"));
    }

    #[test]
    fn descriptions_map_for_compiler() {
        let dir = TempDir::new().unwrap();
        let path = write_catalog(
            &dir,
            "a.tsv",
            &[("50_irnt", "Standing height", "wget https://x/a -O a.bgz")],
        );

        let catalog = Catalog::load(&path).unwrap();
        let map = catalog.descriptions();
        assert_eq!(map.get("50_irnt").map(String::as_str), Some("Standing height"));
    }
}
