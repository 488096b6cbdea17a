//! Trait registry: the authoritative, validated set of traits to process.
//!
//! Built by set-intersecting the additive and dominance catalogs. The two
//! catalogs must carry identical code sets; any asymmetry aborts the whole
//! run before trait work begins, since a partial registry has no meaning.

use std::collections::BTreeSet;

use thiserror::Error;

use super::catalog::Catalog;

/// Errors from registry construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The catalogs' phenotype-code sets differ.
    #[error(
        "Phenotype codes do not match between catalogs!\n\
         Codes missing in dominance catalog: {missing_in_dominance:?}\n\
         Codes missing in additive catalog: {missing_in_additive:?}"
    )]
    CodeSetMismatch {
        /// Codes present in the additive catalog only.
        missing_in_dominance: Vec<String>,
        /// Codes present in the dominance catalog only.
        missing_in_additive: Vec<String>,
    },
}

/// The deterministic, sorted list of traits for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitRegistry {
    codes: Vec<String>,
}

impl TraitRegistry {
    /// Build the registry from the two catalogs.
    ///
    /// Fails with [`RegistryError::CodeSetMismatch`] enumerating exactly
    /// which codes are missing from which side. On success the codes are
    /// sorted ascending, guaranteeing a reproducible processing order
    /// across runs and across array-task invocations.
    pub fn build(additive: &Catalog, dominance: &Catalog) -> Result<Self, RegistryError> {
        let a_codes: BTreeSet<&str> = additive.codes().collect();
        let d_codes: BTreeSet<&str> = dominance.codes().collect();

        if a_codes != d_codes {
            let missing_in_dominance = a_codes
                .difference(&d_codes)
                .map(|c| c.to_string())
                .collect();
            let missing_in_additive = d_codes
                .difference(&a_codes)
                .map(|c| c.to_string())
                .collect();
            return Err(RegistryError::CodeSetMismatch {
                missing_in_dominance,
                missing_in_additive,
            });
        }

        // BTreeSet iteration is already ascending.
        let codes = a_codes.into_iter().map(String::from).collect();
        Ok(Self { codes })
    }

    /// All codes in sorted order.
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// The code at a given array-task index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.codes.get(index).map(String::as_str)
    }

    /// Whether a code belongs to the registry.
    pub fn contains(&self, code: &str) -> bool {
        self.codes.binary_search_by(|c| c.as_str().cmp(code)).is_ok()
    }

    /// Number of traits.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Iterate over codes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}
