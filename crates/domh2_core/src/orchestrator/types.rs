//! Core types for the per-trait pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::fetch::FetchCommand;
use crate::logging::TraitLogger;
use crate::merge::MERGED_SUFFIX;
use crate::models::ReferenceIndex;

/// Read-only context passed to pipeline steps.
///
/// Contains one trait's configuration and the run-wide shared resources.
/// Mutable per-trait state goes in [`TraitState`].
pub struct Context {
    /// Phenotype code of the trait being processed.
    pub trait_id: String,
    /// Retrieval command for the additive statistics file.
    pub additive_fetch: FetchCommand,
    /// Retrieval command for the dominance statistics file.
    pub dominance_fetch: FetchCommand,
    /// Application settings.
    pub settings: Settings,
    /// Exclusive scratch directory for this trait job.
    pub scratch_dir: PathBuf,
    /// Directory merged artifacts are written to.
    pub merged_dir: PathBuf,
    /// Directory estimator results are collected into.
    pub results_dir: PathBuf,
    /// Shared read-only reference panel.
    pub reference: Arc<ReferenceIndex>,
    /// Per-trait logger.
    pub logger: Arc<TraitLogger>,
}

impl Context {
    /// Path of this trait's merged artifact.
    pub fn merged_artifact_path(&self) -> PathBuf {
        self.merged_dir
            .join(format!("{}{}", self.trait_id, MERGED_SUFFIX))
    }
}

/// Mutable per-trait state that accumulates results from pipeline steps.
///
/// Each step's output is stored in its own section; a populated section
/// marks that stage of the trait's state machine as reached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraitState {
    /// Phenotype code.
    pub trait_id: String,
    /// When the trait job started.
    pub started_at: Option<String>,
    /// Fetch results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch: Option<FetchOutput>,
    /// Merge results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeOutput>,
    /// Estimation results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<EstimateOutput>,
}

impl TraitState {
    /// Create a new state for the given trait.
    pub fn new(trait_id: impl Into<String>) -> Self {
        Self {
            trait_id: trait_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Check if both retrievals completed.
    pub fn has_fetch(&self) -> bool {
        self.fetch.is_some()
    }

    /// Check if the merge completed.
    pub fn has_merge(&self) -> bool {
        self.merge.is_some()
    }
}

/// Output from the Fetch step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutput {
    /// Local path of the additive statistics file.
    pub additive_path: PathBuf,
    /// Local path of the dominance statistics file.
    pub dominance_path: PathBuf,
}

/// Output from the Merge step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOutput {
    /// Path of the merged artifact.
    pub artifact_path: PathBuf,
    /// Variants written to the artifact.
    pub rows_written: usize,
}

/// Output from the Estimate step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateOutput {
    /// Result files copied into the results directory.
    pub result_files: Vec<PathBuf>,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (not an error).
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_state_tracks_completion() {
        let mut state = TraitState::new("50_irnt");
        assert!(!state.has_fetch());
        assert!(!state.has_merge());

        state.fetch = Some(FetchOutput {
            additive_path: PathBuf::from("/scratch/a.bgz"),
            dominance_path: PathBuf::from("/scratch/d.bgz"),
        });
        assert!(state.has_fetch());
    }

    #[test]
    fn trait_state_serializes() {
        let state = TraitState::new("50_irnt");
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"trait_id\":\"50_irnt\""));
        // Unreached sections are omitted entirely
        assert!(!json.contains("fetch"));
    }
}
