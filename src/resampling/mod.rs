//! Selective resampling module
//!
//! Cost-sensitive selective preprocessing for multi-class imbalanced data:
//! - SPIDER3 relabel/clean/amplify pipeline
//! - Tie-aware k-nearest-neighbor search
//! - Duplicate-tolerant example-set algebra

mod example_set;
mod neighbors;
mod spider;

pub use example_set::{Example, ExampleSet};
pub use neighbors::TieAwareKnn;
pub use spider::{ClassPartition, SPIDER3};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Pipeline step in which a per-class condition arose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStep {
    /// Relabeling removed weak-majority examples into the class
    Relabel,
    /// Cleaning harmful majority neighbors out of the working set
    Clean,
    /// Amplifying examples by duplication
    Amplify,
}

/// Per-class completion status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassStatus {
    /// All three steps ran to completion
    Completed,
    /// The amplify step hit the iteration cap and was cut short
    AmplificationCapped { iterations: usize },
    /// A step could not finish; the class was skipped from that step on
    Aborted { step: PipelineStep, reason: String },
}

/// What happened to one intermediate/minority class during the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassOutcome {
    /// Class label
    pub class: i64,
    /// Removed examples relabeled into this class
    pub relabeled: usize,
    /// Majority examples deleted while cleaning this class's neighborhoods
    pub cleaned: usize,
    /// Duplicate copies appended during amplification
    pub amplified: usize,
    /// Completion status
    pub status: ClassStatus,
}

/// Result of a resampling run
#[derive(Debug, Clone)]
pub struct ResampleOutcome {
    /// Resampled features: surviving working-set rows first, then amplified
    /// rows in append order
    pub x: Array2<f64>,
    /// Labels aligned with `x`
    pub y: Array1<i64>,
    /// Input rows absent from the surviving working set (weak-majority
    /// removals and cleaned neighbors, whether or not later relabeled)
    pub n_removed: usize,
    /// Per-class pipeline reports, in processing order
    pub class_outcomes: Vec<ClassOutcome>,
}

impl ResampleOutcome {
    /// True when no class was capped or aborted
    pub fn fully_completed(&self) -> bool {
        self.class_outcomes
            .iter()
            .all(|c| c.status == ClassStatus::Completed)
    }
}

/// Get class distribution
pub fn class_counts(y: &Array1<i64>) -> std::collections::HashMap<i64, usize> {
    let mut counts = std::collections::HashMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Get indices for each class
pub fn class_indices(y: &Array1<i64>) -> std::collections::HashMap<i64, Vec<usize>> {
    let mut indices = std::collections::HashMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}
