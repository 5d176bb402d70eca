//! Selective resampling for multi-class imbalanced datasets
//!
//! This crate rewrites a labeled dataset under a user-supplied
//! misclassification cost matrix: harmful majority examples are removed,
//! ambiguous removed examples are relabeled into nearby minority classes,
//! and minority examples that remain costly to misclassify are amplified
//! by duplication. The intended effect is better downstream recall on
//! minority classes without giving up cost-sensitive reasoning.
//!
//! # Modules
//!
//! - [`resampling`] - SPIDER3 resampler, tie-aware k-NN, example-set algebra
//! - [`error`] - Error types and `Result` alias
//!
//! # Example
//!
//! ```no_run
//! use selective_resampling::prelude::*;
//! use ndarray::{array, Array2};
//!
//! let x: Array2<f64> = array![[0.0], [1.0], [2.0], [10.0], [11.0]];
//! let y = array![0i64, 0, 0, 1, 1];
//! let cost = array![[0.0, 1.0], [5.0, 0.0]];
//!
//! let partition = ClassPartition::new(vec![0], vec![], vec![1]).unwrap();
//! let resampler = SPIDER3::new(3, cost, partition).unwrap();
//! let outcome = resampler.fit_transform(&x, &y).unwrap();
//! println!("{} rows after resampling", outcome.x.nrows());
//! ```

// Core error handling
pub mod error;

// Resampling core
pub mod resampling;

pub use error::{ResampleError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ResampleError, Result};

    // Resampling
    pub use crate::resampling::{
        class_counts, class_indices, ClassOutcome, ClassPartition, ClassStatus, Example,
        ExampleSet, PipelineStep, ResampleOutcome, TieAwareKnn, SPIDER3,
    };
}
