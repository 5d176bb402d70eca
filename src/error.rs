//! Error types for selective resampling

use thiserror::Error;

/// Result type alias for resampling operations
pub type Result<T> = std::result::Result<T, ResampleError>;

/// Main error type for the resampling pipeline
#[derive(Error, Debug)]
pub enum ResampleError {
    #[error("Invalid class partition: {0}")]
    InvalidPartition(String),

    #[error("Cost matrix mismatch: expected {expected}x{expected}, got {rows}x{cols}")]
    CostMatrixMismatch {
        expected: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Degenerate neighborhood: {0}")]
    DegenerateNeighborhood(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}
