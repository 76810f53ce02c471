//! Error types for pile group analysis

use thiserror::Error;

/// Main error type for pile group operations
#[derive(Error, Debug)]
pub enum PileError {
    #[error("Soil layer index {0} out of range")]
    LayerNotFound(usize),

    #[error("Pile index {0} out of range")]
    PileNotFound(usize),

    #[error("Pile group is full: at most {0} piles are supported")]
    PileCapacityExceeded(usize),

    #[error("Model has no piles")]
    NoPiles,

    #[error("Mesh generation failed: {0}")]
    MeshError(String),

    #[error("Singular stiffness matrix - model may be unstable or have insufficient supports")]
    SingularMatrix,

    #[error("Analysis did not converge at load step {step} after {iterations} iterations")]
    NotConverged { step: usize, iterations: usize },

    #[error("Model not analyzed - run rebuild_and_analyze() first")]
    NotAnalyzed,

    #[error("Not a recognized model file: {0}")]
    UnrecognizedFile(String),

    #[error("Unsupported model file version '{0}'")]
    UnsupportedVersion(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for pile group operations
pub type PileResult<T> = Result<T, PileError>;
