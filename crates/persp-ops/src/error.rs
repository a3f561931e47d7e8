//! Error types for projection operations.

use persp_compute::ComputeError;
use persp_math::MathError;
use thiserror::Error;

use crate::project::Degeneracy;

/// Error type for projection operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// A required input image is missing.
    #[error("missing input: {0}")]
    MissingInput(&'static str),

    /// Projected quadrilateral failed a validity check.
    #[error("degenerate projection: {0}")]
    Degenerate(#[from] Degeneracy),

    /// Homography solve failed.
    #[error("warp solve failed: {0}")]
    Math(#[from] MathError),

    /// Backend failure.
    #[error("compute error: {0}")]
    Compute(#[from] ComputeError),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Parameter file could not be read.
    #[error("failed to read parameters: {0}")]
    Io(#[from] std::io::Error),

    /// Parameter file could not be parsed.
    #[error("failed to parse parameters: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for projection operations.
pub type OpsResult<T> = Result<T, OpsError>;
