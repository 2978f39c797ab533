use thiserror::Error;

/// Failures while decoding the assets handed to a session
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("timeline JSON could not be decoded: {0}")]
    Json(#[from] serde_json::Error),

    #[error("timeline quantity drops at step {index}: {previous} then {value}")]
    NonMonotonic {
        index: usize,
        previous: f64,
        value: f64,
    },

    #[error("timeline quantity at step {index} is not a finite non-negative number")]
    InvalidQuantity { index: usize },

    #[error("silhouette point cloud is empty")]
    EmptySilhouette,

    #[error("shape mesh {name} has no vertices")]
    EmptyMesh { name: String },
}

pub type Result<T> = std::result::Result<T, AssetError>;
