use thiserror::Error;

/// Failures surfaced by a single prediction call.
///
/// Missing player data is never an error here; it degrades to zero-valued
/// features inside the aggregator.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("feature row is missing model column `{0}`")]
    MissingFeature(String),

    #[error("feature `{0}` is not a finite number")]
    NonFiniteFeature(String),

    #[error("model expects {model} columns but the manifest lists {columns}")]
    ModelWidth { model: usize, columns: usize },

    #[error("classifier returned an unusable probability: {0}")]
    InvalidProbability(f64),
}

pub type PredictResult<T> = std::result::Result<T, PredictError>;
