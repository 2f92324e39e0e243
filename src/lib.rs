pub mod calibration;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod feature_row;
pub mod model;
pub mod player_stats;
pub mod predictor;
pub mod request;
pub mod team_features;

pub use engine::MatchEngine;
pub use error::{PredictError, PredictResult};
pub use request::{MatchRequest, MatchResponse};
