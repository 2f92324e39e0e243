use serde::Serialize;

use crate::error::{PredictError, PredictResult};
use crate::feature_row::{FEATURE_COLUMNS, FeatureSource};
use crate::model::Classifier;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WinProbabilities {
    pub team1_win_prob: f64,
    pub team2_win_prob: f64,
}

/// Scores feature rows with a classifier loaded once at startup.
pub struct PredictionService {
    classifier: Box<dyn Classifier>,
    columns: Vec<String>,
}

impl PredictionService {
    /// Fails when the classifier was fitted on a different number of inputs
    /// than `columns` lists.
    pub fn new(classifier: Box<dyn Classifier>, columns: Vec<String>) -> PredictResult<Self> {
        if let Some(model) = classifier.width()
            && model != columns.len()
        {
            return Err(PredictError::ModelWidth {
                model,
                columns: columns.len(),
            });
        }
        if columns.iter().map(String::as_str).ne(FEATURE_COLUMNS) {
            log::warn!(
                "model columns {:?} differ from feature row layout {:?}",
                columns,
                FEATURE_COLUMNS
            );
        }
        Ok(Self {
            classifier,
            columns,
        })
    }

    /// Service whose model consumes the builder's column order verbatim.
    pub fn with_default_columns(classifier: Box<dyn Classifier>) -> PredictResult<Self> {
        Self::new(
            classifier,
            FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Lays `features` out in model column order. Every value must be finite.
    pub fn project<F: FeatureSource + ?Sized>(&self, features: &F) -> PredictResult<Vec<f64>> {
        self.columns
            .iter()
            .map(|col| match features.feature(col) {
                None => Err(PredictError::MissingFeature(col.clone())),
                Some(v) if !v.is_finite() => Err(PredictError::NonFiniteFeature(col.clone())),
                Some(v) => Ok(v),
            })
            .collect()
    }

    /// Team1 probability rounded to 3 places, team2 taking the complement.
    pub fn predict<F: FeatureSource + ?Sized>(
        &self,
        features: &F,
    ) -> PredictResult<WinProbabilities> {
        let x = self.project(features)?;
        let p1 = self.classifier.positive_proba(&x);
        if !p1.is_finite() || !(0.0..=1.0).contains(&p1) {
            return Err(PredictError::InvalidProbability(p1));
        }
        Ok(WinProbabilities {
            team1_win_prob: round3(p1),
            team2_win_prob: round3(1.0 - p1),
        })
    }
}

/// Rounds to 3 decimals from the exact binary value, so 0.1235 (stored
/// just below the half) becomes 0.123.
pub fn round3(v: f64) -> f64 {
    format!("{v:.3}").parse().unwrap_or(v)
}
