use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

/// Binary classifier scoring a row laid out in the manifest column order.
pub trait Classifier: Send + Sync {
    /// Probability that team1 wins.
    fn positive_proba(&self, x: &[f64]) -> f64;

    /// Number of inputs the model was fitted on, when it is fixed.
    fn width(&self) -> Option<usize> {
        None
    }
}

/// Serialized calibrated logistic regression.
///
/// Each fold pairs a logistic model with the calibrator fitted on its
/// held-out split; scoring averages the calibrated fold probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub scaler: Option<Scaler>,
    pub folds: Vec<CalibratedFold>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibratedFold {
    pub coef: Vec<f64>,
    pub intercept: f64,
    pub calibrator: Calibrator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Calibrator {
    /// Platt scaling: `1 / (1 + exp(a * f + b))`.
    Sigmoid { a: f64, b: f64 },
    /// Piecewise-linear map over increasing thresholds, clipped at the ends.
    Isotonic { x: Vec<f64>, y: Vec<f64> },
    #[serde(rename = "none")]
    Identity,
}

#[derive(Debug, Clone)]
pub struct CalibratedLogistic {
    scaler: Option<Scaler>,
    folds: Vec<CalibratedFold>,
}

impl Calibrator {
    pub fn apply(&self, decision: f64) -> f64 {
        match self {
            Calibrator::Sigmoid { a, b } => 1.0 / (1.0 + (a * decision + b).exp()),
            Calibrator::Isotonic { x, y } => interp_clipped(decision, x, y),
            Calibrator::Identity => sigmoid(decision),
        }
    }

    fn check(&self) -> Result<()> {
        if let Calibrator::Isotonic { x, y } = self {
            if x.is_empty() || x.len() != y.len() {
                bail!(
                    "isotonic calibrator needs matching non-empty thresholds (x={}, y={})",
                    x.len(),
                    y.len()
                );
            }
            if x.windows(2).any(|w| w[1] < w[0]) {
                bail!("isotonic thresholds are not sorted");
            }
        }
        Ok(())
    }
}

impl CalibratedLogistic {
    /// Checks the artifact against the column manifest it will be fed with.
    pub fn from_artifact(artifact: ModelArtifact, columns: &[String]) -> Result<Self> {
        let width = columns.len();
        if artifact.folds.is_empty() {
            bail!("model artifact has no calibrated folds");
        }
        if !artifact.feature_names.is_empty() && artifact.feature_names != columns {
            bail!(
                "model feature names {:?} disagree with manifest {:?}",
                artifact.feature_names,
                columns
            );
        }
        if let Some(scaler) = &artifact.scaler
            && (scaler.means.len() != width || scaler.stds.len() != width)
        {
            bail!(
                "scaler has {}/{} entries for {} columns",
                scaler.means.len(),
                scaler.stds.len(),
                width
            );
        }
        for (idx, fold) in artifact.folds.iter().enumerate() {
            if fold.coef.len() != width {
                bail!(
                    "fold {idx} has {} coefficients for {} columns",
                    fold.coef.len(),
                    width
                );
            }
            fold.calibrator
                .check()
                .with_context(|| format!("fold {idx}"))?;
        }
        Ok(Self {
            scaler: artifact.scaler,
            folds: artifact.folds,
        })
    }

    pub fn fold_count(&self) -> usize {
        self.folds.len()
    }

    fn standardized(&self, raw: f64, idx: usize) -> f64 {
        let Some(scaler) = &self.scaler else {
            return raw;
        };
        let std = scaler.stds[idx];
        // Constant columns were scaled by 1.0 at training time.
        let std = if std.abs() < f64::EPSILON { 1.0 } else { std };
        (raw - scaler.means[idx]) / std
    }
}

impl Classifier for CalibratedLogistic {
    fn positive_proba(&self, x: &[f64]) -> f64 {
        let z: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(idx, v)| self.standardized(*v, idx))
            .collect();
        let total: f64 = self
            .folds
            .iter()
            .map(|fold| {
                let decision = fold.intercept
                    + fold.coef.iter().zip(&z).map(|(c, v)| c * v).sum::<f64>();
                fold.calibrator.apply(decision)
            })
            .sum();
        (total / self.folds.len() as f64).clamp(0.0, 1.0)
    }

    fn width(&self) -> Option<usize> {
        self.folds.first().map(|fold| fold.coef.len())
    }
}

pub fn load_feature_columns(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read feature columns {}", path.display()))?;
    let columns = serde_json::from_str::<Vec<String>>(&raw)
        .with_context(|| format!("parse feature columns {}", path.display()))?;
    if columns.is_empty() {
        return Err(anyhow!("feature column manifest {} is empty", path.display()));
    }
    Ok(columns)
}

pub fn load_model(path: &Path, columns: &[String]) -> Result<CalibratedLogistic> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read model {}", path.display()))?;
    let artifact = serde_json::from_str::<ModelArtifact>(&raw)
        .with_context(|| format!("parse model {}", path.display()))?;
    log::info!(
        "model v{} from {} ({} folds, generated {})",
        artifact.version,
        path.display(),
        artifact.folds.len(),
        artifact.generated_at.as_deref().unwrap_or("unknown")
    );
    CalibratedLogistic::from_artifact(artifact, columns)
        .with_context(|| format!("validate model {}", path.display()))
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

fn interp_clipped(v: f64, xs: &[f64], ys: &[f64]) -> f64 {
    if v.is_nan() {
        return f64::NAN;
    }
    let last = xs.len() - 1;
    if v <= xs[0] {
        return ys[0];
    }
    if v >= xs[last] {
        return ys[last];
    }
    let hi = xs.partition_point(|x| *x <= v);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    if span <= 0.0 {
        return ys[hi];
    }
    let t = (v - xs[lo]) / span;
    ys[lo] + t * (ys[hi] - ys[lo])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    fn fold(coef: Vec<f64>, intercept: f64, calibrator: Calibrator) -> CalibratedFold {
        CalibratedFold {
            coef,
            intercept,
            calibrator,
        }
    }

    fn artifact(folds: Vec<CalibratedFold>) -> ModelArtifact {
        ModelArtifact {
            version: 2,
            generated_at: None,
            source: None,
            feature_names: Vec::new(),
            scaler: None,
            folds,
        }
    }

    #[test]
    fn sigmoid_calibrator_matches_platt_formula() {
        let c = Calibrator::Sigmoid { a: -2.0, b: 0.0 };
        assert!((c.apply(0.0) - 0.5).abs() < 1e-12);
        let expected = 1.0 / (1.0 + (-2.0_f64).exp());
        assert!((c.apply(1.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn isotonic_interpolates_and_clips() {
        let c = Calibrator::Isotonic {
            x: vec![-1.0, 0.0, 1.0],
            y: vec![0.2, 0.4, 0.9],
        };
        assert!((c.apply(-5.0) - 0.2).abs() < 1e-12);
        assert!((c.apply(0.5) - 0.65).abs() < 1e-12);
        assert!((c.apply(0.0) - 0.4).abs() < 1e-12);
        assert!((c.apply(3.0) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn folds_are_averaged() {
        let model = CalibratedLogistic::from_artifact(
            artifact(vec![
                fold(vec![0.0], 0.0, Calibrator::Identity),
                fold(
                    vec![0.0],
                    0.0,
                    Calibrator::Isotonic {
                        x: vec![0.0],
                        y: vec![0.9],
                    },
                ),
            ]),
            &cols(1),
        )
        .unwrap();
        assert!((model.positive_proba(&[3.0]) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn scaler_standardizes_before_coefficients() {
        let mut a = artifact(vec![fold(vec![1.0, 1.0], 0.0, Calibrator::Identity)]);
        a.scaler = Some(Scaler {
            means: vec![1.0, 5.0],
            stds: vec![2.0, 0.0],
        });
        let model = CalibratedLogistic::from_artifact(a, &cols(2)).unwrap();
        // z = [(3-1)/2, (5-5)/1] = [1, 0]
        let expected = 1.0 / (1.0 + (-1.0_f64).exp());
        assert!((model.positive_proba(&[3.0, 5.0]) - expected).abs() < 1e-12);
    }

    #[test]
    fn coefficient_width_must_match_manifest() {
        let a = artifact(vec![fold(vec![1.0], 0.0, Calibrator::Identity)]);
        let err = CalibratedLogistic::from_artifact(a, &cols(9)).unwrap_err();
        assert!(err.to_string().contains("coefficients"));
    }

    #[test]
    fn nan_decision_passes_through_isotonic() {
        let c = Calibrator::Isotonic {
            x: vec![-1.0, 0.0, 1.0],
            y: vec![0.2, 0.4, 0.9],
        };
        assert!(c.apply(f64::NAN).is_nan());
    }

    #[test]
    fn width_reports_coefficient_count() {
        let a = artifact(vec![fold(vec![1.0, 0.5, 0.0], 0.0, Calibrator::Identity)]);
        let model = CalibratedLogistic::from_artifact(a, &cols(3)).unwrap();
        assert_eq!(model.width(), Some(3));
    }

    #[test]
    fn empty_artifact_is_rejected() {
        assert!(CalibratedLogistic::from_artifact(artifact(Vec::new()), &cols(1)).is_err());
    }

    #[test]
    fn artifact_feature_names_must_match_manifest() {
        let mut a = artifact(vec![fold(vec![1.0, 1.0], 0.0, Calibrator::Identity)]);
        a.feature_names = vec!["f1".into(), "f0".into()];
        assert!(CalibratedLogistic::from_artifact(a, &cols(2)).is_err());
    }

    #[test]
    fn calibrator_json_is_tagged_by_method() {
        let raw = r#"[{"method":"sigmoid","a":-1.5,"b":0.1},{"method":"none"},{"method":"isotonic","x":[0.0],"y":[0.3]}]"#;
        let parsed: Vec<Calibrator> = serde_json::from_str(raw).unwrap();
        assert!(matches!(parsed[0], Calibrator::Sigmoid { .. }));
        assert!(matches!(parsed[1], Calibrator::Identity));
        assert!(matches!(parsed[2], Calibrator::Isotonic { .. }));
    }
}
