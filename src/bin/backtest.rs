use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use ipl_predictor::MatchRequest;
use ipl_predictor::calibration::{self, calibration_bins, expected_calibration_error};
use ipl_predictor::config::{AppConfig, arg_value};

const DEFAULT_BINS: usize = 10;

/// A played fixture: the pre-match request plus who actually won.
#[derive(Debug, Deserialize)]
struct LabelledMatch {
    #[serde(flatten)]
    request: MatchRequest,
    winner: String,
}

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let path = arg_value(&args, "--fixtures")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/labelled_matches.json"));
    let bins = arg_value(&args, "--bins")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_BINS)
        .clamp(2, 50);

    let mut cfg = AppConfig::from_env();
    cfg.apply_args(&args);
    env_logger::Builder::new()
        .filter_level(cfg.log_level)
        .format_timestamp(None)
        .try_init()
        .context("install logger")?;
    let engine = cfg.load_engine().context("startup failed")?;

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read fixtures {}", path.display()))?;
    let fixtures = serde_json::from_str::<Vec<LabelledMatch>>(&raw)
        .with_context(|| format!("parse fixtures {}", path.display()))?;

    let mut predictions = Vec::with_capacity(fixtures.len());
    let mut outcomes = Vec::with_capacity(fixtures.len());
    let mut skipped = 0usize;

    for (idx, m) in fixtures.iter().enumerate() {
        let req = &m.request;
        let won = if m.winner == req.team1 {
            true
        } else if m.winner == req.team2 {
            false
        } else {
            // No result or abandoned.
            log::warn!("fixture {idx}: winner {:?} is neither side", m.winner);
            skipped += 1;
            continue;
        };
        match engine.predict(req) {
            Ok(resp) => {
                predictions.push(resp.team1_win_prob);
                outcomes.push(won);
            }
            Err(err) => {
                log::warn!("fixture {idx}: {err}");
                skipped += 1;
            }
        }
    }

    if predictions.is_empty() {
        return Err(anyhow!("no fixture could be scored"));
    }

    let metrics = calibration::evaluate_probs(&predictions, &outcomes);
    let reliability = calibration_bins(&predictions, &outcomes, bins);
    let ece = expected_calibration_error(&reliability);

    println!("Pre-match backtest ({})", chrono::Utc::now().format("%Y-%m-%d %H:%M UTC"));
    println!("Fixtures: {}", path.display());
    println!("Model: {}", cfg.model_path.display());
    println!("Scored: {} (skipped {})", metrics.samples, skipped);
    println!();
    println!(
        "brier={:.4} log_loss={:.4} accuracy={:.3} ece={:.4}",
        metrics.brier, metrics.log_loss, metrics.accuracy, ece
    );
    println!();
    for b in reliability.iter().filter(|b| b.count > 0) {
        println!(
            "[{:.2}, {:.2}) n={:<4} pred={:.3} actual={:.3}",
            b.bucket_start, b.bucket_end, b.count, b.avg_pred, b.actual_rate
        );
    }

    Ok(())
}
