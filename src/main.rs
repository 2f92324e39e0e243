use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use ipl_predictor::config::{AppConfig, arg_value, has_flag};
use ipl_predictor::{MatchEngine, MatchRequest, MatchResponse};

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum BatchItem {
    Ok(MatchResponse),
    Err { error: String },
}

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        print_usage();
        return Ok(());
    }

    let mut cfg = AppConfig::from_env();
    cfg.apply_args(&args);
    env_logger::Builder::new()
        .filter_level(cfg.log_level)
        .format_timestamp(None)
        .try_init()
        .context("install logger")?;

    let engine = cfg.load_engine().context("startup failed")?;

    if let Some(path) = arg_value(&args, "--batch") {
        return run_batch(&engine, Path::new(&path), cfg.parallelism);
    }

    let raw = match arg_value(&args, "--request") {
        Some(path) if path != "-" => fs::read_to_string(&path)
            .with_context(|| format!("read request {path}"))?,
        _ => read_stdin()?,
    };
    let req = MatchRequest::parse_json(&raw)?;

    let out = if has_flag(&args, "--explain") {
        serde_json::to_string_pretty(&engine.explain(&req)?)?
    } else {
        serde_json::to_string_pretty(&engine.predict(&req)?)?
    };
    println!("{out}");
    Ok(())
}

fn run_batch(engine: &MatchEngine, path: &Path, parallelism: usize) -> Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read batch {}", path.display()))?;
    let reqs = serde_json::from_str::<Vec<MatchRequest>>(&raw)
        .with_context(|| format!("parse batch {}", path.display()))?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism)
        .build()
        .context("build scoring pool")?;
    let results = pool.install(|| engine.predict_batch(&reqs));

    let mut failed = 0usize;
    let items: Vec<BatchItem> = results
        .into_iter()
        .enumerate()
        .map(|(idx, res)| match res {
            Ok(resp) => BatchItem::Ok(resp),
            Err(err) => {
                failed += 1;
                log::warn!("request {idx} rejected: {err}");
                BatchItem::Err {
                    error: err.to_string(),
                }
            }
        })
        .collect();

    log::info!("scored {} of {} requests", reqs.len() - failed, reqs.len());
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .context("read request from stdin")?;
    Ok(raw)
}

fn print_usage() {
    println!("usage: ipl_predictor [--request FILE|-] [--explain] [--batch FILE]");
    println!("                     [--career CSV] [--recent CSV] [--model JSON]");
    println!("                     [--columns JSON] [--team-cities JSON]");
    println!();
    println!("Reads one match request (stdin by default) and prints win probabilities.");
    println!("Paths default to PREDICT_* environment variables, then data/ and models/.");
}
