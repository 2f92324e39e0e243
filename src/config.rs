use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use log::LevelFilter;

use crate::context::ContextResolver;
use crate::engine::MatchEngine;
use crate::model;
use crate::player_stats::PlayerTables;
use crate::predictor::PredictionService;

const DEFAULT_CAREER_STATS: &str = "data/processed/player_career_stats.csv";
const DEFAULT_RECENT_FORM: &str = "data/processed/player_recent_form.csv";
const DEFAULT_MODEL: &str = "models/calibrated_logistic_v2.json";
const DEFAULT_FEATURE_COLUMNS: &str = "models/feature_columns_v2.json";
const DEFAULT_PARALLELISM: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub career_stats_path: PathBuf,
    pub recent_form_path: PathBuf,
    pub model_path: PathBuf,
    pub feature_columns_path: PathBuf,
    pub team_cities_path: Option<PathBuf>,
    pub parallelism: usize,
    pub log_level: LevelFilter,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            career_stats_path: PathBuf::from(DEFAULT_CAREER_STATS),
            recent_form_path: PathBuf::from(DEFAULT_RECENT_FORM),
            model_path: PathBuf::from(DEFAULT_MODEL),
            feature_columns_path: PathBuf::from(DEFAULT_FEATURE_COLUMNS),
            team_cities_path: None,
            parallelism: DEFAULT_PARALLELISM,
            log_level: LevelFilter::Info,
        }
    }
}

impl AppConfig {
    /// Reads `.env.local` and `.env` (first one wins per key), then the
    /// process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };
        Self {
            career_stats_path: path("PREDICT_CAREER_STATS_PATH", DEFAULT_CAREER_STATS),
            recent_form_path: path("PREDICT_RECENT_FORM_PATH", DEFAULT_RECENT_FORM),
            model_path: path("PREDICT_MODEL_PATH", DEFAULT_MODEL),
            feature_columns_path: path("PREDICT_FEATURE_COLUMNS_PATH", DEFAULT_FEATURE_COLUMNS),
            team_cities_path: lookup("PREDICT_TEAM_CITIES_PATH")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            parallelism: lookup("PREDICT_PARALLELISM")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(DEFAULT_PARALLELISM)
                .clamp(1, 32),
            log_level: lookup("PREDICT_LOG")
                .and_then(|v| LevelFilter::from_str(v.trim()).ok())
                .unwrap_or(LevelFilter::Info),
        }
    }

    /// `--career`, `--recent`, `--model`, `--columns`, `--team-cities`
    /// override the environment.
    pub fn apply_args(&mut self, args: &[String]) {
        if let Some(v) = arg_value(args, "--career") {
            self.career_stats_path = PathBuf::from(v);
        }
        if let Some(v) = arg_value(args, "--recent") {
            self.recent_form_path = PathBuf::from(v);
        }
        if let Some(v) = arg_value(args, "--model") {
            self.model_path = PathBuf::from(v);
        }
        if let Some(v) = arg_value(args, "--columns") {
            self.feature_columns_path = PathBuf::from(v);
        }
        if let Some(v) = arg_value(args, "--team-cities") {
            self.team_cities_path = Some(PathBuf::from(v));
        }
    }

    /// Loads every startup artifact; any failure aborts startup.
    pub fn load_engine(&self) -> Result<MatchEngine> {
        let tables = PlayerTables::load(&self.career_stats_path, &self.recent_form_path)?;
        let columns = model::load_feature_columns(&self.feature_columns_path)?;
        let classifier = model::load_model(&self.model_path, &columns)?;
        let resolver = match &self.team_cities_path {
            Some(path) => ContextResolver::load_overrides(path)?,
            None => ContextResolver::default(),
        };
        let service = PredictionService::new(Box::new(classifier), columns)
            .with_context(|| format!("model {}", self.model_path.display()))?;
        Ok(MatchEngine::new(tables, resolver, service))
    }
}

/// Value of `--name value` or `--name=value`.
pub fn arg_value(args: &[String], name: &str) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && !raw.trim().is_empty()
        {
            return Some(raw.trim().to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

pub fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
}
