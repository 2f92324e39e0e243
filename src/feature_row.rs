use std::collections::HashMap;

use serde::Serialize;

use crate::context::{ContextResolver, toss_advantage, venue_win_rate_delta};
use crate::request::TossDecision;
use crate::team_features::TeamFeatures;

/// Column order the classifier was trained on. Never reorder.
pub const FEATURE_COLUMNS: [&str; 9] = [
    "batting_diff",
    "bowling_diff",
    "overall_diff",
    "recent_runs_diff",
    "recent_wickets_diff",
    "recent_econ_diff",
    "toss_adv",
    "home_adv",
    "venue_win_rate_diff",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureRow {
    pub batting_diff: f64,
    pub bowling_diff: f64,
    pub overall_diff: f64,
    pub recent_runs_diff: f64,
    pub recent_wickets_diff: f64,
    pub recent_econ_diff: f64,
    pub toss_adv: u8,
    pub home_adv: u8,
    pub venue_win_rate_diff: f64,
}

/// Anything the prediction service can read named features from.
pub trait FeatureSource {
    fn feature(&self, name: &str) -> Option<f64>;
}

impl FeatureRow {
    /// Values in `FEATURE_COLUMNS` order.
    pub fn values(&self) -> [f64; 9] {
        [
            self.batting_diff,
            self.bowling_diff,
            self.overall_diff,
            self.recent_runs_diff,
            self.recent_wickets_diff,
            self.recent_econ_diff,
            f64::from(self.toss_adv),
            f64::from(self.home_adv),
            self.venue_win_rate_diff,
        ]
    }

    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_COLUMNS.into_iter().zip(self.values())
    }
}

impl FeatureSource for FeatureRow {
    fn feature(&self, name: &str) -> Option<f64> {
        let idx = FEATURE_COLUMNS.iter().position(|c| *c == name)?;
        Some(self.values()[idx])
    }
}

impl FeatureSource for HashMap<String, f64> {
    fn feature(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

/// Difference features for team1 relative to team2, plus match context.
///
/// `_toss_decision` is accepted for callers but does not feed any feature.
#[allow(clippy::too_many_arguments)]
pub fn build_feature_row(
    resolver: &ContextResolver,
    team1: &str,
    _team2: &str,
    t1: &TeamFeatures,
    t2: &TeamFeatures,
    venue: &str,
    toss_winner: &str,
    _toss_decision: TossDecision,
    venue_win_rate: f64,
) -> FeatureRow {
    FeatureRow {
        batting_diff: t1.batting - t2.batting,
        bowling_diff: t1.bowling - t2.bowling,
        overall_diff: t1.overall - t2.overall,
        recent_runs_diff: t1.recent_runs - t2.recent_runs,
        recent_wickets_diff: t1.recent_wickets - t2.recent_wickets,
        recent_econ_diff: t1.recent_econ - t2.recent_econ,
        toss_adv: toss_advantage(team1, toss_winner),
        home_adv: resolver.is_home_team(team1, venue),
        venue_win_rate_diff: venue_win_rate_delta(venue_win_rate),
    }
}
