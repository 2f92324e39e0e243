use rayon::prelude::*;
use serde::Serialize;

use crate::context::{ContextResolver, NEUTRAL_VENUE_WIN_RATE};
use crate::error::PredictResult;
use crate::feature_row::{FeatureRow, build_feature_row};
use crate::player_stats::PlayerTables;
use crate::predictor::PredictionService;
use crate::request::{MatchRequest, MatchResponse};
use crate::team_features::{self, RosterCoverage, TeamFeatures};

/// Everything behind one prediction: tables, context and model.
///
/// Built once at startup and only read afterwards, so a single engine can
/// serve concurrent requests without locking.
pub struct MatchEngine {
    tables: PlayerTables,
    resolver: ContextResolver,
    service: PredictionService,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchExplanation {
    pub team1_features: TeamFeatures,
    pub team2_features: TeamFeatures,
    pub team1_coverage: RosterCoverage,
    pub team2_coverage: RosterCoverage,
    pub feature_row: FeatureRow,
    pub response: MatchResponse,
}

impl MatchEngine {
    pub fn new(tables: PlayerTables, resolver: ContextResolver, service: PredictionService) -> Self {
        Self {
            tables,
            resolver,
            service,
        }
    }

    pub fn tables(&self) -> &PlayerTables {
        &self.tables
    }

    pub fn predict(&self, req: &MatchRequest) -> PredictResult<MatchResponse> {
        req.validate()?;
        let (t1, t2) = self.team_features(req);
        let row = self.feature_row(req, &t1, &t2);
        self.respond(req, &row)
    }

    pub fn explain(&self, req: &MatchRequest) -> PredictResult<MatchExplanation> {
        req.validate()?;
        let (t1, t2) = self.team_features(req);
        let row = self.feature_row(req, &t1, &t2);
        let response = self.respond(req, &row)?;
        Ok(MatchExplanation {
            team1_features: t1,
            team2_features: t2,
            team1_coverage: self.coverage(&req.xi1),
            team2_coverage: self.coverage(&req.xi2),
            feature_row: row,
            response,
        })
    }

    /// Scores every request independently; output order follows input order.
    pub fn predict_batch(&self, reqs: &[MatchRequest]) -> Vec<PredictResult<MatchResponse>> {
        reqs.par_iter().map(|req| self.predict(req)).collect()
    }

    fn team_features(&self, req: &MatchRequest) -> (TeamFeatures, TeamFeatures) {
        let tables = &self.tables;
        let t1 = team_features::aggregate(req.xi1.as_slice(), &tables.career, &tables.recent);
        let t2 = team_features::aggregate(req.xi2.as_slice(), &tables.career, &tables.recent);
        if log::log_enabled!(log::Level::Debug) {
            let c1 = self.coverage(&req.xi1);
            let c2 = self.coverage(&req.xi2);
            log::debug!(
                "{}: career {}/{} recent {}/{}; {}: career {}/{} recent {}/{}",
                req.team1,
                c1.career,
                c1.roster,
                c1.recent,
                c1.roster,
                req.team2,
                c2.career,
                c2.roster,
                c2.recent,
                c2.roster
            );
        }
        (t1, t2)
    }

    fn coverage(&self, xi: &[String]) -> RosterCoverage {
        team_features::coverage(xi, &self.tables.career, &self.tables.recent)
    }

    fn feature_row(&self, req: &MatchRequest, t1: &TeamFeatures, t2: &TeamFeatures) -> FeatureRow {
        build_feature_row(
            &self.resolver,
            &req.team1,
            &req.team2,
            t1,
            t2,
            &req.venue,
            &req.toss.winner,
            req.toss.decision,
            NEUTRAL_VENUE_WIN_RATE,
        )
    }

    fn respond(&self, req: &MatchRequest, row: &FeatureRow) -> PredictResult<MatchResponse> {
        let probs = self.service.predict(row)?;
        Ok(MatchResponse {
            team1: req.team1.clone(),
            team2: req.team2.clone(),
            team1_win_prob: probs.team1_win_prob,
            team2_win_prob: probs.team2_win_prob,
        })
    }
}
