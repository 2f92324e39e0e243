use serde::{Deserialize, Serialize};

use crate::error::{PredictError, PredictResult};

pub const MAX_XI: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TossDecision {
    Bat,
    Field,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toss {
    pub winner: String,
    pub decision: TossDecision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub team1: String,
    pub team2: String,
    pub xi1: Vec<String>,
    pub xi2: Vec<String>,
    pub venue: String,
    pub toss: Toss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResponse {
    pub team1: String,
    pub team2: String,
    pub team1_win_prob: f64,
    pub team2_win_prob: f64,
}

impl MatchRequest {
    pub fn validate(&self) -> PredictResult<()> {
        for (field, value) in [
            ("team1", &self.team1),
            ("team2", &self.team2),
            ("venue", &self.venue),
        ] {
            if value.trim().is_empty() {
                return Err(PredictError::InvalidRequest(format!("{field} is blank")));
            }
        }
        for (field, xi) in [("xi1", &self.xi1), ("xi2", &self.xi2)] {
            if xi.len() > MAX_XI {
                return Err(PredictError::InvalidRequest(format!(
                    "{field} has {} players, at most {MAX_XI} allowed",
                    xi.len()
                )));
            }
        }
        Ok(())
    }

    pub fn parse_json(raw: &str) -> PredictResult<Self> {
        serde_json::from_str(raw).map_err(|e| PredictError::InvalidRequest(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = r#"{
        "team1": "Chennai Super Kings",
        "team2": "Mumbai Indians",
        "xi1": ["MS Dhoni", "RD Gaikwad"],
        "xi2": ["RG Sharma"],
        "venue": "MA Chidambaram Stadium, Chepauk, Chennai",
        "toss": {"winner": "Mumbai Indians", "decision": "field"}
    }"#;

    #[test]
    fn parses_request_shape() {
        let req = MatchRequest::parse_json(RAW).expect("valid request");
        assert_eq!(req.xi1.len(), 2);
        assert_eq!(req.toss.decision, TossDecision::Field);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn unknown_toss_decision_is_rejected() {
        let raw = RAW.replace("\"field\"", "\"bowl\"");
        let err = MatchRequest::parse_json(&raw).unwrap_err();
        assert!(matches!(err, PredictError::InvalidRequest(_)));
    }

    #[test]
    fn missing_field_is_rejected() {
        let raw = RAW.replace("\"venue\": \"MA Chidambaram Stadium, Chepauk, Chennai\",", "");
        assert!(MatchRequest::parse_json(&raw).is_err());
    }

    #[test]
    fn oversized_xi_fails_validation() {
        let mut req = MatchRequest::parse_json(RAW).unwrap();
        req.xi2 = (0..12).map(|i| format!("P{i}")).collect();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("xi2"));
    }

    #[test]
    fn blank_team_fails_validation() {
        let mut req = MatchRequest::parse_json(RAW).unwrap();
        req.team2 = "  ".into();
        assert!(matches!(req.validate(), Err(PredictError::InvalidRequest(_))));
    }

    #[test]
    fn empty_xi_is_allowed() {
        let mut req = MatchRequest::parse_json(RAW).unwrap();
        req.xi1.clear();
        assert!(req.validate().is_ok());
    }
}
