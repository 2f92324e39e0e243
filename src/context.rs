use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;

/// Win rate that carries no venue information.
pub const NEUTRAL_VENUE_WIN_RATE: f64 = 0.5;

pub const DEFAULT_TEAM_CITIES: [(&str, &str); 8] = [
    ("Chennai Super Kings", "Chennai"),
    ("Mumbai Indians", "Mumbai"),
    ("Royal Challengers Bangalore", "Bangalore"),
    ("Kolkata Knight Riders", "Kolkata"),
    ("Delhi Capitals", "Delhi"),
    ("Rajasthan Royals", "Jaipur"),
    ("Sunrisers Hyderabad", "Hyderabad"),
    ("Punjab Kings", "Chandigarh"),
];

static DEFAULT_CITY_MAP: Lazy<HashMap<String, String>> = Lazy::new(|| {
    DEFAULT_TEAM_CITIES
        .iter()
        .map(|(team, city)| (team.to_string(), city.to_string()))
        .collect()
});

/// Resolves the toss, home and venue context signals for a fixture.
#[derive(Debug, Clone)]
pub struct ContextResolver {
    team_city: HashMap<String, String>,
}

impl Default for ContextResolver {
    fn default() -> Self {
        Self {
            team_city: DEFAULT_CITY_MAP.clone(),
        }
    }
}

impl ContextResolver {
    pub fn with_team_cities(team_city: HashMap<String, String>) -> Self {
        Self { team_city }
    }

    /// Default table extended (or overridden) by a JSON object of
    /// `"team": "city"` pairs.
    pub fn load_overrides(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read team cities {}", path.display()))?;
        let extra = serde_json::from_str::<HashMap<String, String>>(&raw)
            .with_context(|| format!("parse team cities {}", path.display()))?;
        let mut resolver = Self::default();
        for (team, city) in extra {
            let city = city.trim().to_string();
            if city.is_empty() {
                log::warn!("ignoring blank home city for {team}");
                continue;
            }
            resolver.team_city.insert(team.trim().to_string(), city);
        }
        log::info!(
            "team city table has {} entries ({})",
            resolver.team_city.len(),
            path.display()
        );
        Ok(resolver)
    }

    pub fn home_city(&self, team: &str) -> Option<&str> {
        self.team_city.get(team).map(String::as_str)
    }

    /// 1 when the team's home city appears anywhere in the venue text.
    ///
    /// Substring matching is loose: a venue that merely mentions the city
    /// counts as home.
    pub fn is_home_team(&self, team: &str, venue: &str) -> u8 {
        let Some(city) = self.home_city(team) else {
            return 0;
        };
        u8::from(venue.to_lowercase().contains(&city.to_lowercase()))
    }
}

/// 1 iff `toss_winner` is exactly `team1`; no trimming or case folding.
pub fn toss_advantage(team1: &str, toss_winner: &str) -> u8 {
    u8::from(toss_winner == team1)
}

pub fn venue_win_rate_delta(rate: f64) -> f64 {
    rate - NEUTRAL_VENUE_WIN_RATE
}
