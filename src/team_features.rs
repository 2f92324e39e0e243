use std::collections::HashSet;

use serde::Serialize;

use crate::player_stats::{CareerTable, RecentFormTable};

/// Team-level means of the player tables for one starting XI.
///
/// Every field is finite; a field with nothing to average is `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TeamFeatures {
    pub batting: f64,
    pub bowling: f64,
    pub overall: f64,
    pub recent_runs: f64,
    pub recent_wickets: f64,
    pub recent_econ: f64,
}

/// How many distinct roster names matched each table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RosterCoverage {
    pub roster: usize,
    pub career: usize,
    pub recent: usize,
}

pub fn aggregate<S: AsRef<str>>(
    roster: &[S],
    career: &CareerTable,
    recent: &RecentFormTable,
) -> TeamFeatures {
    let members = roster_set(roster);

    let career_rows: Vec<_> = career
        .rows()
        .iter()
        .filter(|r| members.contains(r.player.as_str()))
        .collect();

    let mut recent_idx: Vec<usize> = members
        .iter()
        .filter_map(|p| recent.latest_index(p))
        .collect();
    recent_idx.sort_unstable();
    let recent_rows: Vec<_> = recent_idx.iter().map(|&i| &recent.rows()[i]).collect();

    TeamFeatures {
        batting: mean_or_default(career_rows.iter().map(|r| r.batting_strength)),
        bowling: mean_or_default(career_rows.iter().map(|r| r.bowling_strength)),
        overall: mean_or_default(career_rows.iter().map(|r| r.overall_strength)),
        recent_runs: mean_or_default(recent_rows.iter().map(|r| r.recent_runs)),
        recent_wickets: mean_or_default(recent_rows.iter().map(|r| r.recent_wickets)),
        recent_econ: mean_or_default(recent_rows.iter().map(|r| r.recent_economy)),
    }
}

pub fn coverage<S: AsRef<str>>(
    roster: &[S],
    career: &CareerTable,
    recent: &RecentFormTable,
) -> RosterCoverage {
    let members = roster_set(roster);
    let career_hits: HashSet<&str> = career
        .rows()
        .iter()
        .map(|r| r.player.as_str())
        .filter(|p| members.contains(p))
        .collect();
    RosterCoverage {
        roster: members.len(),
        career: career_hits.len(),
        recent: members
            .iter()
            .filter(|p| recent.latest_index(p).is_some())
            .count(),
    }
}

/// Mean of the present, finite values, or `0.0` when there are none.
///
/// This is the single place where missing player data turns into a default.
pub fn mean_or_default<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values.into_iter().flatten() {
        if !v.is_finite() {
            continue;
        }
        sum += v;
        n += 1;
    }
    if n == 0 { 0.0 } else { sum / n as f64 }
}

fn roster_set<S: AsRef<str>>(roster: &[S]) -> HashSet<&str> {
    roster.iter().map(|p| p.as_ref()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player_stats::{CareerRecord, RecentFormRecord};

    fn career(rows: &[(&str, Option<f64>, Option<f64>, Option<f64>)]) -> CareerTable {
        CareerTable::from_records(
            rows.iter()
                .map(|(p, bat, bowl, all)| CareerRecord {
                    player: p.to_string(),
                    batting_strength: *bat,
                    bowling_strength: *bowl,
                    overall_strength: *all,
                })
                .collect(),
        )
    }

    fn recent(rows: &[(&str, f64, f64, f64)]) -> RecentFormTable {
        RecentFormTable::from_records(
            rows.iter()
                .map(|(p, runs, wkts, econ)| RecentFormRecord {
                    player: p.to_string(),
                    recent_runs: Some(*runs),
                    recent_wickets: Some(*wkts),
                    recent_economy: Some(*econ),
                })
                .collect(),
        )
    }

    #[test]
    fn unknown_roster_is_all_zero() {
        let c = career(&[("A", Some(0.8), Some(0.2), Some(0.5))]);
        let r = recent(&[("A", 30.0, 1.0, 7.5)]);
        let t = aggregate(&["X", "Y"], &c, &r);
        assert_eq!(t, TeamFeatures::default());
    }

    #[test]
    fn empty_roster_is_all_zero() {
        let c = career(&[("A", Some(0.8), None, None)]);
        let t = aggregate::<&str>(&[], &c, &RecentFormTable::default());
        assert_eq!(t, TeamFeatures::default());
    }

    #[test]
    fn means_match_hand_computation() {
        let c = career(&[
            ("A", Some(0.9), Some(0.1), Some(0.6)),
            ("B", Some(0.3), Some(0.7), Some(0.4)),
            ("C", Some(0.5), Some(0.5), Some(0.5)),
        ]);
        let r = recent(&[("A", 40.0, 0.0, 0.0), ("B", 10.0, 2.0, 7.0)]);
        let t = aggregate(&["A", "B", "Z"], &c, &r);
        assert!((t.batting - 0.6).abs() < 1e-12);
        assert!((t.bowling - 0.4).abs() < 1e-12);
        assert!((t.overall - 0.5).abs() < 1e-12);
        assert!((t.recent_runs - 25.0).abs() < 1e-12);
        assert!((t.recent_wickets - 1.0).abs() < 1e-12);
        assert!((t.recent_econ - 3.5).abs() < 1e-12);
    }

    #[test]
    fn missing_values_are_skipped_not_zeroed() {
        let c = career(&[("A", Some(0.8), None, None), ("B", None, Some(0.6), None)]);
        let t = aggregate(&["A", "B"], &c, &RecentFormTable::default());
        assert!((t.batting - 0.8).abs() < 1e-12);
        assert!((t.bowling - 0.6).abs() < 1e-12);
        assert_eq!(t.overall, 0.0);
    }

    #[test]
    fn recent_form_uses_last_row_per_player() {
        let r = recent(&[
            ("A", 5.0, 0.0, 9.0),
            ("B", 20.0, 1.0, 8.0),
            ("A", 55.0, 2.0, 6.0),
        ]);
        let t = aggregate(&["A", "B"], &CareerTable::default(), &r);
        assert!((t.recent_runs - 37.5).abs() < 1e-12);
        assert!((t.recent_wickets - 1.5).abs() < 1e-12);
        assert!((t.recent_econ - 7.0).abs() < 1e-12);
    }

    #[test]
    fn duplicate_roster_names_count_once() {
        let c = career(&[("A", Some(1.0), None, None), ("B", Some(0.0), None, None)]);
        let t = aggregate(&["A", "A", "B"], &c, &RecentFormTable::default());
        assert!((t.batting - 0.5).abs() < 1e-12);
    }

    #[test]
    fn duplicate_career_rows_all_contribute() {
        let c = career(&[("A", Some(1.0), None, None), ("A", Some(0.0), None, None)]);
        let t = aggregate(&["A"], &c, &RecentFormTable::default());
        assert!((t.batting - 0.5).abs() < 1e-12);
    }

    #[test]
    fn names_are_matched_exactly() {
        let c = career(&[("MS Dhoni", Some(0.9), None, None)]);
        let t = aggregate(&["ms dhoni"], &c, &RecentFormTable::default());
        assert_eq!(t.batting, 0.0);
    }

    #[test]
    fn coverage_counts_distinct_matches() {
        let c = career(&[("A", Some(1.0), None, None), ("A", Some(0.5), None, None)]);
        let r = recent(&[("B", 1.0, 1.0, 1.0)]);
        let cov = coverage(&["A", "B", "C", "A"], &c, &r);
        assert_eq!(
            cov,
            RosterCoverage {
                roster: 3,
                career: 1,
                recent: 1
            }
        );
    }

    #[test]
    fn mean_or_default_ignores_non_finite() {
        let m = mean_or_default([Some(1.0), Some(f64::NAN), None, Some(3.0)]);
        assert!((m - 2.0).abs() < 1e-12);
        assert_eq!(mean_or_default(std::iter::empty()), 0.0);
    }
}
