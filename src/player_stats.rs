use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

/// Career strength scores for one player.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CareerRecord {
    pub player: String,
    #[serde(default, deserialize_with = "de_stat")]
    pub batting_strength: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub bowling_strength: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub overall_strength: Option<f64>,
}

/// One recent-match snapshot for a player.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecentFormRecord {
    pub player: String,
    #[serde(default, deserialize_with = "de_stat")]
    pub recent_runs: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub recent_wickets: Option<f64>,
    #[serde(default, deserialize_with = "de_stat")]
    pub recent_economy: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct CareerTable {
    rows: Vec<CareerRecord>,
}

/// Recent-form rows in their original order, oldest first.
///
/// Only the last row seen for a player is treated as that player's current
/// form, so callers must hand rows over already sorted by match date.
#[derive(Debug, Clone, Default)]
pub struct RecentFormTable {
    rows: Vec<RecentFormRecord>,
    latest: HashMap<String, usize>,
}

/// Both reference tables, loaded once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct PlayerTables {
    pub career: CareerTable,
    pub recent: RecentFormTable,
}

impl CareerTable {
    pub fn from_records(records: Vec<CareerRecord>) -> Self {
        let rows = records
            .into_iter()
            .filter_map(|mut r| {
                r.player = r.player.trim().to_string();
                (!r.player.is_empty()).then_some(r)
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[CareerRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RecentFormTable {
    pub fn from_records(records: Vec<RecentFormRecord>) -> Self {
        let rows: Vec<RecentFormRecord> = records
            .into_iter()
            .filter_map(|mut r| {
                r.player = r.player.trim().to_string();
                (!r.player.is_empty()).then_some(r)
            })
            .collect();

        let mut latest = HashMap::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            latest.insert(row.player.clone(), idx);
        }
        Self { rows, latest }
    }

    pub fn rows(&self) -> &[RecentFormRecord] {
        &self.rows
    }

    /// Row index of the most recent snapshot for `player`.
    pub fn latest_index(&self, player: &str) -> Option<usize> {
        self.latest.get(player).copied()
    }

    pub fn latest_for(&self, player: &str) -> Option<&RecentFormRecord> {
        self.latest_index(player).map(|idx| &self.rows[idx])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn distinct_players(&self) -> usize {
        self.latest.len()
    }
}

impl PlayerTables {
    pub fn new(career: CareerTable, recent: RecentFormTable) -> Self {
        Self { career, recent }
    }

    pub fn load(career_path: &Path, recent_path: &Path) -> Result<Self> {
        let career = load_career_csv(career_path)?;
        let recent = load_recent_form_csv(recent_path)?;
        log::info!(
            "loaded {} career rows and {} recent-form rows ({} players)",
            career.len(),
            recent.len(),
            recent.distinct_players()
        );
        Ok(Self { career, recent })
    }
}

pub fn load_career_csv(path: &Path) -> Result<CareerTable> {
    let file =
        File::open(path).with_context(|| format!("open career stats {}", path.display()))?;
    read_career_csv(file).with_context(|| format!("parse career stats {}", path.display()))
}

pub fn load_recent_form_csv(path: &Path) -> Result<RecentFormTable> {
    let file =
        File::open(path).with_context(|| format!("open recent form {}", path.display()))?;
    read_recent_form_csv(file).with_context(|| format!("parse recent form {}", path.display()))
}

pub fn read_career_csv<R: Read>(rdr: R) -> Result<CareerTable> {
    let records = read_records::<CareerRecord, R>(rdr)?;
    Ok(CareerTable::from_records(records))
}

pub fn read_recent_form_csv<R: Read>(rdr: R) -> Result<RecentFormTable> {
    let records = read_records::<RecentFormRecord, R>(rdr)?;
    Ok(RecentFormTable::from_records(records))
}

fn read_records<T, R>(rdr: R) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(rdr);
    let mut out = Vec::new();
    for (idx, row) in reader.deserialize::<T>().enumerate() {
        // +2: header line plus 1-based numbering.
        let record = row.with_context(|| format!("csv row {}", idx + 2))?;
        out.push(record);
    }
    Ok(out)
}

fn de_stat<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_stat_cell))
}

fn parse_stat_cell(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}
