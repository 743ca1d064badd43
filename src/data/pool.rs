// Player pool loading and merging.
//
// Two source files feed the engine:
//  * the DraftKings entries CSV ("DKEntries.csv"), whose top section lists
//    the user's contest entries and whose bottom section is the slate's
//    player pool;
//  * a projections CSV (ID, Name, Projection, optional Own_Proj).
//
// Rows are merged on the numeric player ID. A row whose salary cannot be
// parsed is excluded with a warning, never coerced to zero: a free-looking
// player would corrupt every downstream objective.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::warn;

use super::player::{label_is_locked, parse_positions, Player};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("could not find player pool section in {path}")]
    MissingPoolSection { path: String },

    #[error("no projection files matching {pattern} found in {dir}")]
    NoProjections { dir: String, pattern: String },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// One row of the entries file's player-pool section. Extra columns
/// (TeamAbbrev, AvgPointsPerGame, ...) are absorbed by `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
struct RawPoolRow {
    #[serde(rename = "Name + ID")]
    name_id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Roster Position")]
    roster_position: String,
    #[serde(rename = "Salary")]
    salary: String,
    #[serde(rename = "Game Info", default)]
    game_info: String,
    #[serde(flatten)]
    _extra: HashMap<String, serde_json::Value>,
}

/// One row of the projections CSV.
#[derive(Debug, Deserialize)]
struct RawProjection {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Projection")]
    projection: f64,
    #[serde(rename = "Own_Proj", default)]
    ownership: Option<f64>,
    #[serde(flatten)]
    _extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy)]
struct ProjectionEntry {
    projection: f64,
    ownership: Option<f64>,
}

// ---------------------------------------------------------------------------
// Merge policy
// ---------------------------------------------------------------------------

/// How to treat pool rows with no matching projection row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionJoin {
    /// Exclude the row (lineup generation: an unprojected player has no
    /// business in a fresh roster).
    Require,
    /// Keep the row with projection 0.0 (late swap: a locked player must
    /// remain resolvable even when the projections file dropped them).
    Optional,
}

// ---------------------------------------------------------------------------
// "Game Info" parsing
// ---------------------------------------------------------------------------

/// Split a "Game Info" value (e.g. "BKN@OKC 02/20/2026 07:30PM ET") into
/// the game identifier and, when present, the start time. Status strings
/// like "Postponed" produce no start time.
pub fn parse_game_info(info: &str) -> (String, Option<NaiveDateTime>) {
    let mut tokens = info.split_whitespace();
    let game = tokens.next().unwrap_or("").to_string();
    let date = tokens.next();
    let time = tokens.next();
    let start = match (date, time) {
        (Some(date), Some(time)) => {
            NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%m/%d/%Y %I:%M%p").ok()
        }
        _ => None,
    };
    (game, start)
}

/// Normalize a raw ID cell: trim and strip any trailing ".0" float suffix.
fn normalize_id(raw: &str) -> String {
    raw.trim().split('.').next().unwrap_or("").to_string()
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

const POOL_SECTION_HEADER: &str = "Position,Name + ID,Name,ID";

/// Locate the player-pool section of the entries file and parse its rows.
fn read_pool_rows(entries_text: &str, path: &str) -> Result<Vec<RawPoolRow>, PoolError> {
    let section_start = entries_text
        .lines()
        .position(|line| line.contains(POOL_SECTION_HEADER))
        .ok_or_else(|| PoolError::MissingPoolSection {
            path: path.to_string(),
        })?;

    let section: String = entries_text
        .lines()
        .skip(section_start)
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(section.as_bytes());

    let mut rows = Vec::new();
    for result in reader.deserialize::<RawPoolRow>() {
        match result {
            Ok(row) => {
                if normalize_id(&row.id).is_empty() {
                    continue;
                }
                rows.push(row);
            }
            Err(e) => warn!("skipping malformed player pool row: {}", e),
        }
    }
    Ok(rows)
}

fn read_projections<R: Read>(rdr: R) -> Result<HashMap<String, ProjectionEntry>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut map = HashMap::new();
    for result in reader.deserialize::<RawProjection>() {
        match result {
            Ok(raw) => {
                if !raw.projection.is_finite() {
                    warn!("skipping projection for ID {}: non-finite value", raw.id);
                    continue;
                }
                let id = normalize_id(&raw.id);
                if map.contains_key(&id) {
                    warn!("duplicate projection for ID {}, using latest value", id);
                }
                map.insert(
                    id,
                    ProjectionEntry {
                        projection: raw.projection,
                        ownership: raw.ownership.filter(|o| o.is_finite()),
                    },
                );
            }
            Err(e) => warn!("skipping malformed projection row: {}", e),
        }
    }
    Ok(map)
}

/// Merge pool rows with projections into solver-eligible `Player` records.
fn merge_players(
    rows: Vec<RawPoolRow>,
    projections: &HashMap<String, ProjectionEntry>,
    join: ProjectionJoin,
) -> Vec<Player> {
    let mut players = Vec::new();
    for row in rows {
        let id = normalize_id(&row.id);

        let salary = match row.salary.trim().parse::<u32>() {
            Ok(s) if s > 0 => s,
            _ => {
                warn!(
                    "excluding player {} ({}): unparseable salary '{}'",
                    row.name.trim(),
                    id,
                    row.salary
                );
                continue;
            }
        };

        let positions = parse_positions(&row.roster_position);
        if positions.is_empty() {
            warn!(
                "excluding player {} ({}): no recognizable positions in '{}'",
                row.name.trim(),
                id,
                row.roster_position
            );
            continue;
        }

        let projection = match (projections.get(&id), join) {
            (Some(entry), _) => Some(*entry),
            (None, ProjectionJoin::Require) => None,
            (None, ProjectionJoin::Optional) => Some(ProjectionEntry {
                projection: 0.0,
                ownership: None,
            }),
        };
        let Some(entry) = projection else {
            continue;
        };

        let (game, start_time) = parse_game_info(&row.game_info);

        players.push(Player {
            id,
            name: row.name.trim().to_string(),
            salary,
            projection: entry.projection.max(0.0),
            ownership: entry.ownership,
            positions,
            game,
            start_time,
            locked: label_is_locked(&row.name_id),
        });
    }
    players
}

// ---------------------------------------------------------------------------
// Public loaders
// ---------------------------------------------------------------------------

/// Load the merged player pool from in-memory texts. Exposed for testing.
pub fn load_players_from(
    entries_text: &str,
    projections_text: &str,
    join: ProjectionJoin,
) -> Result<Vec<Player>, PoolError> {
    let rows = read_pool_rows(entries_text, "<entries>")?;
    let projections = read_projections(projections_text.as_bytes()).map_err(|e| PoolError::Csv {
        path: "<projections>".into(),
        source: e,
    })?;
    let players = merge_players(rows, &projections, join);
    if players.is_empty() {
        return Err(PoolError::Validation(
            "player pool merge produced zero solver-eligible players".into(),
        ));
    }
    Ok(players)
}

/// Load the merged player pool from files on disk.
pub fn load_players(
    entries_path: &Path,
    projections_path: &Path,
    join: ProjectionJoin,
) -> Result<Vec<Player>, PoolError> {
    let entries_text = read_to_string(entries_path)?;
    let projections_text = read_to_string(projections_path)?;

    let rows = read_pool_rows(&entries_text, &entries_path.display().to_string())?;
    let projections =
        read_projections(projections_text.as_bytes()).map_err(|e| PoolError::Csv {
            path: projections_path.display().to_string(),
            source: e,
        })?;
    let players = merge_players(rows, &projections, join);
    if players.is_empty() {
        return Err(PoolError::Validation(format!(
            "merging {} with {} produced zero solver-eligible players",
            entries_path.display(),
            projections_path.display()
        )));
    }
    Ok(players)
}

/// Drop players projecting below `floor` from the solver-eligible pool.
/// Locked players are always kept so a pinned roster entry stays
/// resolvable even when its projection row went missing.
pub fn filter_min_projection(pool: Vec<Player>, floor: f64) -> Vec<Player> {
    let before = pool.len();
    let kept: Vec<Player> = pool
        .into_iter()
        .filter(|p| p.locked || p.projection >= floor)
        .collect();
    let dropped = before - kept.len();
    if dropped > 0 {
        tracing::info!("min-projection filter ({floor}) dropped {dropped} of {before} players");
    }
    kept
}

/// Find the newest `NBA-Projs-*.csv` in a directory, ordered by file name
/// (the names embed a sortable date).
pub fn latest_projections(dir: &Path) -> Result<PathBuf, PoolError> {
    const PREFIX: &str = "NBA-Projs-";

    let entries = std::fs::read_dir(dir).map_err(|e| PoolError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut best: Option<(String, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with(PREFIX) || !name.ends_with(".csv") {
            continue;
        }
        if best.as_ref().map_or(true, |(b, _)| name > b.as_str()) {
            best = Some((name.to_string(), path));
        }
    }

    best.map(|(_, path)| path).ok_or_else(|| PoolError::NoProjections {
        dir: dir.display().to_string(),
        pattern: format!("{PREFIX}*.csv"),
    })
}

// ---------------------------------------------------------------------------
// Contest entries (top section of the entries file)
// ---------------------------------------------------------------------------

/// One contest entry awaiting late swap: identifying columns plus the 8
/// slot labels in PG,SG,SF,PF,C,G,F,UTIL order.
#[derive(Debug, Clone)]
pub struct Entry {
    pub entry_id: String,
    pub contest_name: String,
    pub contest_id: String,
    pub entry_fee: String,
    pub slots: Vec<String>,
}

/// Parse the entries section at the top of the file: rows with a non-empty
/// Entry ID and a complete 8-slot lineup. Incomplete lineups are skipped
/// with a warning.
pub fn read_entries(entries_text: &str) -> Vec<Entry> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(entries_text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|s| s.trim().to_string()).collect(),
        Err(e) => {
            warn!("failed to read entries header: {}", e);
            return Vec::new();
        }
    };

    let col = |name: &str| headers.iter().position(|h| h == name);
    let slot_cols: Vec<Option<usize>> = ["PG", "SG", "SF", "PF", "C", "G", "F", "UTIL"]
        .iter()
        .map(|s| col(s))
        .collect();
    let (Some(id_col), Some(name_col), Some(contest_col), Some(fee_col)) = (
        col("Entry ID"),
        col("Contest Name"),
        col("Contest ID"),
        col("Entry Fee"),
    ) else {
        warn!("entries header is missing required Entry ID / Contest columns");
        return Vec::new();
    };

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed entry row: {}", e);
                continue;
            }
        };
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

        let entry_id = cell(id_col);
        // Entry rows are the ones with an Entry ID; the player pool section
        // further down the file does not populate that column.
        if entry_id.is_empty() || !entry_id.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let slots: Vec<String> = slot_cols
            .iter()
            .map(|c| c.map(cell).unwrap_or_default())
            .collect();
        if slots.iter().any(|s| s.is_empty()) {
            warn!("entry {} has an incomplete lineup, skipping", entry_id);
            continue;
        }

        entries.push(Entry {
            entry_id,
            contest_name: cell(name_col),
            contest_id: cell(contest_col),
            entry_fee: cell(fee_col),
            slots,
        });
    }
    entries
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_to_string(path: &Path) -> Result<String, PoolError> {
    std::fs::read_to_string(path).map_err(|e| PoolError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
