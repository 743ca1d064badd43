// Player record and label conventions.
//
// A player label is the DraftKings "Name + ID" form: `Name (ID)`, optionally
// suffixed ` (LOCKED)` once the player's game has started. The numeric ID
// embedded in the label is the stable join key everywhere in this crate.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Primary NBA positions a player can be listed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    PointGuard,
    ShootingGuard,
    SmallForward,
    PowerForward,
    Center,
}

impl Position {
    /// Parse a single position token ("PG", "SG", "SF", "PF", "C").
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PG" => Some(Position::PointGuard),
            "SG" => Some(Position::ShootingGuard),
            "SF" => Some(Position::SmallForward),
            "PF" => Some(Position::PowerForward),
            "C" => Some(Position::Center),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::PointGuard => "PG",
            Position::ShootingGuard => "SG",
            Position::SmallForward => "SF",
            Position::PowerForward => "PF",
            Position::Center => "C",
        }
    }

    pub fn is_guard(&self) -> bool {
        matches!(self, Position::PointGuard | Position::ShootingGuard)
    }

    pub fn is_forward(&self) -> bool {
        matches!(self, Position::SmallForward | Position::PowerForward)
    }
}

/// Parse a `/`-separated "Roster Position" string (e.g. "PG/SG") into the
/// set of eligible positions. Unknown tokens are skipped with a warning.
pub fn parse_positions(s: &str) -> Vec<Position> {
    let mut positions = Vec::new();
    for token in s.split('/') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match Position::from_str_pos(token) {
            Some(pos) => {
                if !positions.contains(&pos) {
                    positions.push(pos);
                }
            }
            None => warn!("unknown position token '{}' in '{}'", token, s),
        }
    }
    positions
}

/// One solver-eligible player, built once per invocation and never mutated
/// during a solve.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub name: String,
    /// Always present and positive; a row without a parseable salary never
    /// becomes a `Player`.
    pub salary: u32,
    /// Expected fantasy points. Zero for swap-path players with no
    /// projection row.
    pub projection: f64,
    /// Ownership projection, consumed only by the ranker.
    pub ownership: Option<f64>,
    pub positions: Vec<Position>,
    /// Which of the day's games the player belongs to, e.g. "BKN@OKC".
    pub game: String,
    /// Game start time; `None` when the source field was unparseable.
    pub start_time: Option<NaiveDateTime>,
    /// True once the player's game has started (or the pool marked the
    /// player unavailable for change).
    pub locked: bool,
}

impl Player {
    /// Clean "Name (ID)" label, without any LOCKED marker.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }
}

pub const LOCKED_MARKER: &str = "(LOCKED)";

/// Whether a label carries the LOCKED marker (case-insensitive).
pub fn label_is_locked(label: &str) -> bool {
    label.to_uppercase().contains(LOCKED_MARKER)
}

/// Extract the player ID from a label: the last all-digit parenthesized run.
/// Taking the last run skips name parentheticals; the LOCKED suffix is not
/// all-digits so it never matches.
pub fn id_from_label(label: &str) -> Option<String> {
    let mut found = None;
    let mut rest = label;
    while let Some(open) = rest.find('(') {
        let after = &rest[open + 1..];
        match after.find(')') {
            Some(close) => {
                let inner = &after[..close];
                if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) {
                    found = Some(inner.to_string());
                }
                rest = &after[close + 1..];
            }
            None => break,
        }
    }
    found
}
