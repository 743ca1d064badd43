// Slot assignment for a fixed 8-player set.
//
// The selection solve already proved a legal assignment exists; this pass
// redoes the mapping to push the latest-starting players into the most
// flexible slots, keeping late-swap options open.

use chrono::NaiveDateTime;
use tracing::warn;

use crate::data::player::Player;
use crate::optimize::slots::{build_assignment_grid, Slot, SlotWeights, SLOT_ORDER};
use crate::solver::{Model, Outcome, SolverError};

/// A complete roster: one player label per named slot, in
/// PG,SG,SF,PF,C,G,F,UTIL order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlottedLineup {
    labels: [String; 8],
}

impl SlottedLineup {
    pub fn new(labels: [String; 8]) -> Self {
        SlottedLineup { labels }
    }

    pub fn from_row(row: &[String]) -> Option<Self> {
        let labels: [String; 8] = row.to_vec().try_into().ok()?;
        Some(SlottedLineup { labels })
    }

    pub fn label(&self, slot: Slot) -> &str {
        &self.labels[slot.index()]
    }

    pub fn labels(&self) -> &[String; 8] {
        &self.labels
    }

    /// Labels in canonical slot order, for CSV rows.
    pub fn to_row(&self) -> Vec<String> {
        self.labels.to_vec()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssignError {
    #[error("slot assignment requires exactly 8 players, got {0}")]
    WrongCount(usize),

    #[error("slot assignment failed: {0}")]
    Solver(#[from] SolverError),
}

/// Normalize start times into [0, 1] lateness scores: 0 for the earliest
/// start, 1 for the latest. Missing times and a degenerate range (all
/// starts equal) score 0.
pub(crate) fn lateness_scores(starts: &[Option<NaiveDateTime>]) -> Vec<f64> {
    let known: Vec<NaiveDateTime> = starts.iter().flatten().copied().collect();
    let (Some(&min), Some(&max)) = (known.iter().min(), known.iter().max()) else {
        return vec![0.0; starts.len()];
    };
    let range = (max - min).num_seconds() as f64;
    if range <= 0.0 {
        return vec![0.0; starts.len()];
    }
    starts
        .iter()
        .map(|s| match s {
            Some(t) => (*t - min).num_seconds() as f64 / range,
            None => 0.0,
        })
        .collect()
}

/// Assign exactly 8 players to the 8 named slots, maximizing
/// lateness x flexibility.
///
/// Ties between equally-late assignments are solver-implementation-defined;
/// with fixed inputs and a unique optimum the mapping is stable.
pub fn assign_slots(
    players: &[&Player],
    weights: &SlotWeights,
) -> Result<SlottedLineup, AssignError> {
    if players.len() != SLOT_ORDER.len() {
        return Err(AssignError::WrongCount(players.len()));
    }

    let starts: Vec<_> = players.iter().map(|p| p.start_time).collect();
    let lateness = lateness_scores(&starts);

    let mut model = Model::new();
    let grid = build_assignment_grid(&mut model, players, &SLOT_ORDER, None);

    let objective = model.sum(
        grid.iter()
            .map(|(i, slot, var)| (var, lateness[i] * weights.weight(slot))),
    );

    match model.maximise(objective)? {
        Outcome::Optimal(solution) => {
            let mut labels: [String; 8] = Default::default();
            for (i, slot, var) in grid.iter() {
                if solution.is_one(var) {
                    labels[slot.index()] = players[i].label();
                }
            }
            Ok(SlottedLineup { labels })
        }
        Outcome::Infeasible => {
            // Should not happen for a jointly slot-feasible 8; fall back to
            // a stable order instead of failing the batch.
            warn!("slot assignment infeasible for a supposedly feasible 8; emitting stable order");
            let mut sorted: Vec<&Player> = players.to_vec();
            sorted.sort_by(|a, b| a.id.cmp(&b.id));
            let labels: Vec<String> = sorted.iter().map(|p| p.label()).collect();
            let labels: [String; 8] = labels.try_into().expect("length checked above");
            Ok(SlottedLineup { labels })
        }
    }
}
