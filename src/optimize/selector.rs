// Primary lineup selection: one ILP solve producing an 8-player set.
//
// Slot feasibility is proved inside the same solve (a selected player must
// occupy exactly one eligible slot), but the final slot-to-player mapping
// used for output is redone by the assigner for scheduling flexibility.

use std::collections::HashSet;

use rand::Rng;
use tracing::debug;

use crate::config::RosterRules;
use crate::data::player::Player;
use crate::optimize::slots::{add_min_games_constraint, build_assignment_grid, SLOT_ORDER};
use crate::solver::{Model, Outcome, SolverError};

/// An overlap bound against one previously generated roster: the new
/// selection may share at most `max_overlap` players with `ids`.
#[derive(Debug, Clone)]
pub struct Exclusion {
    pub ids: HashSet<String>,
    pub max_overlap: usize,
}

impl Exclusion {
    /// Bound enforcing at least `min_unique` different players versus a
    /// prior roster of `roster_size` players.
    pub fn with_min_unique(ids: HashSet<String>, roster_size: usize, min_unique: usize) -> Self {
        Exclusion {
            ids,
            max_overlap: roster_size.saturating_sub(min_unique),
        }
    }
}

/// A selected 8-player set, before slot assignment.
#[derive(Debug, Clone)]
pub struct SelectedLineup {
    /// Selection identity, used for diversity comparisons.
    pub ids: HashSet<String>,
    /// Unperturbed total projection of the selection.
    pub projection: f64,
}

/// Typed solve result: infeasibility is an expected outcome, not an error.
#[derive(Debug, Clone)]
pub enum SelectOutcome {
    Lineup(SelectedLineup),
    Infeasible,
}

#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    #[error("lineup selection failed: {0}")]
    Solver(#[from] SolverError),

    #[error("player pool is empty after filtering")]
    EmptyPool,
}

/// Select an optimal 8-player set from `pool`.
///
/// The objective maximizes each player's projection perturbed by a fresh
/// uniform draw in [-noise, +noise] (no perturbation when `noise` is 0).
/// The draw comes from the calling thread's own generator, so parallel
/// callers never share randomness state.
pub fn select(
    pool: &[Player],
    rules: &RosterRules,
    exclusions: &[Exclusion],
    noise: f64,
) -> Result<SelectOutcome, SelectError> {
    if pool.is_empty() {
        return Err(SelectError::EmptyPool);
    }

    let players: Vec<&Player> = pool.iter().collect();
    let mut model = Model::new();

    // Selection binaries, one per player.
    let selection: Vec<_> = players.iter().map(|_| model.add_binary()).collect();

    // Simulated projections: fresh perturbation per player per call.
    let mut rng = rand::thread_rng();
    let simulated: Vec<f64> = players
        .iter()
        .map(|p| {
            if noise > 0.0 {
                p.projection * (1.0 + rng.gen_range(-noise..=noise))
            } else {
                p.projection
            }
        })
        .collect();

    let objective = model.sum(selection.iter().zip(&simulated).map(|(&v, &s)| (v, s)));

    // Salary cap and roster size.
    let salary = model.sum(
        selection
            .iter()
            .zip(&players)
            .map(|(&v, p)| (v, p.salary as f64)),
    );
    model.add_leq(salary, rules.salary_cap as f64);

    let count = model.sum(selection.iter().map(|&v| (v, 1.0)));
    model.add_eq(count, rules.roster_size as f64);

    // Overlap bounds against prior rosters.
    for exclusion in exclusions {
        let overlap = model.sum(
            selection
                .iter()
                .zip(&players)
                .filter(|(_, p)| exclusion.ids.contains(&p.id))
                .map(|(&v, _)| (v, 1.0)),
        );
        model.add_leq(overlap, exclusion.max_overlap as f64);
    }

    // Joint slot feasibility over the full slot set.
    build_assignment_grid(&mut model, &players, &SLOT_ORDER, Some(&selection));

    // Minimum distinct games.
    let player_games: Vec<(&str, _)> = players
        .iter()
        .zip(&selection)
        .map(|(p, &v)| (p.game.as_str(), v))
        .collect();
    add_min_games_constraint(&mut model, &player_games, rules.min_games);

    match model.maximise(objective)? {
        Outcome::Infeasible => Ok(SelectOutcome::Infeasible),
        Outcome::Optimal(solution) => {
            let mut ids = HashSet::new();
            let mut projection = 0.0;
            for (i, p) in players.iter().enumerate() {
                if solution.is_one(selection[i]) {
                    ids.insert(p.id.clone());
                    projection += p.projection;
                }
            }
            debug!(
                players = ids.len(),
                projection, "selected lineup"
            );
            Ok(SelectOutcome::Lineup(SelectedLineup { ids, projection }))
        }
    }
}
