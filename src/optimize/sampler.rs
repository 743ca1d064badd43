// Diverse lineup pool generation.
//
// Two interchangeable strategies produce N pairwise-diverse rosters:
//
//  * sequential exclusion: each new solve is constrained against every
//    roster generated so far, until N successes or the first infeasible
//    solve (tightening exclusions eventually exhausts any pool);
//  * overproduce-and-filter: K independent randomized solves run in
//    parallel with no exclusions, then a strictly sequential greedy pass
//    keeps a mutually-diverse subset.
//
// Every roster in the returned pool has already been through the slot
// assigner; diversity comparisons use the selection ID sets, which are
// independent of slot assignment.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::RosterRules;
use crate::data::player::Player;
use crate::optimize::assigner::{assign_slots, SlottedLineup};
use crate::optimize::selector::{select, Exclusion, SelectError, SelectOutcome, SelectedLineup};
use crate::optimize::slots::SlotWeights;

/// Sampler strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Sequential,
    Overproduce,
}

#[derive(Debug, Clone)]
pub struct SamplerSettings {
    /// Target number of rosters (N).
    pub target: usize,
    /// Minimum players that must differ between any two rosters.
    pub min_unique: usize,
    /// Objective-noise magnitude passed to each selection solve.
    pub noise: f64,
    /// Overproduction multiplier (K = ceil(target x factor)).
    pub overproduce_factor: f64,
}

/// A generated pool: slotted rosters plus their selection ID sets, and an
/// explicit shortfall instead of silently returning fewer than requested.
#[derive(Debug)]
pub struct GeneratedPool {
    pub lineups: Vec<SlottedLineup>,
    pub selections: Vec<HashSet<String>>,
    pub shortfall: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error(transparent)]
    Select(#[from] SelectError),

    #[error("slot assignment failed during pool generation: {0}")]
    Assign(#[from] crate::optimize::assigner::AssignError),

    #[error("all {0} parallel selection workers failed")]
    AllWorkersFailed(usize),
}

pub fn generate(
    pool: &[Player],
    rules: &RosterRules,
    weights: &SlotWeights,
    settings: &SamplerSettings,
    strategy: Strategy,
) -> Result<GeneratedPool, SampleError> {
    match strategy {
        Strategy::Sequential => generate_sequential(pool, rules, weights, settings),
        Strategy::Overproduce => generate_overproduce(pool, rules, weights, settings),
    }
}

/// Look up the selected players in the pool, in a stable order.
fn selected_players<'a>(pool: &'a [Player], lineup: &SelectedLineup) -> Vec<&'a Player> {
    pool.iter().filter(|p| lineup.ids.contains(&p.id)).collect()
}

fn overlap(a: &HashSet<String>, b: &HashSet<String>) -> usize {
    a.intersection(b).count()
}

// ---------------------------------------------------------------------------
// Sequential exclusion
// ---------------------------------------------------------------------------

pub fn generate_sequential(
    pool: &[Player],
    rules: &RosterRules,
    weights: &SlotWeights,
    settings: &SamplerSettings,
) -> Result<GeneratedPool, SampleError> {
    let mut lineups = Vec::new();
    let mut selections: Vec<HashSet<String>> = Vec::new();

    while lineups.len() < settings.target {
        let exclusions: Vec<Exclusion> = selections
            .iter()
            .map(|ids| {
                Exclusion::with_min_unique(ids.clone(), rules.roster_size, settings.min_unique)
            })
            .collect();

        match select(pool, rules, &exclusions, settings.noise)? {
            SelectOutcome::Lineup(lineup) => {
                let players = selected_players(pool, &lineup);
                let slotted = assign_slots(&players, weights)?;
                selections.push(lineup.ids);
                lineups.push(slotted);
                if lineups.len() % 20 == 0 {
                    info!("generated {}/{} lineups", lineups.len(), settings.target);
                }
            }
            SelectOutcome::Infeasible => {
                warn!(
                    "exclusion constraints exhausted the pool after {} of {} lineups",
                    lineups.len(),
                    settings.target
                );
                break;
            }
        }
    }

    let shortfall = settings.target.saturating_sub(lineups.len());
    Ok(GeneratedPool {
        lineups,
        selections,
        shortfall,
    })
}

// ---------------------------------------------------------------------------
// Overproduce and filter
// ---------------------------------------------------------------------------

pub fn generate_overproduce(
    pool: &[Player],
    rules: &RosterRules,
    weights: &SlotWeights,
    settings: &SamplerSettings,
) -> Result<GeneratedPool, SampleError> {
    let k = ((settings.target as f64 * settings.overproduce_factor).ceil() as usize)
        .max(settings.target);

    // Independent workers: read-only pool, no exclusions, and a per-thread
    // random generator inside each select() call, so draws are never
    // correlated across workers.
    let results: Vec<Result<SelectOutcome, SelectError>> = (0..k)
        .into_par_iter()
        .map(|_| select(pool, rules, &[], settings.noise))
        .collect();

    let mut candidates: Vec<SelectedLineup> = Vec::new();
    let mut failures = 0usize;
    for result in results {
        match result {
            Ok(SelectOutcome::Lineup(lineup)) => candidates.push(lineup),
            Ok(SelectOutcome::Infeasible) => {}
            Err(e) => {
                // One bad worker never aborts the batch.
                warn!("selection worker failed, skipping candidate: {}", e);
                failures += 1;
            }
        }
    }
    if candidates.is_empty() && failures == k {
        return Err(SampleError::AllWorkersFailed(k));
    }

    // Greedy filter, best objective first. Strictly sequential: each
    // acceptance depends on all prior acceptances.
    candidates.sort_by(|a, b| {
        b.projection
            .partial_cmp(&a.projection)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let max_overlap = rules.roster_size.saturating_sub(settings.min_unique);

    let mut lineups = Vec::new();
    let mut selections: Vec<HashSet<String>> = Vec::new();
    for candidate in candidates {
        if lineups.len() >= settings.target {
            break;
        }
        if selections
            .iter()
            .any(|accepted| overlap(accepted, &candidate.ids) > max_overlap)
        {
            continue;
        }
        let players = selected_players(pool, &candidate);
        let slotted = assign_slots(&players, weights)?;
        selections.push(candidate.ids);
        lineups.push(slotted);
    }

    let shortfall = settings.target.saturating_sub(lineups.len());
    if shortfall > 0 {
        warn!(
            "overproduce-and-filter accepted {} of {} requested lineups (shortfall {})",
            lineups.len(),
            settings.target,
            shortfall
        );
    }
    Ok(GeneratedPool {
        lineups,
        selections,
        shortfall,
    })
}
