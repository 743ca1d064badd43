// Late-swap re-optimization of an already-submitted roster.
//
// Locked entries stay exactly where they are; only the open slots are
// re-solved. A locked player still present in the refreshed pool is pinned
// into the selection (refreshed salary counted, game credited toward the
// min-games requirement). A locked player missing from the pool cannot be
// re-validated, so the slot is left untouched and the unknown salary is
// flagged rather than guessed at.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::config::RosterRules;
use crate::data::player::{id_from_label, label_is_locked, Player};
use crate::optimize::assigner::{lateness_scores, SlottedLineup};
use crate::optimize::slots::{
    add_min_games_constraint, build_assignment_grid, Slot, SlotWeights, SLOT_ORDER,
};
use crate::solver::{Model, Outcome, SolverError};

/// Incentive scale for the lateness x flexibility term. Small enough that
/// flexibility can never outweigh a genuine projection difference, large
/// enough to break ties toward flexible slots.
const INCENTIVE_SCALE: f64 = 0.001;

#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error("late swap failed: {0}")]
    Solver(#[from] SolverError),

    #[error("late swap requires an 8-entry roster, got {0}")]
    WrongCount(usize),
}

/// Re-optimize the unlocked portion of `current` against the refreshed
/// `pool`, holding every locked entry fixed. An infeasible re-solve
/// returns the input roster unchanged; leaving a slate as-is is always a
/// safe fallback.
pub fn late_swap(
    pool: &[Player],
    current: &[String],
    rules: &RosterRules,
    incentive: &SlotWeights,
    min_salary: u32,
) -> Result<SlottedLineup, SwapError> {
    if current.len() != SLOT_ORDER.len() {
        return Err(SwapError::WrongCount(current.len()));
    }

    let by_id: HashMap<&str, usize> = pool
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.as_str(), i))
        .collect();

    // Partition the roster into fixed and open slots.
    let mut output: Vec<Option<String>> = vec![None; SLOT_ORDER.len()];
    let mut open_slots: Vec<Slot> = Vec::new();
    let mut pinned: Vec<usize> = Vec::new();
    let mut locked_ids: Vec<String> = Vec::new();

    for (slot_idx, label) in current.iter().enumerate() {
        let pool_idx = id_from_label(label).and_then(|id| by_id.get(id.as_str()).copied());
        let locked = label_is_locked(label)
            || pool_idx.map_or(false, |i| pool[i].locked);

        if locked {
            // Fixed in place, label preserved verbatim (marker included).
            output[slot_idx] = Some(label.clone());
            if let Some(id) = id_from_label(label) {
                locked_ids.push(id);
            }
            match pool_idx {
                Some(i) => pinned.push(i),
                None => warn!(
                    "locked entry '{}' is not in the refreshed pool; slot held as-is, \
                     salary unknown and excluded from the cap check",
                    label
                ),
            }
        } else {
            open_slots.push(SLOT_ORDER[slot_idx]);
        }
    }

    if open_slots.is_empty() {
        info!("all 8 slots locked, nothing to swap");
        return Ok(unchanged(current));
    }

    // Candidates for the open slots: unlocked pool players. A player can be
    // pinned by an entry-label marker alone, so pinned indices are excluded
    // explicitly to keep the two variable sets disjoint.
    let pinned_set: HashSet<usize> = pinned.iter().copied().collect();
    let candidates: Vec<&Player> = pool
        .iter()
        .enumerate()
        .filter(|(i, p)| !p.locked && !pinned_set.contains(i))
        .map(|(_, p)| p)
        .collect();

    let mut model = Model::new();
    let candidate_vars: Vec<_> = candidates.iter().map(|_| model.add_binary()).collect();
    let pinned_vars: Vec<_> = pinned
        .iter()
        .map(|_| {
            let var = model.add_binary();
            let fixed = model.term(var, 1.0);
            model.add_eq(fixed, 1.0);
            var
        })
        .collect();

    // Salary spans the whole decision space: candidates plus pinned locked
    // players at their refreshed salaries.
    let salary = model.sum(
        candidate_vars
            .iter()
            .zip(&candidates)
            .map(|(&v, p)| (v, p.salary as f64))
            .chain(
                pinned_vars
                    .iter()
                    .zip(&pinned)
                    .map(|(&v, &i)| (v, pool[i].salary as f64)),
            ),
    );
    model.add_leq(salary.clone(), rules.salary_cap as f64);
    model.add_geq(salary, min_salary as f64);

    // Selection count: one player per open slot plus the pinned set.
    let count = model.sum(
        candidate_vars
            .iter()
            .chain(&pinned_vars)
            .map(|&v| (v, 1.0)),
    );
    model.add_eq(count, (open_slots.len() + pinned.len()) as f64);

    // Slot-level binaries over the open subset only.
    let grid = build_assignment_grid(&mut model, &candidates, &open_slots, Some(&candidate_vars));

    // Min distinct games across candidates and pinned players alike.
    let player_games: Vec<(&str, _)> = candidates
        .iter()
        .zip(&candidate_vars)
        .map(|(p, &v)| (p.game.as_str(), v))
        .chain(
            pinned
                .iter()
                .zip(&pinned_vars)
                .map(|(&i, &v)| (pool[i].game.as_str(), v)),
        )
        .collect();
    add_min_games_constraint(&mut model, &player_games, rules.min_games);

    // Objective: projections, plus an epsilon-scaled incentive placing the
    // latest-starting candidates into the most flexible open slots.
    let starts: Vec<_> = candidates.iter().map(|p| p.start_time).collect();
    let lateness = lateness_scores(&starts);
    let base = model.sum(
        candidate_vars
            .iter()
            .zip(&candidates)
            .map(|(&v, p)| (v, p.projection))
            .chain(
                pinned_vars
                    .iter()
                    .zip(&pinned)
                    .map(|(&v, &i)| (v, pool[i].projection)),
            ),
    );
    let flex = model.sum(grid.iter().map(|(i, slot, var)| {
        (var, lateness[i] * incentive.weight(slot) * INCENTIVE_SCALE)
    }));
    let objective = base + flex;

    match model.maximise(objective)? {
        Outcome::Infeasible => {
            warn!(
                "late swap infeasible with locked players [{}]; roster left unchanged",
                locked_ids.join(", ")
            );
            Ok(unchanged(current))
        }
        Outcome::Optimal(solution) => {
            for (i, slot, var) in grid.iter() {
                if solution.is_one(var) {
                    // Replacements are emitted with clean labels; any LOCKED
                    // marker belongs only to entries the engine held fixed.
                    output[slot.index()] = Some(candidates[i].label());
                }
            }
            let labels: Vec<String> = output
                .into_iter()
                .enumerate()
                .map(|(idx, label)| label.unwrap_or_else(|| current[idx].clone()))
                .collect();
            let labels: [String; 8] = labels.try_into().expect("length checked above");
            Ok(SlottedLineup::new(labels))
        }
    }
}

fn unchanged(current: &[String]) -> SlottedLineup {
    let labels: [String; 8] = current
        .to_vec()
        .try_into()
        .expect("caller validated the entry count");
    SlottedLineup::new(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::testutil::{rules, test_player};

    /// Pool and roster for swap scenarios: games BOS@NYK (early, locked)
    /// and MIA@ORL (late, open).
    fn swap_pool() -> Vec<Player> {
        let mut pool = vec![
            // Locked early-game players currently rostered.
            test_player("1", "PG", 6000, 30.0, "BOS@NYK", 0),
            test_player("2", "SG", 6000, 28.0, "BOS@NYK", 0),
            test_player("3", "SF", 6000, 27.0, "BOS@NYK", 0),
            test_player("4", "PF", 6000, 26.0, "BOS@NYK", 0),
            test_player("5", "C", 6000, 25.0, "BOS@NYK", 0),
            // Open-slot candidates in the late game.
            test_player("6", "PG/SG", 6000, 20.0, "MIA@ORL", 3),
            test_player("7", "SF/PF", 6000, 19.0, "MIA@ORL", 3),
            test_player("8", "C", 6000, 18.0, "MIA@ORL", 3),
            // Better replacements for the open slots.
            test_player("9", "PG/SG", 6500, 35.0, "MIA@ORL", 3),
            test_player("10", "SF/PF", 6500, 34.0, "MIA@ORL", 3),
            test_player("11", "C", 6500, 33.0, "MIA@ORL", 3),
        ];
        for p in pool.iter_mut().take(5) {
            p.locked = true;
        }
        pool
    }

    fn roster_labels(ids: [&str; 8], pool: &[Player]) -> Vec<String> {
        ids.iter()
            .map(|id| {
                pool.iter()
                    .find(|p| p.id == *id)
                    .map(|p| p.label())
                    .unwrap_or_else(|| format!("Gone Player ({id})"))
            })
            .collect()
    }

    #[test]
    fn locked_slots_are_never_altered() {
        let pool = swap_pool();
        // PG..C locked (pool flag), G/F/UTIL open with players 6/7/8.
        let current = roster_labels(["1", "2", "3", "4", "5", "6", "7", "8"], &pool);

        let swapped = late_swap(&pool, &current, &rules(), &SlotWeights::swap_incentive(), 0)
            .unwrap();

        for slot_idx in 0..5 {
            assert_eq!(
                swapped.labels()[slot_idx], current[slot_idx],
                "locked slot {} was altered",
                slot_idx
            );
        }
    }

    #[test]
    fn open_slots_upgrade_to_better_projections() {
        let pool = swap_pool();
        let current = roster_labels(["1", "2", "3", "4", "5", "6", "7", "8"], &pool);

        let swapped = late_swap(&pool, &current, &rules(), &SlotWeights::swap_incentive(), 0)
            .unwrap();

        // Players 9, 10, 11 strictly dominate 6, 7, 8 and fit the cap.
        let open: HashSet<String> = swapped.labels()[5..]
            .iter()
            .map(|l| id_from_label(l).unwrap())
            .collect();
        assert_eq!(
            open,
            HashSet::from(["9".to_string(), "10".to_string(), "11".to_string()])
        );
    }

    #[test]
    fn unique_feasible_candidates_fill_open_slots() {
        // Salary floor high enough that only the expensive candidates fit.
        let pool = swap_pool();
        let current = roster_labels(["1", "2", "3", "4", "5", "6", "7", "8"], &pool);
        // Locked total = 30000; floor of 49000 forces the three 6500s
        // (30000 + 19500 = 49500), the only combination above the floor.
        let swapped =
            late_swap(&pool, &current, &rules(), &SlotWeights::swap_incentive(), 49_000)
                .unwrap();

        let open: HashSet<String> = swapped.labels()[5..]
            .iter()
            .map(|l| id_from_label(l).unwrap())
            .collect();
        assert_eq!(
            open,
            HashSet::from(["9".to_string(), "10".to_string(), "11".to_string()])
        );
    }

    #[test]
    fn projection_floor_keeps_unprojected_fillers_out() {
        use crate::data::pool::filter_min_projection;

        let mut pool = swap_pool();
        // Unprojected pool row (left join leaves 0.0), priced so that a
        // 50k salary floor is reachable only through it.
        pool.push(test_player("12", "C", 7000, 0.0, "MIA@ORL", 3));
        let current = roster_labels(["1", "2", "3", "4", "5", "6", "7", "8"], &pool);

        let unfiltered =
            late_swap(&pool, &current, &rules(), &SlotWeights::swap_incentive(), 50_000)
                .unwrap();
        assert!(
            unfiltered
                .labels()
                .iter()
                .any(|l| id_from_label(l).as_deref() == Some("12")),
            "without a floor the zero-projection filler is the only way to 50k"
        );

        let filtered = filter_min_projection(pool, 1.0);
        let swapped =
            late_swap(&filtered, &current, &rules(), &SlotWeights::swap_incentive(), 50_000)
                .unwrap();
        assert_eq!(
            swapped.labels().to_vec(),
            current,
            "with the floor the filler is gone and the roster stays put"
        );
    }

    #[test]
    fn infeasible_swap_returns_roster_unchanged() {
        let pool = swap_pool();
        let current = roster_labels(["1", "2", "3", "4", "5", "6", "7", "8"], &pool);

        // No combination reaches a 100k salary floor.
        let swapped =
            late_swap(&pool, &current, &rules(), &SlotWeights::swap_incentive(), 100_000)
                .unwrap();

        assert_eq!(swapped.labels().to_vec(), current);
    }

    #[test]
    fn locked_marker_in_label_pins_even_when_pool_disagrees() {
        let mut pool = swap_pool();
        // Pool says player 6 is not locked, but the entry label carries the
        // marker; the label wins.
        let mut current = roster_labels(["1", "2", "3", "4", "5", "6", "7", "8"], &pool);
        current[5] = format!("{} (LOCKED)", pool[5].label());
        pool[8].projection = 99.0; // tempting replacement for the G slot

        let swapped = late_swap(&pool, &current, &rules(), &SlotWeights::swap_incentive(), 0)
            .unwrap();

        assert_eq!(swapped.labels()[5], current[5], "marker-locked slot changed");
    }

    #[test]
    fn locked_player_missing_from_pool_holds_slot() {
        let pool = swap_pool();
        let mut current = roster_labels(["1", "2", "3", "4", "5", "6", "7", "8"], &pool);
        // A locked entry referencing a player the refreshed pool dropped.
        current[4] = "Gone Center (42060000) (LOCKED)".to_string();

        let swapped = late_swap(&pool, &current, &rules(), &SlotWeights::swap_incentive(), 0)
            .unwrap();

        assert_eq!(swapped.labels()[4], "Gone Center (42060000) (LOCKED)");
    }

    #[test]
    fn fully_locked_roster_is_returned_as_is() {
        let pool = swap_pool();
        let current: Vec<String> =
            roster_labels(["1", "2", "3", "4", "5", "6", "7", "8"], &pool)
                .into_iter()
                .map(|l| format!("{l} (LOCKED)"))
                .collect();

        let swapped = late_swap(&pool, &current, &rules(), &SlotWeights::swap_incentive(), 0)
            .unwrap();
        assert_eq!(swapped.labels().to_vec(), current);
    }

    #[test]
    fn wrong_entry_count_is_an_error() {
        let pool = swap_pool();
        let current = vec!["A (1)".to_string(); 7];
        assert!(matches!(
            late_swap(&pool, &current, &rules(), &SlotWeights::swap_incentive(), 0),
            Err(SwapError::WrongCount(7))
        ));
    }
}
