// Roster slots, eligibility rules, and the shared slot-assignment builder.
//
// The Selector, the Slot Assigner and the Late-Swap Optimizer all need the
// same (player x slot) binary grid with the same eligibility rules. Building
// it in one place guarantees the rules cannot drift between call sites.

use serde::Deserialize;

use crate::data::player::{Player, Position};
use crate::solver::{Model, VarId};

/// The 8 named roster slots, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    PG,
    SG,
    SF,
    PF,
    C,
    G,
    F,
    Util,
}

/// Canonical slot order: PG, SG, SF, PF, C, G, F, UTIL.
pub const SLOT_ORDER: [Slot; 8] = [
    Slot::PG,
    Slot::SG,
    Slot::SF,
    Slot::PF,
    Slot::C,
    Slot::G,
    Slot::F,
    Slot::Util,
];

impl Slot {
    pub fn display_str(&self) -> &'static str {
        match self {
            Slot::PG => "PG",
            Slot::SG => "SG",
            Slot::SF => "SF",
            Slot::PF => "PF",
            Slot::C => "C",
            Slot::G => "G",
            Slot::F => "F",
            Slot::Util => "UTIL",
        }
    }

    /// Index into [`SLOT_ORDER`].
    pub fn index(&self) -> usize {
        SLOT_ORDER.iter().position(|s| s == self).unwrap_or(0)
    }

    /// Whether a player with the given primary positions may occupy this
    /// slot. G accepts guards, F accepts forwards, UTIL accepts anyone.
    pub fn accepts(&self, positions: &[Position]) -> bool {
        match self {
            Slot::Util => true,
            Slot::G => positions.iter().any(|p| p.is_guard()),
            Slot::F => positions.iter().any(|p| p.is_forward()),
            Slot::PG => positions.contains(&Position::PointGuard),
            Slot::SG => positions.contains(&Position::ShootingGuard),
            Slot::SF => positions.contains(&Position::SmallForward),
            Slot::PF => positions.contains(&Position::PowerForward),
            Slot::C => positions.contains(&Position::Center),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-slot weights
// ---------------------------------------------------------------------------

/// Per-slot scoring multipliers, caller-configurable. Two presets exist:
/// the Slot Assigner's steep weights and the late-swap incentive weights.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotWeights {
    pub single: f64,
    pub guard_forward: f64,
    pub util: f64,
}

impl SlotWeights {
    /// Assignment weights: geometrically increasing so the solver strictly
    /// prefers pushing late starters into UTIL, then G/F.
    pub fn assignment() -> Self {
        SlotWeights {
            single: 1.0,
            guard_forward: 10.0,
            util: 100.0,
        }
    }

    /// Late-swap incentive weights: a gentler ramp, scaled down by a small
    /// epsilon at the call site so flexibility can only break ties.
    pub fn swap_incentive() -> Self {
        SlotWeights {
            single: 1.0,
            guard_forward: 2.0,
            util: 3.0,
        }
    }

    pub fn weight(&self, slot: Slot) -> f64 {
        match slot {
            Slot::Util => self.util,
            Slot::G | Slot::F => self.guard_forward,
            _ => self.single,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared (player x slot) assignment builder
// ---------------------------------------------------------------------------

/// Binary occupancy grid over (player index, active slot). Ineligible pairs
/// have no variable, which forbids them.
pub struct SlotGrid {
    active_slots: Vec<Slot>,
    vars: Vec<Vec<Option<VarId>>>,
}

impl SlotGrid {
    pub fn var(&self, player_idx: usize, slot: Slot) -> Option<VarId> {
        let slot_idx = self.active_slots.iter().position(|s| *s == slot)?;
        self.vars[player_idx][slot_idx]
    }

    pub fn active_slots(&self) -> &[Slot] {
        &self.active_slots
    }

    /// Iterate all existing (player index, slot, variable) triples.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Slot, VarId)> + '_ {
        self.vars.iter().enumerate().flat_map(move |(i, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(j, v)| v.map(|var| (i, self.active_slots[j], var)))
        })
    }
}

/// Build the occupancy grid on `model` for `players` over `active_slots`:
///
/// * one binary per eligible (player, slot) pair;
/// * each active slot filled exactly once across all players;
/// * each player's occupancy sum tied to their selection variable when
///   `selection` is given (Selector / Late-Swap), or to exactly 1 when it
///   is not (Slot Assigner, where all players are already chosen).
pub fn build_assignment_grid(
    model: &mut Model,
    players: &[&Player],
    active_slots: &[Slot],
    selection: Option<&[VarId]>,
) -> SlotGrid {
    let mut vars: Vec<Vec<Option<VarId>>> = Vec::with_capacity(players.len());

    for player in players {
        let row: Vec<Option<VarId>> = active_slots
            .iter()
            .map(|slot| {
                slot.accepts(&player.positions)
                    .then(|| model.add_binary())
            })
            .collect();
        vars.push(row);
    }

    // Each player occupies exactly one eligible slot if selected, none if not.
    for (i, row) in vars.iter().enumerate() {
        let occupancy = model.sum(row.iter().flatten().map(|&v| (v, 1.0)));
        match selection {
            Some(selection_vars) => {
                let tied = occupancy - model.term(selection_vars[i], 1.0);
                model.add_eq(tied, 0.0);
            }
            None => model.add_eq(occupancy, 1.0),
        }
    }

    // Each active slot is filled by exactly one player.
    for (j, _slot) in active_slots.iter().enumerate() {
        let filled = model.sum(vars.iter().filter_map(|row| row[j]).map(|v| (v, 1.0)));
        model.add_eq(filled, 1.0);
    }

    SlotGrid {
        active_slots: active_slots.to_vec(),
        vars,
    }
}

// ---------------------------------------------------------------------------
// Minimum distinct games
// ---------------------------------------------------------------------------

/// Require the selection spread across at least `min_games` distinct games.
/// `player_games` pairs each selection variable with its player's game ID.
///
/// One binary indicator per game, constrained so it can be 1 only when at
/// least one of the game's players is selected; at least `min_games`
/// indicators must be 1.
pub fn add_min_games_constraint(
    model: &mut Model,
    player_games: &[(&str, VarId)],
    min_games: usize,
) {
    let mut by_game: std::collections::HashMap<&str, Vec<VarId>> =
        std::collections::HashMap::new();
    for (game, var) in player_games {
        by_game.entry(game).or_default().push(*var);
    }

    let mut game_vars = Vec::with_capacity(by_game.len());
    for selection_vars in by_game.values() {
        let game_var = model.add_binary();
        let support = model.sum(selection_vars.iter().map(|&v| (v, 1.0)))
            - model.term(game_var, 1.0);
        model.add_geq(support, 0.0);
        game_vars.push(game_var);
    }

    let games_used = model.sum(game_vars.iter().map(|&v| (v, 1.0)));
    model.add_geq(games_used, min_games as f64);
}
