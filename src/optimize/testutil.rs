// Shared fixtures for the optimizer test modules.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::config::RosterRules;
use crate::data::player::{parse_positions, Player};

fn slate_start(hour_offset: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, 20)
        .unwrap()
        .and_hms_opt(19, 0, 0)
        .unwrap()
        + Duration::hours(hour_offset)
}

pub fn test_player(
    id: &str,
    positions: &str,
    salary: u32,
    projection: f64,
    game: &str,
    hour_offset: i64,
) -> Player {
    Player {
        id: id.to_string(),
        name: format!("Player {id}"),
        salary,
        projection,
        ownership: Some(10.0),
        positions: parse_positions(positions),
        game: game.to_string(),
        start_time: Some(slate_start(hour_offset)),
        locked: false,
    }
}

pub fn rules() -> RosterRules {
    RosterRules {
        salary_cap: 50_000,
        roster_size: 8,
        min_games: 2,
    }
}

/// Ten players admitting exactly one valid roster. The eight 6000-salary
/// players cover every slot across two games (48000 total); swapping any of
/// them for a 9000-salary decoy busts the cap, no matter how tempting the
/// decoy projections are.
pub fn pool_with_unique_solution() -> (Vec<Player>, HashSet<String>) {
    let positions = ["PG", "SG", "SF", "PF", "C", "PG/SG", "SF/PF", "C"];
    let mut pool: Vec<Player> = (0..8)
        .map(|i| {
            let game = if i < 4 { "BOS@NYK" } else { "MIA@ORL" };
            test_player(&format!("{}", i + 1), positions[i], 6000, 25.0, game, 0)
        })
        .collect();
    pool.push(test_player("9", "PG/SG", 9000, 99.0, "BOS@NYK", 0));
    pool.push(test_player("10", "C", 9000, 99.0, "MIA@ORL", 0));

    let expected = (1..=8).map(|i| i.to_string()).collect();
    (pool, expected)
}

/// Sixteen flat-salary players across two games with enough positional
/// flexibility to admit several distinct valid rosters, including two that
/// are fully disjoint, but no more than two disjoint ones.
pub fn diverse_pool() -> Vec<Player> {
    let positions = ["PG", "SG", "SF", "PF", "C", "PG/SG", "SF/PF", "C"];
    let mut pool = Vec::with_capacity(16);
    for g in 0..2 {
        let (game, hour) = if g == 0 { ("BOS@NYK", 0) } else { ("MIA@ORL", 3) };
        for i in 0..8 {
            let id = g * 8 + i + 1;
            // Distinct projections keep the objective from degenerating.
            let projection = 40.0 - id as f64;
            pool.push(test_player(
                &format!("{id}"),
                positions[i],
                6000,
                projection,
                game,
                hour,
            ));
        }
    }
    pool
}
