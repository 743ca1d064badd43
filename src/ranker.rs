// Rank-sum scoring for generated lineup pools.
//
// Three metrics per roster: total projection (higher is better), total
// ownership and geometric-mean ownership (lower is better for contest
// leverage). Each metric is converted to an ordinal rank across the batch
// and the weighted rank sum orders the final output, best first.

use std::collections::HashMap;

use tracing::warn;

use crate::config::RankerConfig;
use crate::data::player::{id_from_label, Player};
use crate::optimize::assigner::SlottedLineup;

/// Ownership floor applied before taking logs. Zero or missing ownership
/// would otherwise collapse the geometric mean.
const OWNERSHIP_FLOOR: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct RankedLineup {
    pub lineup: SlottedLineup,
    pub projection: f64,
    pub ownership: f64,
    pub geo_ownership: f64,
    /// Ordinal rank per metric across the batch (1 = best).
    pub projection_rank: usize,
    pub ownership_rank: usize,
    pub geo_ownership_rank: usize,
    /// Weighted rank sum; lower is better.
    pub score: f64,
    /// 1-based position in the final ordering.
    pub rank: usize,
}

/// Per-lineup metrics before ranking.
struct Metrics {
    projection: f64,
    ownership: f64,
    geo_ownership: f64,
}

fn lineup_metrics(lineup: &SlottedLineup, by_id: &HashMap<&str, &Player>) -> Metrics {
    let mut projection = 0.0;
    let mut ownership = 0.0;
    let mut log_sum = 0.0;
    let mut counted = 0usize;

    for label in lineup.labels() {
        let Some(player) = id_from_label(label).and_then(|id| by_id.get(id.as_str()).copied())
        else {
            warn!("lineup references unknown player '{}'; metric contribution dropped", label);
            continue;
        };
        projection += player.projection;
        let own = player.ownership.unwrap_or(0.0);
        ownership += own;
        log_sum += own.max(OWNERSHIP_FLOOR).ln();
        counted += 1;
    }

    let geo_ownership = if counted > 0 {
        (log_sum / counted as f64).exp()
    } else {
        OWNERSHIP_FLOOR
    };
    Metrics {
        projection,
        ownership,
        geo_ownership,
    }
}

/// Ordinal ranks (1-based) for a metric. `ascending` ranks the smallest
/// value first; ties are broken by original position.
fn ordinal_ranks(values: &[f64], ascending: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        let cmp = values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal);
        if ascending {
            cmp
        } else {
            cmp.reverse()
        }
    });
    let mut ranks = vec![0usize; values.len()];
    for (position, &idx) in order.iter().enumerate() {
        ranks[idx] = position + 1;
    }
    ranks
}

/// Score and order a batch of lineups, best first.
pub fn rank_lineups(
    lineups: &[SlottedLineup],
    pool: &[Player],
    weights: &RankerConfig,
) -> Vec<RankedLineup> {
    let by_id: HashMap<&str, &Player> = pool.iter().map(|p| (p.id.as_str(), p)).collect();
    let metrics: Vec<Metrics> = lineups.iter().map(|l| lineup_metrics(l, &by_id)).collect();

    let projections: Vec<f64> = metrics.iter().map(|m| m.projection).collect();
    let ownerships: Vec<f64> = metrics.iter().map(|m| m.ownership).collect();
    let geos: Vec<f64> = metrics.iter().map(|m| m.geo_ownership).collect();

    let proj_ranks = ordinal_ranks(&projections, false);
    let own_ranks = ordinal_ranks(&ownerships, true);
    let geo_ranks = ordinal_ranks(&geos, true);

    let mut ranked: Vec<RankedLineup> = lineups
        .iter()
        .enumerate()
        .map(|(i, lineup)| RankedLineup {
            lineup: lineup.clone(),
            projection: metrics[i].projection,
            ownership: metrics[i].ownership,
            geo_ownership: metrics[i].geo_ownership,
            projection_rank: proj_ranks[i],
            ownership_rank: own_ranks[i],
            geo_ownership_rank: geo_ranks[i],
            score: weights.projection_weight * proj_ranks[i] as f64
                + weights.ownership_weight * own_ranks[i] as f64
                + weights.geo_ownership_weight * geo_ranks[i] as f64,
            rank: 0,
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (position, entry) in ranked.iter_mut().enumerate() {
        entry.rank = position + 1;
    }
    ranked
}
