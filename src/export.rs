// CSV output for generated pools, rankings, and late-swap uploads.

use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::info;

use crate::data::pool::Entry;
use crate::optimize::assigner::SlottedLineup;
use crate::optimize::slots::SLOT_ORDER;
use crate::ranker::RankedLineup;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("csv error for {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> ExportError + '_ {
    move |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// `<dir>/<prefix>-<local timestamp>.csv`, unique per invocation.
pub fn timestamped_path(dir: &Path, prefix: &str) -> PathBuf {
    let stamp = Local::now().format("%Y-%m-%d_%H%M%S");
    dir.join(format!("{prefix}-{stamp}.csv"))
}

fn slot_header() -> Vec<String> {
    SLOT_ORDER.iter().map(|s| s.display_str().to_string()).collect()
}

/// Write a lineup pool: one row of slot labels per roster under a
/// PG,SG,SF,PF,C,G,F,UTIL header.
pub fn write_lineup_pool(path: &Path, lineups: &[SlottedLineup]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_err(path))?;
    writer.write_record(slot_header()).map_err(csv_err(path))?;
    for lineup in lineups {
        writer.write_record(lineup.to_row()).map_err(csv_err(path))?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("wrote {} lineups to {}", lineups.len(), path.display());
    Ok(())
}

/// Read a previously-exported lineup pool back in. Rows with the wrong
/// column count are skipped.
pub fn read_lineup_pool(path: &Path) -> Result<Vec<SlottedLineup>, ExportError> {
    let mut reader = csv::Reader::from_path(path).map_err(csv_err(path))?;
    let mut lineups = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err(path))?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        if let Some(lineup) = SlottedLineup::from_row(&row) {
            lineups.push(lineup);
        } else {
            tracing::warn!("skipping {}-column row in {}", row.len(), path.display());
        }
    }
    Ok(lineups)
}

/// Write a ranked pool with the scoring metrics ahead of the slot columns.
pub fn write_ranked(path: &Path, ranked: &[RankedLineup]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_err(path))?;
    let mut header = vec![
        "Rank".to_string(),
        "Score".to_string(),
        "Projection".to_string(),
        "Ownership".to_string(),
        "Geo Ownership".to_string(),
        "Proj_Rank".to_string(),
        "Own_Rank".to_string(),
        "Geo_Rank".to_string(),
    ];
    header.extend(slot_header());
    writer.write_record(&header).map_err(csv_err(path))?;

    for entry in ranked {
        let mut row = vec![
            entry.rank.to_string(),
            format!("{:.2}", entry.score),
            format!("{:.2}", entry.projection),
            format!("{:.2}", entry.ownership),
            format!("{:.2}", entry.geo_ownership),
            entry.projection_rank.to_string(),
            entry.ownership_rank.to_string(),
            entry.geo_ownership_rank.to_string(),
        ];
        row.extend(entry.lineup.to_row());
        writer.write_record(&row).map_err(csv_err(path))?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("wrote {} ranked lineups to {}", ranked.len(), path.display());
    Ok(())
}

/// Write re-optimized contest entries in the upload layout: the entry
/// metadata columns followed by the eight slot labels.
pub fn write_swapped_entries(
    path: &Path,
    entries: &[(Entry, SlottedLineup)],
) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_err(path))?;
    let mut header = vec![
        "Entry ID".to_string(),
        "Contest Name".to_string(),
        "Contest ID".to_string(),
        "Entry Fee".to_string(),
    ];
    header.extend(slot_header());
    writer.write_record(&header).map_err(csv_err(path))?;

    for (entry, lineup) in entries {
        let mut row = vec![
            entry.entry_id.clone(),
            entry.contest_name.clone(),
            entry.contest_id.clone(),
            entry.entry_fee.clone(),
        ];
        row.extend(lineup.to_row());
        writer.write_record(&row).map_err(csv_err(path))?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("wrote {} swapped entries to {}", entries.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tmp_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(format!("export_test_{name}"));
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        tmp
    }

    fn lineup(offset: usize) -> SlottedLineup {
        let labels: Vec<String> = (0..8)
            .map(|i| format!("Player {n} ({n})", n = offset + i))
            .collect();
        SlottedLineup::new(labels.try_into().unwrap())
    }

    #[test]
    fn lineup_pool_round_trips() {
        let tmp = tmp_dir("pool_round_trip");
        let path = tmp.join("pool.csv");
        let lineups = vec![lineup(100), lineup(200)];

        write_lineup_pool(&path, &lineups).unwrap();
        let loaded = read_lineup_pool(&path).unwrap();
        assert_eq!(loaded, lineups);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn lineup_pool_header_is_slot_order() {
        let tmp = tmp_dir("pool_header");
        let path = tmp.join("pool.csv");
        write_lineup_pool(&path, &[lineup(1)]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, "PG,SG,SF,PF,C,G,F,UTIL");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ranked_rows_carry_metrics_before_slots() {
        let tmp = tmp_dir("ranked");
        let path = tmp.join("ranked.csv");
        let ranked = vec![RankedLineup {
            lineup: lineup(1),
            projection: 250.5,
            ownership: 80.0,
            geo_ownership: 9.5,
            projection_rank: 1,
            ownership_rank: 2,
            geo_ownership_rank: 3,
            score: 1.7,
            rank: 1,
        }];

        write_ranked(&path, &ranked).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines
            .next()
            .unwrap()
            .starts_with("Rank,Score,Projection,Ownership,Geo Ownership,Proj_Rank,Own_Rank,Geo_Rank,PG"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,1.70,250.50,80.00,9.50,1,2,3,"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn swapped_entries_keep_entry_metadata() {
        let tmp = tmp_dir("entries");
        let path = tmp.join("entries.csv");
        let entry = Entry {
            entry_id: "4509876543".to_string(),
            contest_name: "NBA $100K Shot".to_string(),
            contest_id: "171998877".to_string(),
            entry_fee: "$5".to_string(),
            slots: lineup(1).to_row(),
        };
        write_swapped_entries(&path, &[(entry, lineup(300))]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Entry ID,Contest Name,Contest ID,Entry Fee,PG,SG,SF,PF,C,G,F,UTIL"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("4509876543,NBA $100K Shot,171998877,$5,"));
        assert!(row.contains("Player 300 (300)"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn timestamped_paths_carry_prefix_and_extension() {
        let path = timestamped_path(Path::new("output"), "lineup-pool");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("lineup-pool-"));
        assert!(name.ends_with(".csv"));
    }
}
