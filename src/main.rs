// Fastbreak entry point.
//
// Subcommands:
//   generate  build a diverse lineup pool from the player pool
//   rank      score a previously generated pool
//   swap      re-optimize contest entries mid-slate
//   run       generate then rank in one pass

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use fastbreak::config::{self, OptimizerConfig};
use fastbreak::data::pool::{
    filter_min_projection, latest_projections, load_players, read_entries, ProjectionJoin,
};
use fastbreak::export;
use fastbreak::optimize::sampler::{self, SamplerSettings, Strategy};
use fastbreak::optimize::slots::SlotWeights;
use fastbreak::optimize::swap::late_swap;
use fastbreak::ranker;

#[derive(Parser)]
#[command(name = "fastbreak", about = "NBA DFS lineup optimizer", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a diverse pool of optimized lineups.
    Generate(GenerateArgs),
    /// Rank an existing lineup pool CSV.
    Rank(RankArgs),
    /// Re-optimize the open slots of submitted contest entries.
    Swap(SwapArgs),
    /// Generate a pool and rank it in one pass.
    Run(GenerateArgs),
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// DKEntries/DKSalaries export carrying the player pool.
    #[arg(long)]
    entries: Option<PathBuf>,
    /// Projections CSV; defaults to the newest NBA-Projs-*.csv in the data dir.
    #[arg(long)]
    projections: Option<PathBuf>,
    /// Number of lineups to generate.
    #[arg(long)]
    target: Option<usize>,
    /// Minimum players differing between any two lineups.
    #[arg(long)]
    min_unique: Option<usize>,
    /// Projection noise magnitude (0.0 disables randomization).
    #[arg(long)]
    noise: Option<f64>,
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,
    /// Drop players projecting below this floor before solving.
    #[arg(long)]
    min_projection: Option<f64>,
}

#[derive(clap::Args)]
struct RankArgs {
    /// Lineup pool CSV produced by `generate`.
    pool: PathBuf,
    #[arg(long)]
    entries: Option<PathBuf>,
    #[arg(long)]
    projections: Option<PathBuf>,
}

#[derive(clap::Args)]
struct SwapArgs {
    /// DKEntries export with submitted entries and the refreshed pool.
    #[arg(long)]
    entries: Option<PathBuf>,
    #[arg(long)]
    projections: Option<PathBuf>,
    /// Drop replacement candidates projecting below this floor.
    #[arg(long)]
    min_projection: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = config::load_config().context("failed to load configuration")?;

    match cli.command {
        Command::Generate(args) => {
            let (lineups, _) = generate_pool(&config, &args)?;
            let out = export::timestamped_path(Path::new(&config.data.output_dir), "lineup-pool");
            ensure_output_dir(&config)?;
            export::write_lineup_pool(&out, &lineups).context("failed to write lineup pool")?;
        }
        Command::Rank(args) => {
            let lineups =
                export::read_lineup_pool(&args.pool).context("failed to read lineup pool")?;
            let pool = load_pool(
                &config,
                args.entries.as_deref(),
                args.projections.as_deref(),
                ProjectionJoin::Optional,
            )?;
            let ranked = ranker::rank_lineups(&lineups, &pool, &config.ranker);
            let out = export::timestamped_path(Path::new(&config.data.output_dir), "ranked-pool");
            ensure_output_dir(&config)?;
            export::write_ranked(&out, &ranked).context("failed to write ranked pool")?;
        }
        Command::Swap(args) => {
            let entries_path = entries_path(&config, args.entries.as_deref());
            let entries_text = std::fs::read_to_string(&entries_path)
                .with_context(|| format!("failed to read {}", entries_path.display()))?;
            let entries = read_entries(&entries_text);
            if entries.is_empty() {
                anyhow::bail!("no contest entries found in {}", entries_path.display());
            }
            // Locked entries must stay resolvable, so the join keeps
            // unprojected players at projection 0 and the floor below
            // spares anything locked.
            let pool = load_pool(
                &config,
                Some(&entries_path),
                args.projections.as_deref(),
                ProjectionJoin::Optional,
            )?;
            let floor = args.min_projection.unwrap_or(config.swap.min_projection);
            let pool = filter_min_projection(pool, floor);

            let incentive = SlotWeights::swap_incentive();
            let mut swapped = Vec::with_capacity(entries.len());
            for entry in entries {
                let lineup = late_swap(
                    &pool,
                    &entry.slots,
                    &config.roster,
                    &incentive,
                    config.swap.min_salary,
                )
                .with_context(|| format!("late swap failed for entry {}", entry.entry_id))?;
                swapped.push((entry, lineup));
            }

            let out =
                export::timestamped_path(Path::new(&config.data.output_dir), "late-swap-entries");
            ensure_output_dir(&config)?;
            export::write_swapped_entries(&out, &swapped)
                .context("failed to write swapped entries")?;
        }
        Command::Run(args) => {
            let (lineups, pool) = generate_pool(&config, &args)?;
            ensure_output_dir(&config)?;
            let pool_out =
                export::timestamped_path(Path::new(&config.data.output_dir), "lineup-pool");
            export::write_lineup_pool(&pool_out, &lineups)
                .context("failed to write lineup pool")?;

            let ranked = ranker::rank_lineups(&lineups, &pool, &config.ranker);
            let ranked_out =
                export::timestamped_path(Path::new(&config.data.output_dir), "ranked-pool");
            export::write_ranked(&ranked_out, &ranked).context("failed to write ranked pool")?;
        }
    }

    Ok(())
}

/// Shared generate path: load the pool, run the sampler, return the slotted
/// lineups along with the pool (the run pipeline ranks against it).
fn generate_pool(
    config: &OptimizerConfig,
    args: &GenerateArgs,
) -> anyhow::Result<(Vec<fastbreak::optimize::assigner::SlottedLineup>, Vec<fastbreak::data::Player>)> {
    let pool = load_pool(
        config,
        args.entries.as_deref(),
        args.projections.as_deref(),
        ProjectionJoin::Require,
    )?;
    let floor = args.min_projection.unwrap_or(config.generation.min_projection);
    let pool = filter_min_projection(pool, floor);
    info!("loaded {} projected players", pool.len());

    let settings = SamplerSettings {
        target: args.target.unwrap_or(config.generation.target),
        min_unique: args.min_unique.unwrap_or(config.generation.min_unique),
        noise: args.noise.unwrap_or(config.generation.noise),
        overproduce_factor: config.generation.overproduce_factor,
    };
    let strategy = args.strategy.unwrap_or(config.generation.strategy);

    let generated = sampler::generate(
        &pool,
        &config.roster,
        &SlotWeights::assignment(),
        &settings,
        strategy,
    )
    .context("lineup generation failed")?;

    if generated.shortfall > 0 {
        warn!(
            "generated {} of {} requested lineups",
            generated.lineups.len(),
            settings.target
        );
    }
    Ok((generated.lineups, pool))
}

fn entries_path(config: &OptimizerConfig, arg: Option<&Path>) -> PathBuf {
    match arg {
        Some(path) => path.to_path_buf(),
        None => Path::new(&config.data.data_dir).join("DKEntries.csv"),
    }
}

fn load_pool(
    config: &OptimizerConfig,
    entries: Option<&Path>,
    projections: Option<&Path>,
    join: ProjectionJoin,
) -> anyhow::Result<Vec<fastbreak::data::Player>> {
    let entries_path = entries_path(config, entries);
    let projections_path = match projections {
        Some(path) => path.to_path_buf(),
        None => latest_projections(Path::new(&config.data.data_dir))
            .context("no projections file found")?,
    };
    info!(
        "loading pool from {} with projections {}",
        entries_path.display(),
        projections_path.display()
    );
    let pool = load_players(&entries_path, &projections_path, join)
        .context("failed to load player pool")?;
    Ok(pool)
}

fn ensure_output_dir(config: &OptimizerConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.data.output_dir).with_context(|| {
        format!("failed to create output directory {}", config.data.output_dir)
    })
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fastbreak=info,warn")),
        )
        .with_target(false)
        .init();
}
