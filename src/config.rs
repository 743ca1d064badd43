// Configuration loading and parsing (config/optimizer.toml).
//
// Every section is optional; a missing file or section falls back to the
// standard DraftKings NBA classic contest settings.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::optimize::sampler::Strategy;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// optimizer.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire optimizer.toml file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub roster: RosterRules,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub swap: SwapConfig,
    #[serde(default)]
    pub ranker: RankerConfig,
    #[serde(default)]
    pub data: DataConfig,
}

/// Contest-level roster constraints shared by every solve.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RosterRules {
    pub salary_cap: u32,
    pub roster_size: usize,
    pub min_games: usize,
}

impl Default for RosterRules {
    fn default() -> Self {
        RosterRules {
            salary_cap: 50_000,
            roster_size: 8,
            min_games: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Number of rosters to generate.
    pub target: usize,
    /// Minimum players that must differ between any two rosters.
    pub min_unique: usize,
    /// Projection noise magnitude, as a fraction of each projection.
    pub noise: f64,
    pub strategy: Strategy,
    /// Candidate multiplier for the overproduce strategy.
    pub overproduce_factor: f64,
    /// Pool floor: players projecting below this never enter a solve.
    pub min_projection: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            target: 20,
            min_unique: 1,
            noise: 0.1,
            strategy: Strategy::Sequential,
            overproduce_factor: 3.0,
            min_projection: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SwapConfig {
    /// Salary floor for re-optimized rosters. Leaving cap room on the table
    /// late in a slate is almost always a projection giveaway.
    pub min_salary: u32,
    /// Replacement-candidate projection floor. Lower than the generation
    /// floor; mid-slate an unprojected player is noise, not upside.
    pub min_projection: f64,
}

impl Default for SwapConfig {
    fn default() -> Self {
        SwapConfig {
            min_salary: 49_500,
            min_projection: 1.0,
        }
    }
}

/// Rank-sum weights for the three lineup metrics: total projection, total
/// ownership, and geometric-mean ownership.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    pub projection_weight: f64,
    pub ownership_weight: f64,
    pub geo_ownership_weight: f64,
}

impl Default for RankerConfig {
    fn default() -> Self {
        RankerConfig {
            projection_weight: 0.85,
            ownership_weight: 0.0,
            geo_ownership_weight: 0.15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory scanned for DKSalaries/DKEntries and projection exports.
    pub data_dir: String,
    /// Directory where generated CSVs are written.
    pub output_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            data_dir: "data".into(),
            output_dir: "output".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load configuration from `config/optimizer.toml` under `base_dir`. A
/// missing file yields the defaults; a present-but-broken file is an error.
pub fn load_config_from(base_dir: &Path) -> Result<OptimizerConfig, ConfigError> {
    let path = base_dir.join("config").join("optimizer.toml");

    let config = if path.exists() {
        let text =
            std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
                path: path.clone(),
            })?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?
    } else {
        tracing::info!("no config file at {}, using defaults", path.display());
        OptimizerConfig::default()
    };

    validate(&config)?;

    Ok(config)
}

/// Convenience wrapper: loads config relative to the current working directory.
pub fn load_config() -> Result<OptimizerConfig, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &OptimizerConfig) -> Result<(), ConfigError> {
    let roster = &config.roster;
    if roster.salary_cap == 0 {
        return Err(ConfigError::ValidationError {
            field: "roster.salary_cap".into(),
            message: "must be greater than 0".into(),
        });
    }
    // The slot layout (PG/SG/SF/PF/C/G/F/UTIL) fixes the roster size.
    if roster.roster_size != 8 {
        return Err(ConfigError::ValidationError {
            field: "roster.roster_size".into(),
            message: format!("must be 8 for the classic slot layout, got {}", roster.roster_size),
        });
    }
    if roster.min_games == 0 {
        return Err(ConfigError::ValidationError {
            field: "roster.min_games".into(),
            message: "must be at least 1".into(),
        });
    }

    let gen = &config.generation;
    if gen.target == 0 {
        return Err(ConfigError::ValidationError {
            field: "generation.target".into(),
            message: "must be greater than 0".into(),
        });
    }
    if gen.min_unique == 0 || gen.min_unique > roster.roster_size {
        return Err(ConfigError::ValidationError {
            field: "generation.min_unique".into(),
            message: format!(
                "must be between 1 and {}, got {}",
                roster.roster_size, gen.min_unique
            ),
        });
    }
    if !(0.0..=1.0).contains(&gen.noise) {
        return Err(ConfigError::ValidationError {
            field: "generation.noise".into(),
            message: format!("must be between 0.0 and 1.0 inclusive, got {}", gen.noise),
        });
    }
    if gen.overproduce_factor < 1.0 {
        return Err(ConfigError::ValidationError {
            field: "generation.overproduce_factor".into(),
            message: format!("must be at least 1.0, got {}", gen.overproduce_factor),
        });
    }
    if gen.min_projection < 0.0 {
        return Err(ConfigError::ValidationError {
            field: "generation.min_projection".into(),
            message: format!("must be >= 0, got {}", gen.min_projection),
        });
    }

    if config.swap.min_projection < 0.0 {
        return Err(ConfigError::ValidationError {
            field: "swap.min_projection".into(),
            message: format!("must be >= 0, got {}", config.swap.min_projection),
        });
    }
    if config.swap.min_salary > roster.salary_cap {
        return Err(ConfigError::ValidationError {
            field: "swap.min_salary".into(),
            message: format!(
                "cannot exceed roster.salary_cap ({}), got {}",
                roster.salary_cap, config.swap.min_salary
            ),
        });
    }

    let r = &config.ranker;
    let weight_fields: &[(&str, f64)] = &[
        ("ranker.projection_weight", r.projection_weight),
        ("ranker.ownership_weight", r.ownership_weight),
        ("ranker.geo_ownership_weight", r.geo_ownership_weight),
    ];
    for (name, val) in weight_fields {
        if *val < 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be >= 0, got {val}"),
            });
        }
    }
    if r.projection_weight + r.ownership_weight + r.geo_ownership_weight <= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "ranker".into(),
            message: "at least one weight must be positive".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tmp_root(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(format!("optimizer_config_{name}"));
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        tmp
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tmp_root("missing");
        fs::remove_dir_all(tmp.join("config")).unwrap();

        let config = load_config_from(&tmp).expect("defaults should load");
        assert_eq!(config.roster.salary_cap, 50_000);
        assert_eq!(config.roster.roster_size, 8);
        assert_eq!(config.roster.min_games, 2);
        assert_eq!(config.generation.target, 20);
        assert_eq!(config.generation.strategy, Strategy::Sequential);
        assert!((config.generation.min_projection - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.swap.min_salary, 49_500);
        assert!((config.swap.min_projection - 1.0).abs() < f64::EPSILON);
        assert!((config.ranker.projection_weight - 0.85).abs() < f64::EPSILON);
        assert_eq!(config.data.data_dir, "data");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let tmp = tmp_root("partial");
        fs::write(
            tmp.join("config/optimizer.toml"),
            r#"
[generation]
target = 150
min_unique = 3
noise = 0.1
strategy = "overproduce"
overproduce_factor = 2.5
min_projection = 12.0
"#,
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("should load");
        assert_eq!(config.generation.target, 150);
        assert_eq!(config.generation.min_unique, 3);
        assert_eq!(config.generation.strategy, Strategy::Overproduce);
        assert!((config.generation.min_projection - 12.0).abs() < f64::EPSILON);
        // Untouched sections keep their defaults.
        assert_eq!(config.roster.salary_cap, 50_000);
        assert_eq!(config.swap.min_salary, 49_500);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = tmp_root("invalid");
        fs::write(tmp.join("config/optimizer.toml"), "this is not valid [[[ toml").unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ParseError { path, .. } => {
                assert!(path.ends_with("optimizer.toml"));
            }
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_salary_cap() {
        let tmp = tmp_root("cap_zero");
        fs::write(
            tmp.join("config/optimizer.toml"),
            "[roster]\nsalary_cap = 0\nroster_size = 8\nmin_games = 2\n",
        )
        .unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "roster.salary_cap");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_non_classic_roster_size() {
        let tmp = tmp_root("size_nine");
        fs::write(
            tmp.join("config/optimizer.toml"),
            "[roster]\nsalary_cap = 50000\nroster_size = 9\nmin_games = 2\n",
        )
        .unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "roster.roster_size");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_min_unique_above_roster_size() {
        let tmp = tmp_root("min_unique");
        fs::write(
            tmp.join("config/optimizer.toml"),
            r#"
[generation]
target = 20
min_unique = 9
noise = 0.05
strategy = "sequential"
overproduce_factor = 3.0
"#,
        )
        .unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "generation.min_unique");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_negative_min_projection() {
        let tmp = tmp_root("neg_floor");
        fs::write(
            tmp.join("config/optimizer.toml"),
            "[swap]\nmin_projection = -1.0\n",
        )
        .unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "swap.min_projection");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_min_salary_above_cap() {
        let tmp = tmp_root("floor_above_cap");
        fs::write(
            tmp.join("config/optimizer.toml"),
            "[swap]\nmin_salary = 60000\n",
        )
        .unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "swap.min_salary");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_all_zero_ranker_weights() {
        let tmp = tmp_root("zero_weights");
        fs::write(
            tmp.join("config/optimizer.toml"),
            "[ranker]\nprojection_weight = 0.0\nownership_weight = 0.0\ngeo_ownership_weight = 0.0\n",
        )
        .unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "ranker");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
