//! Configuration for the F1 pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::TableKind;
use crate::error::{validate_season, validate_window, Result};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "f1race";

/// File locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
    #[serde(default = "default_clean_dir")]
    pub clean_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_clean_dir() -> PathBuf {
    PathBuf::from("data/clean")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/output")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: default_raw_dir(),
            clean_dir: default_clean_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl PathsConfig {
    pub fn raw_path(&self, kind: TableKind) -> PathBuf {
        self.raw_dir.join(kind.raw_file_name())
    }

    pub fn clean_path(&self, kind: TableKind) -> PathBuf {
        self.clean_dir.join(kind.clean_file_name())
    }

    pub fn features_path(&self) -> PathBuf {
        self.output_dir.join("f1_features.csv")
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join("training_report.json")
    }
}

/// Scraping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Delay between requests in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_delay_ms() -> u64 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_user_agent() -> String {
    concat!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
        "(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
    )
    .to_string()
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

/// Feature engineering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Number of prior events averaged by the momentum features
    #[serde(default = "default_momentum_window")]
    pub momentum_window: usize,
}

fn default_momentum_window() -> usize {
    crate::data::history::MOMENTUM_WINDOW
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            momentum_window: default_momentum_window(),
        }
    }
}

/// Model training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Season held out for evaluation; earlier seasons train
    #[serde(default = "default_test_season")]
    pub test_season: i32,
    #[serde(default = "default_n_iter")]
    pub n_iter: usize,
    #[serde(default = "default_n_splits")]
    pub n_splits: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_test_season() -> i32 {
    2024
}

fn default_n_iter() -> usize {
    50
}

fn default_n_splits() -> usize {
    5
}

fn default_seed() -> u64 {
    42
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_season: default_test_season(),
            n_iter: default_n_iter(),
            n_splits: default_n_splits(),
            seed: default_seed(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

impl PipelineConfig {
    /// Load configuration from `f1race.toml` (if present) and environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of the default file
    ///
    /// Environment variables override file values, e.g.
    /// `F1RACE_TRAINING__TEST_SEASON=2023`.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(CONFIG_FILE).required(false),
        };

        let config: PipelineConfig = config::Config::builder()
            .add_source(config::Config::try_from(&PipelineConfig::default())?)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("F1RACE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_window(self.features.momentum_window)?;
        validate_season(self.training.test_season)?;
        Ok(())
    }
}
