use std::path::PathBuf;
use thiserror::Error;

/// First season covered by the scraped history
pub const FIRST_SEASON: i32 = 2014;
/// Last season covered by the scraped history
pub const LAST_SEASON: i32 = 2024;

/// Pipeline error types
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read table: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    /// A cleaned table the join depends on does not exist yet
    #[error("Required cleaned input missing: {}", .0.display())]
    MissingInput(PathBuf),

    /// Every source page failed or had no matching table
    #[error("No {0} table was scraped; nothing written")]
    NothingScraped(&'static str),

    #[error("Row has {actual} cells but the table has {expected} columns")]
    RowWidth { expected: usize, actual: usize },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Training error: {0}")]
    Training(String),

    #[cfg(feature = "scraper")]
    #[error("Scraper error: {0}")]
    Scrape(#[from] crate::scraper::ScraperError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Validation functions
pub fn validate_season(season: i32) -> Result<()> {
    if !(FIRST_SEASON..=LAST_SEASON).contains(&season) {
        return Err(PipelineError::Validation(format!(
            "Season must be between {} and {}, got {}",
            FIRST_SEASON, LAST_SEASON, season
        )));
    }
    Ok(())
}

pub fn validate_window(window: usize) -> Result<()> {
    if window == 0 {
        return Err(PipelineError::Validation(
            "Momentum window must be at least 1".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_splits(n_samples: usize, n_splits: usize) -> Result<()> {
    if n_splits < 2 {
        return Err(PipelineError::Validation(format!(
            "At least 2 time-series splits required, got {}",
            n_splits
        )));
    }
    if n_splits + 1 > n_samples {
        return Err(PipelineError::Validation(format!(
            "Cannot make {} splits from {} samples",
            n_splits, n_samples
        )));
    }
    Ok(())
}
