//! F1 Race - Formula 1 results pipeline
//!
//! This library provides:
//! - Scraping of race and qualifying tables from encyclopedia pages
//! - Cleaning of heterogeneous raw tables into a fixed schema
//! - Feature engineering with leakage-safe driver momentum
//! - Gradient-boosted finishing position model with season hold-out
//!
//! # Example
//!
//! ```no_run
//! use f1race::config::PipelineConfig;
//! use f1race::pipeline;
//!
//! let config = PipelineConfig::load()?;
//! pipeline::clean_all(&config)?;
//!
//! let features = pipeline::build_features(&config)?;
//! println!("{} feature rows", features.len());
//! # Ok::<(), f1race::error::PipelineError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod training;

#[cfg(feature = "scraper")]
pub mod scraper;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use data::{FeatureEngineering, FeatureSet, Table, TableKind};
pub use error::{PipelineError, Result};
pub use models::{EventKey, FeatureRecord, JoinedRecord};
pub use training::{Trainer, TrainingReport};
