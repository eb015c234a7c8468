//! Data loading, cleaning, joining and feature engineering modules

pub mod cleaning;
pub mod csv_loader;
pub mod features;
pub mod history;
pub mod joiner;
pub mod normalizer;
pub mod sanitizer;
pub mod schema;
pub mod table;

// Re-export commonly used types
pub use cleaning::{clean_file, clean_table, CleanSummary};
pub use csv_loader::{load_table, write_table};
pub use features::{
    parse_number, parse_session_time, FeatureEngineering, FeatureSet, BASE_FEATURE_NAMES,
};
pub use joiner::{join, load_and_join};
pub use normalizer::ColumnNormalizer;
pub use schema::{project, TableKind, QUALIFYING_COLUMNS, RACE_COLUMNS};
pub use table::{Cell, Table};
