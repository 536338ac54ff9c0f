//! doctidy - scan, classify, dedupe, relocate and score markdown documentation.
//!
//! The pipeline runs in phases: [`scanner::scan_directory`] produces
//! [`FileRecord`]s, [`Inventory::new`] classifies them, [`audit`] reports
//! duplicates and gaps, [`MigrationPlanner`] maps every file to its new home,
//! [`MigrationSession`] moves files and rewrites links, and [`quality`] scores
//! the result.

pub mod audit;
pub mod classify;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod gaps;
pub mod links;
pub mod logging;
pub mod markdown;
pub mod migrate;
pub mod model;
pub mod planner;
pub mod quality;
pub mod rewrite;
pub mod scanner;
pub mod session;
pub mod similarity;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{Category, FileRecord, Inventory};
pub use planner::{MigrationMapping, MigrationPlanner};
pub use session::{MigrationReport, MigrationSession};
