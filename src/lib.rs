//! # archdiff - Find local changes on a pacman-managed system
//!
//! archdiff compares three views of a system: the files installed packages
//! claim, the files actually on disk, and a shadow repository of
//! deliberately kept configuration. It reports files nobody owns, backup
//! files edited since install, and files that drifted from the repository,
//! and can copy changes between the live tree and the repository.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use archdiff::{Config, Pipeline};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::from_config(Config::discover()?)?;
//!     let inventory = pipeline.inventory()?;
//!     let reconciliation = pipeline.reconcile(&inventory)?;
//!     for (tag, entry) in reconciliation.tagged_report() {
//!         println!("{} {}", tag, entry.path);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod exclusion;
pub mod hasher;
pub mod inventory;
pub mod logging;
pub mod package_db;
pub mod paths;
pub mod pipeline;
pub mod reconcile;
pub mod sync;
pub mod types;

// Re-export commonly used types and functions
pub use config::Config;
pub use error::{ArchdiffError, HashError};
pub use exclusion::IgnoreMatcher;
pub use pipeline::Pipeline;
pub use reconcile::Reconciliation;
pub use types::{DiffCategory, FileEntry, ListCategory};

// vim: ts=4
