//! Read-only access to the package database
//!
//! The reconciliation only needs two things from a package manager: which
//! files each installed package owns, and the pristine hashes of the backup
//! (configuration) files it tracks.

mod manifest;
mod pacman;

pub use manifest::ManifestDatabase;
pub use pacman::PacmanDatabase;

use serde::{Deserialize, Serialize};

use crate::error::ArchdiffError;
use crate::hasher::HashAlgorithm;

/// A backup file and its as-installed content hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupFile {
	pub path: String,
	pub hash: String,
}

/// An installed package
///
/// Paths are stored as the database records them; inventory builders
/// normalize them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
	pub name: String,
	pub version: String,
	pub files: Vec<String>,
	pub backup: Vec<BackupFile>,
}

/// Source of installed package records
pub trait PackageDatabase {
	/// Every installed package
	fn packages(&self) -> Result<Vec<Package>, ArchdiffError>;

	/// Digest the database used for its backup hashes
	fn hash_algorithm(&self) -> HashAlgorithm {
		HashAlgorithm::Md5
	}
}

/// Parse pacman-style `%SECTION%` files
///
/// Each section starts with a `%NAME%` header line and runs until a blank line.
pub(crate) fn parse_sections(contents: &str) -> Vec<(String, Vec<String>)> {
	let mut sections: Vec<(String, Vec<String>)> = Vec::new();
	let mut current: Option<(String, Vec<String>)> = None;

	for line in contents.lines() {
		if line.is_empty() {
			if let Some(section) = current.take() {
				sections.push(section);
			}
			continue;
		}

		if line.len() > 2 && line.starts_with('%') && line.ends_with('%') && current.is_none() {
			current = Some((line[1..line.len() - 1].to_string(), Vec::new()));
			continue;
		}

		if let Some((_, values)) = current.as_mut() {
			values.push(line.to_string());
		}
	}

	if let Some(section) = current.take() {
		sections.push(section);
	}
	sections
}


// vim: ts=4
