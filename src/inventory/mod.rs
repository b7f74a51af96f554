//! Inventory builders
//!
//! Each builder turns one external source into a set of canonical paths (or
//! a path to hash map). Builders are independent of each other and of the
//! reconciliation that consumes them.

mod lister;
mod walk;

pub use lister::{GitLister, RepoLister, WalkLister};
pub use walk::{TreeWalker, WalkOptions};

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use crate::error::ArchdiffError;
use crate::exclusion::IgnoreMatcher;
use crate::logging::*;
use crate::package_db::Package;
use crate::paths;

/// Pristine backup hashes keyed by canonical path
pub type BackupRecords = BTreeMap<String, String>;

/// Snapshot of all four sources, built once per run
#[derive(Debug, Clone, Default)]
pub struct Inventory {
	/// Paths some installed package owns
	pub package_owned: HashSet<String>,

	/// Backup files and their as-installed hashes
	pub backups: BackupRecords,

	/// Files on the live tree that survived the ignore filter
	pub live: BTreeSet<String>,

	/// Files the repository tracks
	pub repo: BTreeSet<String>,
}

fn canonical_or_warn(package: &Package, path: &str) -> Option<String> {
	let canonical = paths::canonicalize(path);
	if canonical.is_none() {
		warn!("Package {} records an unusable path {:?}", package.name, path);
	}
	canonical
}

/// Union of every package's file list
///
/// No ignore filtering: ownership is ground truth regardless of local policy.
pub fn build_package_owned_files(packages: &[Package]) -> HashSet<String> {
	packages
		.iter()
		.flat_map(|pkg| pkg.files.iter().filter_map(move |f| canonical_or_warn(pkg, f)))
		.collect()
}

/// Every package's backup files and their pristine hashes
pub fn build_backup_records(packages: &[Package]) -> BackupRecords {
	let mut records = BackupRecords::new();
	for pkg in packages {
		for backup in &pkg.backup {
			let path = match canonical_or_warn(pkg, &backup.path) {
				Some(p) => p,
				None => continue,
			};
			if let Some(previous) = records.insert(path.clone(), backup.hash.clone()) {
				if previous != backup.hash {
					debug!("Backup file {} recorded by several packages, {} wins", path, pkg.name);
				}
			}
		}
	}
	records
}

/// Walk the live tree, pruning ignored directories and skipping ignored files
///
/// `prune` names canonical subtrees that are never part of the live tree,
/// such as the repository when it lives under the root.
pub fn build_live_files(
	root: &Path,
	matcher: &IgnoreMatcher,
	prune: Option<String>,
	options: WalkOptions,
) -> Result<BTreeSet<String>, ArchdiffError> {
	// A missing root is fatal, unlike nodes vanishing mid-walk
	std::fs::metadata(root).map_err(|e| ArchdiffError::io(root, e))?;

	let mut walker = TreeWalker::new(root, options).ignore(matcher);
	if let Some(prune) = prune {
		walker = walker.prune(prune);
	}
	walker.walk()
}

/// List the repository through the configured lister
pub fn build_repo_files(
	repo_root: &Path,
	lister: &dyn RepoLister,
) -> Result<BTreeSet<String>, ArchdiffError> {
	let files = lister.list(repo_root)?;
	debug!("{} lister found {} repository files", lister.name(), files.len());
	Ok(files)
}


// vim: ts=4
