//! Reconciliation of the live tree against the package database and the repository
//!
//! Given an [`Inventory`], derives:
//! - `unpackaged`: live files no package owns
//! - `modified_backup`: backup files whose live hash differs from the pristine one
//! - `diverged_from_repo`: repository files whose live copy has different content
//! - `missing_in_repo`: modified backups and unpackaged files the repository lacks
//!
//! Every set is sorted by path, so output never depends on traversal order.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{ArchdiffError, HashError};
use crate::exclusion::IgnoreMatcher;
use crate::hasher::ContentHasher;
use crate::inventory::Inventory;
use crate::logging::*;
use crate::paths;
use crate::types::{DiffCategory, EntrySet, FileEntry};

/// Result of one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
	pub modified_backup: EntrySet,
	pub unpackaged: EntrySet,
	pub missing_in_repo: EntrySet,
	pub diverged_from_repo: EntrySet,
}

impl Reconciliation {
	pub fn category(&self, category: DiffCategory) -> &EntrySet {
		match category {
			DiffCategory::ModifiedBackup => &self.modified_backup,
			DiffCategory::Unpackaged => &self.unpackaged,
			DiffCategory::MissingInRepo => &self.missing_in_repo,
			DiffCategory::DivergedFromRepo => &self.diverged_from_repo,
		}
	}

	/// `missing_in_repo ∪ diverged_from_repo`, deduplicated and sorted by path
	pub fn report(&self) -> Vec<&FileEntry> {
		let union: BTreeSet<&FileEntry> =
			self.missing_in_repo.iter().chain(self.diverged_from_repo.iter()).collect();
		union.into_iter().collect()
	}

	/// The report with a one-letter tag per entry
	///
	/// `R` diverged from the repository, `B` modified backup, `?` unpackaged.
	pub fn tagged_report(&self) -> Vec<(char, &FileEntry)> {
		self.report()
			.into_iter()
			.map(|entry| {
				let tag = if self.diverged_from_repo.contains(entry.path.as_str()) {
					'R'
				} else if self.modified_backup.contains(entry.path.as_str()) {
					'B'
				} else {
					'?'
				};
				(tag, entry)
			})
			.collect()
	}
}

/// Outcome of hashing one side of a comparison
enum Probe {
	Hash(String),
	Missing,
	Denied,
}

/// Combines the inventories into the diff categories
pub struct ReconciliationEngine<'a> {
	root: &'a Path,
	repo_root: &'a Path,
	matcher: &'a IgnoreMatcher,
	hasher: &'a ContentHasher,
	quiet: bool,
}

impl<'a> ReconciliationEngine<'a> {
	pub fn new(
		root: &'a Path,
		repo_root: &'a Path,
		matcher: &'a IgnoreMatcher,
		hasher: &'a ContentHasher,
	) -> Self {
		ReconciliationEngine { root, repo_root, matcher, hasher, quiet: false }
	}

	/// Log skipped files at debug instead of warn
	pub fn quiet(mut self, quiet: bool) -> Self {
		self.quiet = quiet;
		self
	}

	pub fn reconcile(&self, inventory: &Inventory) -> Result<Reconciliation, ArchdiffError> {
		let unpackaged = self.unpackaged(inventory);
		let modified_backup = self.modified_backup(inventory)?;
		let diverged_from_repo = self.diverged_from_repo(inventory)?;

		let missing_in_repo: EntrySet = modified_backup
			.iter()
			.chain(unpackaged.iter())
			.filter(|entry| !inventory.repo.contains(entry.path.as_str()))
			.cloned()
			.collect();

		info!(
			"Reconciled: {} unpackaged, {} modified backups, {} missing in repo, {} diverged",
			unpackaged.len(),
			modified_backup.len(),
			missing_in_repo.len(),
			diverged_from_repo.len()
		);

		Ok(Reconciliation { modified_backup, unpackaged, missing_in_repo, diverged_from_repo })
	}

	fn unpackaged(&self, inventory: &Inventory) -> EntrySet {
		inventory
			.live
			.iter()
			.filter(|path| !inventory.package_owned.contains(path.as_str()))
			.map(|path| FileEntry::new(path.as_str()))
			.collect()
	}

	fn modified_backup(&self, inventory: &Inventory) -> Result<EntrySet, ArchdiffError> {
		let mut modified = EntrySet::new();

		for (path, pristine) in &inventory.backups {
			if self.matcher.matches(path) {
				continue;
			}

			match self.probe(&paths::join(self.root, path))? {
				Probe::Hash(actual) => {
					if actual != *pristine {
						debug!("Backup file {} modified", path);
						modified.insert(FileEntry::with_hash(path.as_str(), actual));
					}
				}
				// Absent means reverted to "no content", not changed
				Probe::Missing | Probe::Denied => {}
			}
		}

		Ok(modified)
	}

	fn diverged_from_repo(&self, inventory: &Inventory) -> Result<EntrySet, ArchdiffError> {
		let mut diverged = EntrySet::new();

		for path in &inventory.repo {
			if self.matcher.matches(path) {
				continue;
			}

			let live = self.probe(&paths::join(self.root, path))?;
			if let Probe::Denied = live {
				continue;
			}
			let repo = self.probe(&paths::join(self.repo_root, path))?;

			// A file present on only one side is a divergence
			let entry = match (live, repo) {
				(_, Probe::Denied) | (Probe::Denied, _) => continue,
				(Probe::Hash(l), Probe::Hash(r)) if l == r => continue,
				(Probe::Missing, Probe::Missing) => continue,
				(Probe::Hash(l), _) => FileEntry::with_hash(path.as_str(), l),
				(Probe::Missing, _) => FileEntry::new(path.as_str()),
			};
			debug!("Repository file {} diverged", path);
			diverged.insert(entry);
		}

		Ok(diverged)
	}

	fn probe(&self, path: &Path) -> Result<Probe, ArchdiffError> {
		match self.hasher.hash(path) {
			Ok(hash) => Ok(Probe::Hash(hash)),
			Err(HashError::NotFound { .. }) => Ok(Probe::Missing),
			Err(HashError::PermissionDenied { path }) => {
				skip_log!(self.quiet, "Skipping {}: permission denied", path.display());
				Ok(Probe::Denied)
			}
			Err(e) => Err(e.into()),
		}
	}
}

/// Package-owned files that are neither ignored nor present on the live tree
///
/// Only a stat is made per path; nothing is hashed.
pub fn find_deleted(
	inventory: &Inventory,
	root: &Path,
	matcher: &IgnoreMatcher,
	quiet: bool,
) -> Result<BTreeSet<String>, ArchdiffError> {
	let mut deleted = BTreeSet::new();

	for path in &inventory.package_owned {
		if matcher.matches(path) {
			continue;
		}
		let full = paths::join(root, path);
		match fs::symlink_metadata(&full) {
			Ok(_) => {}
			Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) =>
			{
				deleted.insert(path.clone());
			}
			Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
				skip_log!(quiet, "Skipping {}: permission denied", full.display());
			}
			Err(e) => return Err(ArchdiffError::io(full, e)),
		}
	}

	Ok(deleted)
}


// vim: ts=4
