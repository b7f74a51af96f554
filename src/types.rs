use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A canonical path with an optional content hash
///
/// Equality, ordering and hashing use the path only; the hash is metadata.
#[derive(Clone, Debug)]
pub struct FileEntry {
	pub path: String,
	pub hash: Option<String>,
}

impl FileEntry {
	pub fn new(path: impl Into<String>) -> Self {
		FileEntry { path: path.into(), hash: None }
	}

	pub fn with_hash(path: impl Into<String>, hash: impl Into<String>) -> Self {
		FileEntry { path: path.into(), hash: Some(hash.into()) }
	}
}

impl PartialEq for FileEntry {
	fn eq(&self, other: &Self) -> bool {
		self.path == other.path
	}
}

impl Eq for FileEntry {}

impl PartialOrd for FileEntry {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for FileEntry {
	fn cmp(&self, other: &Self) -> Ordering {
		self.path.cmp(&other.path)
	}
}

impl Hash for FileEntry {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.path.hash(state)
	}
}

impl Borrow<str> for FileEntry {
	fn borrow(&self) -> &str {
		&self.path
	}
}

/// Sorted set of entries keyed by canonical path
pub type EntrySet = BTreeSet<FileEntry>;

/// The four derived diff categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffCategory {
	/// Backup file whose live hash no longer matches the pristine hash
	ModifiedBackup,

	/// Live file no package owns
	Unpackaged,

	/// Modified backup or unpackaged file the repository does not track
	MissingInRepo,

	/// Repository file whose content differs from the live copy
	DivergedFromRepo,
}

impl DiffCategory {
	pub const ALL: [DiffCategory; 4] = [
		DiffCategory::ModifiedBackup,
		DiffCategory::Unpackaged,
		DiffCategory::MissingInRepo,
		DiffCategory::DivergedFromRepo,
	];
}

impl std::fmt::Display for DiffCategory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::ModifiedBackup => write!(f, "modified-backup"),
			Self::Unpackaged => write!(f, "unpackaged"),
			Self::MissingInRepo => write!(f, "missing-in-repo"),
			Self::DivergedFromRepo => write!(f, "diverged-from-repo"),
		}
	}
}

/// Anything `ls` can print: a diff category or one of the raw inventories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListCategory {
	Diff(DiffCategory),
	PackageOwned,
	Backup,
	Live,
	Repo,
	Deleted,
}

impl ListCategory {
	pub const NAMES: &'static [&'static str] = &[
		"modified-backup",
		"unpackaged",
		"missing-in-repo",
		"diverged-from-repo",
		"package-owned",
		"backup",
		"live",
		"repo",
		"deleted",
	];
}

impl FromStr for ListCategory {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"modified-backup" | "modified" => Ok(Self::Diff(DiffCategory::ModifiedBackup)),
			"unpackaged" => Ok(Self::Diff(DiffCategory::Unpackaged)),
			"missing-in-repo" | "missing" => Ok(Self::Diff(DiffCategory::MissingInRepo)),
			"diverged-from-repo" | "diverged" => Ok(Self::Diff(DiffCategory::DivergedFromRepo)),
			"package-owned" | "packaged" => Ok(Self::PackageOwned),
			"backup" => Ok(Self::Backup),
			"live" | "all" => Ok(Self::Live),
			"repo" => Ok(Self::Repo),
			"deleted" => Ok(Self::Deleted),
			_ => Err(format!(
				"Unknown category: {}. Valid options: {}",
				s,
				Self::NAMES.join(", ")
			)),
		}
	}
}

impl std::fmt::Display for ListCategory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Diff(category) => write!(f, "{}", category),
			Self::PackageOwned => write!(f, "package-owned"),
			Self::Backup => write!(f, "backup"),
			Self::Live => write!(f, "live"),
			Self::Repo => write!(f, "repo"),
			Self::Deleted => write!(f, "deleted"),
		}
	}
}


// vim: ts=4
