//! Recursive tree walk shared by the live and repository inventories

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ArchdiffError;
use crate::exclusion::IgnoreMatcher;
use crate::logging::*;
use crate::paths;

/// How a walk reacts to unreadable nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
	/// Permission errors abort the walk instead of skipping the node
	pub strict: bool,

	/// Skipped nodes are logged at debug instead of warn
	pub quiet: bool,
}

/// Walks a tree and collects canonical paths of every non-directory entry
///
/// Symlinks are recorded as entries and never followed. A directory matched
/// by the ignore matcher, or listed in `prune`, is not descended into.
pub struct TreeWalker<'a> {
	root: &'a Path,
	matcher: Option<&'a IgnoreMatcher>,
	prune: Vec<String>,
	options: WalkOptions,
}

impl<'a> TreeWalker<'a> {
	pub fn new(root: &'a Path, options: WalkOptions) -> Self {
		TreeWalker { root, matcher: None, prune: Vec::new(), options }
	}

	/// Filter every visited node through `matcher`
	pub fn ignore(mut self, matcher: &'a IgnoreMatcher) -> Self {
		self.matcher = Some(matcher);
		self
	}

	/// Never descend into the given canonical path
	pub fn prune(mut self, canonical: impl Into<String>) -> Self {
		self.prune.push(canonical.into());
		self
	}

	pub fn walk(&self) -> Result<BTreeSet<String>, ArchdiffError> {
		let mut files = BTreeSet::new();
		self.visit(self.root, &mut files)?;
		Ok(files)
	}

	fn visit(&self, dir: &Path, files: &mut BTreeSet<String>) -> Result<(), ArchdiffError> {
		let entries = match fs::read_dir(dir) {
			Ok(e) => e,
			Err(e) => return self.tolerate(dir, e),
		};

		for entry_result in entries {
			let entry = match entry_result {
				Ok(e) => e,
				Err(e) => {
					self.tolerate(dir, e)?;
					continue;
				}
			};

			let path = entry.path();
			let canonical = match paths::relative_to(&path, self.root) {
				Some(c) => c,
				None => {
					warn!("Skipping non UTF-8 path {:?}", path);
					continue;
				}
			};

			// Ignore check comes before anything else touches the node
			if let Some(rule) = self.matcher.and_then(|m| m.matching_rule(&canonical)) {
				debug!("Ignoring {} ({})", canonical, rule.pattern());
				continue;
			}
			if self.prune.iter().any(|p| *p == canonical) {
				debug!("Pruning {}", canonical);
				continue;
			}

			let file_type = match entry.file_type() {
				Ok(t) => t,
				Err(e) => {
					self.tolerate(&path, e)?;
					continue;
				}
			};

			if file_type.is_dir() {
				self.visit(&path, files)?;
			} else {
				files.insert(canonical);
			}
		}

		Ok(())
	}

	/// Resolve an error on a single node: skip it, or abort the walk
	fn tolerate(&self, path: &Path, e: io::Error) -> Result<(), ArchdiffError> {
		match e.kind() {
			io::ErrorKind::PermissionDenied if self.options.strict => {
				Err(ArchdiffError::PermissionDenied { path: PathBuf::from(path) })
			}
			io::ErrorKind::PermissionDenied => {
				skip_log!(self.options.quiet, "Skipping {}: permission denied", path.display());
				Ok(())
			}
			io::ErrorKind::NotFound => {
				// Removed while we were walking
				debug!("Vanished during walk: {}", path.display());
				Ok(())
			}
			_ => Err(ArchdiffError::io(path, e)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn touch(root: &Path, rel: &str) {
		let path = root.join(rel);
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		fs::write(path, rel).unwrap();
	}

	#[test]
	fn test_walk_collects_canonical_files() {
		let temp_dir = TempDir::new().unwrap();
		touch(temp_dir.path(), "etc/hostname");
		touch(temp_dir.path(), "etc/conf.d/net");
		fs::create_dir_all(temp_dir.path().join("empty/dir")).unwrap();

		let files = TreeWalker::new(temp_dir.path(), WalkOptions::default()).walk().unwrap();
		let files: Vec<&str> = files.iter().map(|s| s.as_str()).collect();
		assert_eq!(files, vec!["/etc/conf.d/net", "/etc/hostname"]);
	}

	#[test]
	fn test_ignored_directories_are_pruned() {
		let temp_dir = TempDir::new().unwrap();
		touch(temp_dir.path(), "var/log/x.log");
		touch(temp_dir.path(), "var/log/journal/system.journal");
		touch(temp_dir.path(), "var/lib/thing");

		let matcher = IgnoreMatcher::builder().patterns("test", &["/var/log"]).build().unwrap();
		let files = TreeWalker::new(temp_dir.path(), WalkOptions::default())
			.ignore(&matcher)
			.walk()
			.unwrap();

		assert_eq!(files.into_iter().collect::<Vec<_>>(), vec!["/var/lib/thing".to_string()]);
	}

	#[test]
	fn test_prune_skips_subtree() {
		let temp_dir = TempDir::new().unwrap();
		touch(temp_dir.path(), "srv/repo/etc/a.conf");
		touch(temp_dir.path(), "srv/other");

		let files = TreeWalker::new(temp_dir.path(), WalkOptions::default())
			.prune("/srv/repo")
			.walk()
			.unwrap();

		assert_eq!(files.into_iter().collect::<Vec<_>>(), vec!["/srv/other".to_string()]);
	}

	#[test]
	fn test_tolerate_by_error_kind() {
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("etc");
		let denied = || io::Error::from(io::ErrorKind::PermissionDenied);

		let lenient = TreeWalker::new(temp_dir.path(), WalkOptions::default());
		assert!(lenient.tolerate(&path, denied()).is_ok());
		assert!(lenient.tolerate(&path, io::Error::from(io::ErrorKind::NotFound)).is_ok());
		assert!(matches!(
			lenient.tolerate(&path, io::Error::from(io::ErrorKind::Other)),
			Err(ArchdiffError::Io { .. })
		));

		let strict = TreeWalker::new(temp_dir.path(), WalkOptions { strict: true, quiet: true });
		match strict.tolerate(&path, denied()) {
			Err(ArchdiffError::PermissionDenied { path: p }) => assert_eq!(p, path),
			other => panic!("expected PermissionDenied, got {:?}", other),
		}
		assert!(strict.tolerate(&path, io::Error::from(io::ErrorKind::NotFound)).is_ok());
	}

	#[test]
	fn test_unreadable_directory_strict_and_lenient() {
		use std::os::unix::fs::PermissionsExt;

		let temp_dir = TempDir::new().unwrap();
		touch(temp_dir.path(), "etc/hostname");
		touch(temp_dir.path(), "root/.bashrc");
		let locked = temp_dir.path().join("root");
		fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
		if fs::read_dir(&locked).is_ok() {
			// Running as root: permissions are not enforced
			fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
			return;
		}

		let lenient = TreeWalker::new(temp_dir.path(), WalkOptions::default()).walk();
		let strict =
			TreeWalker::new(temp_dir.path(), WalkOptions { strict: true, quiet: false }).walk();
		fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

		assert_eq!(lenient.unwrap().into_iter().collect::<Vec<_>>(), vec!["/etc/hostname"]);
		assert!(matches!(strict, Err(ArchdiffError::PermissionDenied { .. })));
	}

	#[test]
	fn test_symlinks_are_entries_not_followed() {
		let temp_dir = TempDir::new().unwrap();
		touch(temp_dir.path(), "real/file");
		std::os::unix::fs::symlink(temp_dir.path().join("real"), temp_dir.path().join("link"))
			.unwrap();

		let files = TreeWalker::new(temp_dir.path(), WalkOptions::default()).walk().unwrap();
		assert!(files.contains("/link"));
		assert!(!files.contains("/link/file"));
		assert!(files.contains("/real/file"));
	}
}

// vim: ts=4
