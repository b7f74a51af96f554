//! One-shot propagation between the live tree and the repository
//!
//! Files missing from the repository are copied live → repository. Diverged
//! files are copied from whichever side was modified more recently.

use filetime::FileTime;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use crate::error::ArchdiffError;
use crate::logging::*;
use crate::paths;
use crate::reconcile::Reconciliation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	LiveToRepo,
	RepoToLive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncReason {
	MissingInRepo,
	Diverged,
}

/// A planned copy of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAction {
	pub path: String,
	pub source: PathBuf,
	pub destination: PathBuf,
	pub direction: Direction,
	pub reason: SyncReason,
}

impl fmt::Display for SyncAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "cp {} {}", self.source.display(), self.destination.display())
	}
}

/// Counts from executing a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
	/// Actions printed instead of performed (dry run)
	pub planned: usize,
	pub copied: usize,
	/// Actions skipped because of a permission error
	pub failed: usize,
}

pub struct SyncPlanner<'a> {
	root: &'a Path,
	repo_root: &'a Path,
	quiet: bool,
}

impl<'a> SyncPlanner<'a> {
	pub fn new(root: &'a Path, repo_root: &'a Path) -> Self {
		SyncPlanner { root, repo_root, quiet: false }
	}

	pub fn quiet(mut self, quiet: bool) -> Self {
		self.quiet = quiet;
		self
	}

	fn action(&self, path: &str, direction: Direction, reason: SyncReason) -> SyncAction {
		let live = paths::join(self.root, path);
		let repo = paths::join(self.repo_root, path);
		let (source, destination) = match direction {
			Direction::LiveToRepo => (live, repo),
			Direction::RepoToLive => (repo, live),
		};
		SyncAction { path: path.to_string(), source, destination, direction, reason }
	}

	/// Plan copies for every entry of the report, in path order
	///
	/// Entries where a regular file faces a directory or special file on the
	/// other side are skipped and logged.
	pub fn plan(&self, reconciliation: &Reconciliation) -> Result<Vec<SyncAction>, ArchdiffError> {
		let mut actions = Vec::new();

		for entry in reconciliation.report() {
			let (direction, reason) =
				if reconciliation.missing_in_repo.contains(entry.path.as_str()) {
					(self.missing_side(&entry.path)?, SyncReason::MissingInRepo)
				} else {
					(self.newer_side(&entry.path)?, SyncReason::Diverged)
				};
			if let Some(direction) = direction {
				actions.push(self.action(&entry.path, direction, reason));
			}
		}

		Ok(actions)
	}

	fn probe_both(&self, path: &str) -> Result<(Probe, Probe), ArchdiffError> {
		let live = self.probe(&paths::join(self.root, path))?;
		let repo = self.probe(&paths::join(self.repo_root, path))?;
		Ok((live, repo))
	}

	/// Live → repository, unless either side cannot take part in a copy
	fn missing_side(&self, path: &str) -> Result<Option<Direction>, ArchdiffError> {
		Ok(match self.probe_both(path)? {
			(Probe::Time(_), Probe::Time(_) | Probe::Missing) => Some(Direction::LiveToRepo),
			(Probe::Denied, _) | (_, Probe::Denied) => None,
			(Probe::Missing, _) => None,
			_ => {
				skip_log!(self.quiet, "Not syncing {}: not a regular file on both sides", path);
				None
			}
		})
	}

	/// Direction from the newer copy to the older one
	///
	/// A copy that does not exist counts as older than any copy that does.
	/// Equal modification times go live → repository.
	fn newer_side(&self, path: &str) -> Result<Option<Direction>, ArchdiffError> {
		Ok(match self.probe_both(path)? {
			(Probe::Time(l), Probe::Time(r)) if r > l => Some(Direction::RepoToLive),
			(Probe::Time(_), Probe::Time(_) | Probe::Missing) => Some(Direction::LiveToRepo),
			(Probe::Missing, Probe::Time(_)) => Some(Direction::RepoToLive),
			(Probe::Time(_), Probe::Other) | (Probe::Other, Probe::Time(_)) => {
				skip_log!(
					self.quiet,
					"Not syncing {}: a file faces a directory or special file",
					path
				);
				None
			}
			_ => None,
		})
	}

	/// Classify one side the way the hasher does
	///
	/// Regular files and symlinks can be copied; directories, special files
	/// and paths blocked by a file in place of a parent cannot.
	fn probe(&self, path: &Path) -> Result<Probe, ArchdiffError> {
		match fs::symlink_metadata(path) {
			Ok(meta) if meta.file_type().is_file() || meta.file_type().is_symlink() => {
				Ok(Probe::Time(FileTime::from_last_modification_time(&meta)))
			}
			Ok(_) => Ok(Probe::Other),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Probe::Missing),
			// A file stands where a parent directory should be
			Err(e) if e.kind() == io::ErrorKind::NotADirectory => Ok(Probe::Other),
			Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
				skip_log!(self.quiet, "Not syncing {}: permission denied", path.display());
				Ok(Probe::Denied)
			}
			Err(e) => Err(ArchdiffError::io(path, e)),
		}
	}

	/// Perform the plan, or in dry-run mode write one `cp` line per action to `out`
	///
	/// A permission error skips that copy; any other I/O error aborts.
	pub fn execute<W: Write + ?Sized>(
		&self,
		actions: &[SyncAction],
		dry_run: bool,
		out: &mut W,
	) -> Result<SyncReport, ArchdiffError> {
		let mut report = SyncReport::default();

		for action in actions {
			if dry_run {
				writeln!(out, "{}", action).map_err(|e| ArchdiffError::io("<stdout>", e))?;
				report.planned += 1;
				continue;
			}

			match copy_entry(&action.source, &action.destination) {
				Ok(()) => {
					info!("{}", action);
					report.copied += 1;
				}
				Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
					skip_log!(self.quiet, "Failed to {}: permission denied", action);
					report.failed += 1;
				}
				Err(e) => return Err(ArchdiffError::io(&action.destination, e)),
			}
		}

		Ok(report)
	}
}

enum Probe {
	/// Regular file or symlink, with its modification time
	Time(FileTime),
	/// Directory, FIFO, socket, device, or a path under a non-directory
	Other,
	Missing,
	Denied,
}

/// Copy one file, recreating symlinks instead of following them
///
/// The destination takes the source's modification time.
pub fn copy_entry(source: &Path, destination: &Path) -> io::Result<()> {
	let meta = fs::symlink_metadata(source)?;
	let mtime = FileTime::from_last_modification_time(&meta);

	if let Some(parent) = destination.parent() {
		fs::create_dir_all(parent)?;
	}

	// Never write through an existing link at the destination
	match fs::symlink_metadata(destination) {
		Ok(existing) if existing.file_type().is_symlink() || meta.file_type().is_symlink() => {
			fs::remove_file(destination)?;
		}
		Ok(_) => {}
		Err(e) if e.kind() == io::ErrorKind::NotFound => {}
		Err(e) => return Err(e),
	}

	if meta.file_type().is_symlink() {
		symlink(fs::read_link(source)?, destination)?;
		filetime::set_symlink_file_times(destination, mtime, mtime)?;
	} else {
		fs::copy(source, destination)?;
		filetime::set_file_mtime(destination, mtime)?;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::FileEntry;
	use tempfile::TempDir;

	fn write(base: &Path, rel: &str, content: &str, mtime: i64) {
		let path = paths::join(base, rel);
		fs::create_dir_all(path.parent().unwrap()).unwrap();
		fs::write(&path, content).unwrap();
		filetime::set_file_mtime(&path, FileTime::from_unix_time(mtime, 0)).unwrap();
	}

	fn diverged(paths: &[&str]) -> Reconciliation {
		Reconciliation {
			diverged_from_repo: paths.iter().map(|p| FileEntry::new(*p)).collect(),
			..Default::default()
		}
	}

	#[test]
	fn test_newer_side_wins_either_way() {
		let root = TempDir::new().unwrap();
		let repo = TempDir::new().unwrap();
		write(root.path(), "/etc/live-newer", "live", 2_000);
		write(repo.path(), "/etc/live-newer", "repo", 1_000);
		write(root.path(), "/etc/repo-newer", "live", 1_000);
		write(repo.path(), "/etc/repo-newer", "repo", 2_000);

		let planner = SyncPlanner::new(root.path(), repo.path());
		let actions = planner.plan(&diverged(&["/etc/live-newer", "/etc/repo-newer"])).unwrap();

		assert_eq!(actions.len(), 2);
		assert_eq!(actions[0].direction, Direction::LiveToRepo);
		assert_eq!(actions[0].source, root.path().join("etc/live-newer"));
		assert_eq!(actions[1].direction, Direction::RepoToLive);
		assert_eq!(actions[1].destination, root.path().join("etc/repo-newer"));
	}

	#[test]
	fn test_missing_in_repo_goes_live_to_repo() {
		let root = TempDir::new().unwrap();
		let repo = TempDir::new().unwrap();
		write(root.path(), "/opt/tool", "bin", 1_000);

		let reconciliation = Reconciliation {
			unpackaged: [FileEntry::new("/opt/tool")].into_iter().collect(),
			missing_in_repo: [FileEntry::new("/opt/tool")].into_iter().collect(),
			..Default::default()
		};
		let planner = SyncPlanner::new(root.path(), repo.path());
		let actions = planner.plan(&reconciliation).unwrap();

		assert_eq!(actions.len(), 1);
		assert_eq!(actions[0].reason, SyncReason::MissingInRepo);
		assert_eq!(actions[0].direction, Direction::LiveToRepo);
	}

	#[test]
	fn test_dry_run_prints_and_copies_nothing() {
		let root = TempDir::new().unwrap();
		let repo = TempDir::new().unwrap();
		write(root.path(), "/etc/a.conf", "new", 2_000);
		write(repo.path(), "/etc/a.conf", "old", 1_000);

		let planner = SyncPlanner::new(root.path(), repo.path());
		let actions = planner.plan(&diverged(&["/etc/a.conf"])).unwrap();
		let mut out = Vec::new();
		let report = planner.execute(&actions, true, &mut out).unwrap();

		assert_eq!(report.planned, 1);
		assert_eq!(report.copied, 0);
		let printed = String::from_utf8(out).unwrap();
		assert_eq!(
			printed,
			format!(
				"cp {} {}\n",
				root.path().join("etc/a.conf").display(),
				repo.path().join("etc/a.conf").display()
			)
		);
		assert_eq!(fs::read_to_string(repo.path().join("etc/a.conf")).unwrap(), "old");
	}

	#[test]
	fn test_execute_copies_content_and_mtime() {
		let root = TempDir::new().unwrap();
		let repo = TempDir::new().unwrap();
		write(root.path(), "/etc/a.conf", "old", 1_000);
		write(repo.path(), "/etc/a.conf", "new", 2_000);

		let planner = SyncPlanner::new(root.path(), repo.path());
		let actions = planner.plan(&diverged(&["/etc/a.conf"])).unwrap();
		let report = planner.execute(&actions, false, &mut io::sink()).unwrap();

		assert_eq!(report.copied, 1);
		let live = root.path().join("etc/a.conf");
		assert_eq!(fs::read_to_string(&live).unwrap(), "new");
		let meta = fs::metadata(&live).unwrap();
		assert_eq!(FileTime::from_last_modification_time(&meta).unix_seconds(), 2_000);
	}

	#[test]
	fn test_directory_facing_file_is_skipped() {
		for (dir_mtime, file_mtime) in [(1_000, 2_000), (2_000, 1_000)] {
			let root = TempDir::new().unwrap();
			let repo = TempDir::new().unwrap();
			let dir = root.path().join("etc/x");
			fs::create_dir_all(&dir).unwrap();
			filetime::set_file_mtime(&dir, FileTime::from_unix_time(dir_mtime, 0)).unwrap();
			write(repo.path(), "/etc/x", "repo", file_mtime);

			let planner = SyncPlanner::new(root.path(), repo.path());
			let actions = planner.plan(&diverged(&["/etc/x"])).unwrap();
			assert!(actions.is_empty());
			assert_eq!(fs::read_to_string(repo.path().join("etc/x")).unwrap(), "repo");
		}
	}

	#[test]
	fn test_missing_in_repo_over_repo_directory_is_skipped() {
		let root = TempDir::new().unwrap();
		let repo = TempDir::new().unwrap();
		write(root.path(), "/etc/x", "live", 1_000);
		fs::create_dir_all(repo.path().join("etc/x/inner")).unwrap();

		let reconciliation = Reconciliation {
			missing_in_repo: [FileEntry::new("/etc/x")].into_iter().collect(),
			..Default::default()
		};
		let actions = SyncPlanner::new(root.path(), repo.path()).plan(&reconciliation).unwrap();
		assert!(actions.is_empty());
		assert!(repo.path().join("etc/x/inner").is_dir());
	}

	#[test]
	fn test_fifo_source_is_never_planned() {
		let root = TempDir::new().unwrap();
		let repo = TempDir::new().unwrap();
		fs::create_dir_all(root.path().join("run")).unwrap();
		let fifo = root.path().join("run/pipe");
		let made = std::process::Command::new("mkfifo").arg(&fifo).status();
		if !made.map(|s| s.success()).unwrap_or(false) {
			return;
		}

		let reconciliation = Reconciliation {
			missing_in_repo: [FileEntry::new("/run/pipe")].into_iter().collect(),
			..Default::default()
		};
		let planner = SyncPlanner::new(root.path(), repo.path()).quiet(true);
		assert!(planner.plan(&reconciliation).unwrap().is_empty());
	}

	#[test]
	fn test_unreadable_source_counts_as_failed() {
		use std::os::unix::fs::PermissionsExt;

		let root = TempDir::new().unwrap();
		let repo = TempDir::new().unwrap();
		write(root.path(), "/etc/secret", "live", 2_000);
		write(repo.path(), "/etc/secret", "repo", 1_000);
		let secret = root.path().join("etc/secret");
		fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();
		if fs::File::open(&secret).is_ok() {
			// Running as root: permissions are not enforced
			return;
		}

		let planner = SyncPlanner::new(root.path(), repo.path()).quiet(true);
		let actions = planner.plan(&diverged(&["/etc/secret"])).unwrap();
		let report = planner.execute(&actions, false, &mut io::sink()).unwrap();

		fs::set_permissions(&secret, fs::Permissions::from_mode(0o644)).unwrap();
		assert_eq!(actions.len(), 1);
		assert_eq!(report.failed, 1);
		assert_eq!(report.copied, 0);
		assert_eq!(fs::read_to_string(repo.path().join("etc/secret")).unwrap(), "repo");
	}

	#[test]
	fn test_copy_preserves_symlinks() {
		let temp_dir = TempDir::new().unwrap();
		let source = temp_dir.path().join("src/link");
		fs::create_dir_all(source.parent().unwrap()).unwrap();
		symlink("/etc/target-does-not-matter", &source).unwrap();

		let destination = temp_dir.path().join("dst/nested/link");
		copy_entry(&source, &destination).unwrap();

		let meta = fs::symlink_metadata(&destination).unwrap();
		assert!(meta.file_type().is_symlink());
		let target = fs::read_link(&destination).unwrap();
		assert_eq!(target, PathBuf::from("/etc/target-does-not-matter"));
	}

	#[test]
	fn test_copy_replaces_destination_link_instead_of_writing_through() {
		let temp_dir = TempDir::new().unwrap();
		let victim = temp_dir.path().join("victim");
		fs::write(&victim, "untouched").unwrap();
		let destination = temp_dir.path().join("dest");
		symlink(&victim, &destination).unwrap();
		let source = temp_dir.path().join("source");
		fs::write(&source, "payload").unwrap();

		copy_entry(&source, &destination).unwrap();

		assert_eq!(fs::read_to_string(&victim).unwrap(), "untouched");
		assert!(!fs::symlink_metadata(&destination).unwrap().file_type().is_symlink());
		assert_eq!(fs::read_to_string(&destination).unwrap(), "payload");
	}
}

// vim: ts=4
