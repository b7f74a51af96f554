//! Repository file listers
//!
//! A lister returns the canonical paths the shadow repository tracks. A
//! directory walk and a git index listing are interchangeable.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use super::walk::{TreeWalker, WalkOptions};
use crate::error::ArchdiffError;
use crate::logging::*;
use crate::paths;

pub trait RepoLister {
	/// Canonical paths of every file tracked under `repo_root`
	fn list(&self, repo_root: &Path) -> Result<BTreeSet<String>, ArchdiffError>;

	/// Short name for logs
	fn name(&self) -> &'static str;
}

/// Lists the repository by walking its directory tree
///
/// No ignore rules apply; only the top-level `.git` directory is skipped.
#[derive(Debug, Clone, Default)]
pub struct WalkLister {
	pub options: WalkOptions,
}

impl WalkLister {
	pub fn new(options: WalkOptions) -> Self {
		WalkLister { options }
	}
}

impl RepoLister for WalkLister {
	fn list(&self, repo_root: &Path) -> Result<BTreeSet<String>, ArchdiffError> {
		match fs::metadata(repo_root) {
			Ok(_) => {}
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				info!("Repository {} does not exist, treating it as empty", repo_root.display());
				return Ok(BTreeSet::new());
			}
			Err(e) => return Err(ArchdiffError::io(repo_root, e)),
		}

		TreeWalker::new(repo_root, self.options).prune("/.git").walk()
	}

	fn name(&self) -> &'static str {
		"walk"
	}
}

/// Lists the repository through `git ls-files`
#[derive(Debug, Clone)]
pub struct GitLister {
	program: String,
}

impl GitLister {
	pub fn new() -> Self {
		Self::with_program("git")
	}

	pub fn with_program(program: impl Into<String>) -> Self {
		GitLister { program: program.into() }
	}

	fn command_line(&self, repo_root: &Path) -> String {
		format!("{} -C {} ls-files -z", self.program, repo_root.display())
	}
}

impl Default for GitLister {
	fn default() -> Self {
		Self::new()
	}
}

/// Split NUL-separated `ls-files -z` output into canonical paths
fn parse_ls_files(output: &[u8]) -> BTreeSet<String> {
	let mut files = BTreeSet::new();
	for raw in output.split(|b| *b == 0).filter(|s| !s.is_empty()) {
		match std::str::from_utf8(raw).ok().and_then(paths::canonicalize) {
			Some(path) => {
				files.insert(path);
			}
			None => warn!("Skipping unusable repository path {:?}", String::from_utf8_lossy(raw)),
		}
	}
	files
}

impl RepoLister for GitLister {
	fn list(&self, repo_root: &Path) -> Result<BTreeSet<String>, ArchdiffError> {
		let command = self.command_line(repo_root);
		debug!("Running {}", command);

		let output = Command::new(&self.program)
			.arg("-C")
			.arg(repo_root)
			.args(["ls-files", "-z"])
			.output()
			.map_err(|e| ArchdiffError::RepoListingFailed {
				command: command.clone(),
				message: e.to_string(),
			})?;

		if !output.status.success() {
			return Err(ArchdiffError::RepoListingFailed {
				command,
				message: format!(
					"{}: {}",
					output.status,
					String::from_utf8_lossy(&output.stderr).trim()
				),
			});
		}

		Ok(parse_ls_files(&output.stdout))
	}

	fn name(&self) -> &'static str {
		"git"
	}
}


// vim: ts=4
