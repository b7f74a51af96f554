//! Configuration for archdiff runs
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (~/.config/archdiff/config.toml or config.json)
//! 3. Environment variables (ARCHDIFF_* prefix)
//! 4. CLI flags (highest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs};

use crate::error::ArchdiffError;

/// Directories that churn with every package upgrade and are skipped in quick mode
pub const QUICK_IGNORE: &[&str] = &[
	"/usr/bin",
	"/usr/lib",
	"/usr/lib32",
	"/usr/include",
	"/usr/share",
	"/usr/src",
	"/opt",
	"/var/cache",
	"/var/lib/pacman",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	// ========================================================================
	// LOCATIONS
	// ========================================================================
	/// Root of the live tree
	pub root: PathBuf,

	/// Pacman database directory
	pub dbpath: PathBuf,

	/// JSON package manifest; replaces the pacman database when set
	pub manifest: Option<PathBuf>,

	/// Root of the shadow repository
	pub repo: PathBuf,

	/// Ignore rule file or directory of rule files
	pub ignore: PathBuf,

	// ========================================================================
	// FILTERING
	// ========================================================================
	/// Extra ignore rules, appended after the rule files
	pub ignore_patterns: Vec<String>,

	/// Skip high-churn directories for a faster run
	pub quick: bool,

	/// Directories added to the ignore set in quick mode
	pub quick_ignore: Vec<String>,

	// ========================================================================
	// BEHAVIOR
	// ========================================================================
	/// How the repository's file list is obtained
	pub repo_lister: RepoListerKind,

	/// Print planned copies instead of performing them
	pub dry_run: bool,

	/// Treat permission errors during walks as fatal
	pub strict: bool,

	/// Do not warn about skipped unreadable files
	pub quiet: bool,

	// ========================================================================
	// OUTPUT & LOGGING
	// ========================================================================
	/// Log level (trace, debug, info, warn, error)
	pub log_level: String,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			root: PathBuf::from("/"),
			dbpath: PathBuf::from("/var/lib/pacman"),
			manifest: None,
			repo: PathBuf::from("/usr/share/archdiff"),
			ignore: PathBuf::from("/etc/archdiff/ignore"),

			ignore_patterns: vec![],
			quick: false,
			quick_ignore: QUICK_IGNORE.iter().map(|s| s.to_string()).collect(),

			repo_lister: RepoListerKind::Walk,
			dry_run: false,
			strict: false,
			quiet: false,

			log_level: "warn".to_string(),
		}
	}
}

impl Config {
	/// Load a config file; `.json` files are parsed as JSON, anything else as TOML
	pub fn load(path: &Path) -> Result<Self, ArchdiffError> {
		let contents = fs::read_to_string(path).map_err(|e| ArchdiffError::io(path, e))?;

		let is_json = path.extension().map(|ext| ext == "json").unwrap_or(false);
		if is_json {
			serde_json::from_str(&contents)
				.map_err(|e| ArchdiffError::config(format!("{}: {}", path.display(), e)))
		} else {
			toml::from_str(&contents)
				.map_err(|e| ArchdiffError::config(format!("{}: {}", path.display(), e)))
		}
	}

	/// Default config file location, whether or not it exists
	pub fn default_path() -> Option<PathBuf> {
		let base = env::var_os("XDG_CONFIG_HOME")
			.map(PathBuf::from)
			.or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
		Some(base.join("archdiff").join("config.toml"))
	}

	/// Load the default config file if there is one, built-in defaults otherwise
	pub fn discover() -> Result<Self, ArchdiffError> {
		match Self::default_path() {
			Some(path) if path.is_file() => Self::load(&path),
			_ => Ok(Self::default()),
		}
	}

	/// Apply ARCHDIFF_* environment overrides
	pub fn apply_env(&mut self) {
		self.apply_vars(|name| env::var_os(name));
	}

	fn apply_vars<F>(&mut self, lookup: F)
	where
		F: Fn(&str) -> Option<std::ffi::OsString>,
	{
		if let Some(v) = lookup("ARCHDIFF_ROOT") {
			self.root = PathBuf::from(v);
		}
		if let Some(v) = lookup("ARCHDIFF_DBPATH") {
			self.dbpath = PathBuf::from(v);
		}
		if let Some(v) = lookup("ARCHDIFF_REPO") {
			self.repo = PathBuf::from(v);
		}
		if let Some(v) = lookup("ARCHDIFF_IGNORE") {
			self.ignore = PathBuf::from(v);
		}
	}

	pub fn validate(&self) -> Result<(), ArchdiffError> {
		if !self.root.is_absolute() {
			return Err(ArchdiffError::config(format!(
				"root must be an absolute path, got {}",
				self.root.display()
			)));
		}
		if !self.repo.is_absolute() {
			return Err(ArchdiffError::config(format!(
				"repo must be an absolute path, got {}",
				self.repo.display()
			)));
		}
		Ok(())
	}
}

/// Source of the repository's tracked file list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RepoListerKind {
	/// Walk the repository directory
	#[default]
	Walk,

	/// Ask git for the files in its index
	Git,
}

impl FromStr for RepoListerKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"walk" | "fs" => Ok(Self::Walk),
			"git" => Ok(Self::Git),
			_ => Err(format!("Unknown repo lister: {}. Valid options: walk, git", s)),
		}
	}
}

impl std::fmt::Display for RepoListerKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Walk => write!(f, "walk"),
			Self::Git => write!(f, "git"),
		}
	}
}


// vim: ts=4
