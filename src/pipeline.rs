//! Wiring of the stages for one run
//!
//! A `Pipeline` owns everything that lives for a whole run: the validated
//! configuration, the compiled ignore set, the package database, the
//! repository lister and the hasher. The inventory it builds is the single
//! snapshot every later stage reads.

use std::collections::BTreeSet;
use std::path::Path;

use crate::config::{Config, RepoListerKind};
use crate::error::ArchdiffError;
use crate::exclusion::IgnoreMatcher;
use crate::hasher::ContentHasher;
use crate::inventory::{self, GitLister, Inventory, RepoLister, WalkLister, WalkOptions};
use crate::logging::*;
use crate::package_db::{ManifestDatabase, PackageDatabase, PacmanDatabase};
use crate::paths;
use crate::reconcile::{self, Reconciliation, ReconciliationEngine};
use crate::sync::SyncPlanner;

pub struct Pipeline {
	config: Config,
	matcher: IgnoreMatcher,
	hasher: ContentHasher,
	db: Box<dyn PackageDatabase>,
	lister: Box<dyn RepoLister>,
}

impl Pipeline {
	/// Build every run-wide resource from configuration
	///
	/// Ignore rules are compiled first so a malformed rule fails before any
	/// database is opened.
	pub fn from_config(config: Config) -> Result<Self, ArchdiffError> {
		config.validate()?;
		let matcher = build_matcher(&config)?;

		let db: Box<dyn PackageDatabase> = match &config.manifest {
			Some(path) => Box::new(ManifestDatabase::load(path)?),
			None => Box::new(PacmanDatabase::open(&config.dbpath)?),
		};

		let options = walk_options(&config);
		let lister: Box<dyn RepoLister> = match config.repo_lister {
			RepoListerKind::Walk => Box::new(WalkLister::new(options)),
			RepoListerKind::Git => Box::new(GitLister::new()),
		};

		Ok(Self::assemble(config, matcher, db, lister))
	}

	/// Build a pipeline around an explicit database and lister
	pub fn new(
		config: Config,
		db: Box<dyn PackageDatabase>,
		lister: Box<dyn RepoLister>,
	) -> Result<Self, ArchdiffError> {
		config.validate()?;
		let matcher = build_matcher(&config)?;
		Ok(Self::assemble(config, matcher, db, lister))
	}

	fn assemble(
		config: Config,
		matcher: IgnoreMatcher,
		db: Box<dyn PackageDatabase>,
		lister: Box<dyn RepoLister>,
	) -> Self {
		let hasher = ContentHasher::new(db.hash_algorithm());
		debug!(
			"Pipeline ready: {} ignore rules, {} hashing, {} repository lister",
			matcher.len(),
			hasher.algorithm(),
			lister.name()
		);
		Pipeline { config, matcher, hasher, db, lister }
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn matcher(&self) -> &IgnoreMatcher {
		&self.matcher
	}

	pub fn hasher(&self) -> &ContentHasher {
		&self.hasher
	}

	/// Query every source once
	pub fn inventory(&self) -> Result<Inventory, ArchdiffError> {
		let packages = self.db.packages()?;
		info!("Loaded {} installed packages", packages.len());

		let package_owned = inventory::build_package_owned_files(&packages);
		let backups = inventory::build_backup_records(&packages);

		// The repository is never part of the live tree it shadows
		let prune = paths::relative_to(&self.config.repo, &self.config.root);
		let live = inventory::build_live_files(
			&self.config.root,
			&self.matcher,
			prune,
			walk_options(&self.config),
		)?;
		let repo = inventory::build_repo_files(&self.config.repo, self.lister.as_ref())?;

		info!(
			"Inventory: {} package files, {} backups, {} live files, {} repository files",
			package_owned.len(),
			backups.len(),
			live.len(),
			repo.len()
		);

		Ok(Inventory { package_owned, backups, live, repo })
	}

	pub fn reconcile(&self, inventory: &Inventory) -> Result<Reconciliation, ArchdiffError> {
		ReconciliationEngine::new(self.root(), self.repo_root(), &self.matcher, &self.hasher)
			.quiet(self.config.quiet)
			.reconcile(inventory)
	}

	pub fn deleted(&self, inventory: &Inventory) -> Result<BTreeSet<String>, ArchdiffError> {
		reconcile::find_deleted(inventory, self.root(), &self.matcher, self.config.quiet)
	}

	pub fn planner(&self) -> SyncPlanner<'_> {
		SyncPlanner::new(self.root(), self.repo_root()).quiet(self.config.quiet)
	}

	fn root(&self) -> &Path {
		&self.config.root
	}

	fn repo_root(&self) -> &Path {
		&self.config.repo
	}
}

fn walk_options(config: &Config) -> WalkOptions {
	WalkOptions { strict: config.strict, quiet: config.quiet }
}

/// Rule files first, then configured patterns, then the quick-mode set
fn build_matcher(config: &Config) -> Result<IgnoreMatcher, ArchdiffError> {
	let mut builder = IgnoreMatcher::builder()
		.source(&config.ignore)?
		.patterns("config", &config.ignore_patterns);
	if config.quick {
		builder = builder.patterns("quick", &config.quick_ignore);
	}
	builder.build()
}


// vim: ts=4
