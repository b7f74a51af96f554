use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::BTreeSet;
use std::error::Error;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use archdiff::config::{Config, RepoListerKind};
use archdiff::logging::{self, *};
use archdiff::types::ListCategory;
use archdiff::{paths, ArchdiffError, Pipeline};

fn cli() -> Command {
	Command::new("archdiff")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Find files that differ from their packaged or archived state")
		.subcommand_required(true)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.global(true)
				.help("Config file (default: ~/.config/archdiff/config.toml)"),
		)
		.arg(
			Arg::new("root")
				.long("root")
				.value_name("DIR")
				.global(true)
				.help("Root of the live tree"),
		)
		.arg(
			Arg::new("dbpath")
				.long("dbpath")
				.value_name("DIR")
				.global(true)
				.help("Pacman database directory"),
		)
		.arg(
			Arg::new("repo")
				.long("repo")
				.value_name("DIR")
				.global(true)
				.help("Root of the shadow repository"),
		)
		.arg(
			Arg::new("ignore")
				.long("ignore")
				.value_name("PATH")
				.global(true)
				.help("Ignore rule file or directory"),
		)
		.arg(
			Arg::new("manifest")
				.long("manifest")
				.value_name("FILE")
				.global(true)
				.help("Read packages from a JSON manifest instead of pacman"),
		)
		.arg(
			Arg::new("quick")
				.long("quick")
				.action(ArgAction::SetTrue)
				.global(true)
				.help("Skip high-churn directories such as /usr/lib"),
		)
		.arg(
			Arg::new("strict")
				.long("strict")
				.action(ArgAction::SetTrue)
				.global(true)
				.help("Abort on unreadable directories instead of skipping them"),
		)
		.arg(
			Arg::new("quiet")
				.short('q')
				.long("quiet")
				.action(ArgAction::SetTrue)
				.global(true)
				.help("Do not warn about skipped files"),
		)
		.arg(
			Arg::new("git")
				.long("git")
				.action(ArgAction::SetTrue)
				.global(true)
				.help("List repository files with git ls-files"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::Count)
				.global(true)
				.help("More logging (-v info, -vv debug, -vvv trace)"),
		)
		.subcommand(
			Command::new("ls").about("List one category of files").arg(
				Arg::new("category")
					.required(true)
					.value_parser(clap::builder::PossibleValuesParser::new(
						ListCategory::NAMES.iter().copied(),
					))
					.help("Category to list"),
			),
		)
		.subcommand(
			Command::new("status")
				.about("Files missing from or diverged from the repository")
				.arg(
					Arg::new("long")
						.short('l')
						.long("long")
						.action(ArgAction::SetTrue)
						.help("Prefix each file with a change tag"),
				),
		)
		.subcommand(
			Command::new("sync").about("Copy changes between live tree and repository").arg(
				Arg::new("dry-run")
					.short('n')
					.long("dry-run")
					.action(ArgAction::SetTrue)
					.help("Print the copies instead of performing them"),
			),
		)
}

/// Defaults, then config file, then environment, then flags
fn load_config(matches: &ArgMatches) -> Result<Config, ArchdiffError> {
	let mut config = match matches.get_one::<String>("config") {
		Some(path) => Config::load(Path::new(path))?,
		None => Config::discover()?,
	};
	config.apply_env();

	let path_flag = |name: &str| matches.get_one::<String>(name).map(PathBuf::from);
	if let Some(root) = path_flag("root") {
		config.root = root;
	}
	if let Some(dbpath) = path_flag("dbpath") {
		config.dbpath = dbpath;
	}
	if let Some(repo) = path_flag("repo") {
		config.repo = repo;
	}
	if let Some(ignore) = path_flag("ignore") {
		config.ignore = ignore;
	}
	if let Some(manifest) = path_flag("manifest") {
		config.manifest = Some(manifest);
	}

	config.quick |= matches.get_flag("quick");
	config.strict |= matches.get_flag("strict");
	config.quiet |= matches.get_flag("quiet");
	if matches.get_flag("git") {
		config.repo_lister = RepoListerKind::Git;
	}

	match matches.get_count("verbose") {
		0 => {}
		1 => config.log_level = "info".to_string(),
		2 => config.log_level = "debug".to_string(),
		_ => config.log_level = "trace".to_string(),
	}

	Ok(config)
}

fn print_paths<'a, I>(out: &mut dyn Write, root: &Path, paths_iter: I) -> Result<(), ArchdiffError>
where
	I: IntoIterator<Item = &'a str>,
{
	for path in paths_iter {
		writeln!(out, "{}", paths::join(root, path).display())
			.map_err(|e| ArchdiffError::io("<stdout>", e))?;
	}
	Ok(())
}

fn cmd_ls(
	pipeline: &Pipeline,
	category: ListCategory,
	out: &mut dyn Write,
) -> Result<(), ArchdiffError> {
	let root = pipeline.config().root.clone();
	let inventory = pipeline.inventory()?;

	match category {
		ListCategory::Diff(diff) => {
			let reconciliation = pipeline.reconcile(&inventory)?;
			let entries = reconciliation.category(diff);
			print_paths(out, &root, entries.iter().map(|e| e.path.as_str()))
		}
		ListCategory::PackageOwned => {
			let sorted: BTreeSet<&str> =
				inventory.package_owned.iter().map(String::as_str).collect();
			print_paths(out, &root, sorted)
		}
		ListCategory::Backup => {
			print_paths(out, &root, inventory.backups.keys().map(String::as_str))
		}
		ListCategory::Live => print_paths(out, &root, inventory.live.iter().map(String::as_str)),
		ListCategory::Repo => {
			let repo = pipeline.config().repo.clone();
			print_paths(out, &repo, inventory.repo.iter().map(String::as_str))
		}
		ListCategory::Deleted => {
			let deleted = pipeline.deleted(&inventory)?;
			print_paths(out, &root, deleted.iter().map(String::as_str))
		}
	}
}

fn cmd_status(pipeline: &Pipeline, long: bool, out: &mut dyn Write) -> Result<(), ArchdiffError> {
	let root = pipeline.config().root.clone();
	let inventory = pipeline.inventory()?;
	let reconciliation = pipeline.reconcile(&inventory)?;

	if !long {
		let report = reconciliation.report();
		return print_paths(out, &root, report.into_iter().map(|e| e.path.as_str()));
	}
	for (tag, entry) in reconciliation.tagged_report() {
		writeln!(out, "{} {}", tag, paths::join(&root, &entry.path).display())
			.map_err(|e| ArchdiffError::io("<stdout>", e))?;
	}
	Ok(())
}

fn cmd_sync(pipeline: &Pipeline, out: &mut dyn Write) -> Result<(), ArchdiffError> {
	let inventory = pipeline.inventory()?;
	let reconciliation = pipeline.reconcile(&inventory)?;

	let planner = pipeline.planner();
	let actions = planner.plan(&reconciliation)?;
	let report = planner.execute(&actions, pipeline.config().dry_run, out)?;

	info!("Sync: {} planned, {} copied, {} failed", report.planned, report.copied, report.failed);
	if report.failed > 0 {
		warn!("{} files could not be copied", report.failed);
	}
	Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), ArchdiffError> {
	// Global flags are propagated into the subcommand's matches
	let (name, sub) =
		matches.subcommand().ok_or_else(|| ArchdiffError::config("subcommand required"))?;

	let mut config = load_config(sub)?;
	if name == "sync" {
		config.dry_run |= sub.get_flag("dry-run");
	}

	logging::init_tracing(&config.log_level);
	debug!("Configuration: {:?}", config);

	let pipeline = Pipeline::from_config(config)?;

	let stdout = io::stdout();
	let mut out = BufWriter::new(stdout.lock());

	match name {
		"ls" => {
			let category = sub
				.get_one::<String>("category")
				.ok_or_else(|| ArchdiffError::config("ls: category argument required"))?
				.parse::<ListCategory>()
				.map_err(ArchdiffError::config)?;
			cmd_ls(&pipeline, category, &mut out)?;
		}
		"status" => cmd_status(&pipeline, sub.get_flag("long"), &mut out)?,
		"sync" => cmd_sync(&pipeline, &mut out)?,
		other => return Err(ArchdiffError::config(format!("unknown subcommand {}", other))),
	}

	out.flush().map_err(|e| ArchdiffError::io("<stdout>", e))
}

fn main() -> ExitCode {
	let matches = cli().get_matches();

	match run(&matches) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("error: {}", err);
			let mut source = err.source();
			while let Some(cause) = source {
				eprintln!("  caused by: {}", cause);
				source = cause.source();
			}
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
