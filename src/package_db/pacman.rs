//! Pacman local database reader
//!
//! Layout: `<dbpath>/local/<name>-<version>/{desc,files}`. `desc` carries
//! `%NAME%` and `%VERSION%`, `files` carries `%FILES%` and `%BACKUP%`
//! (`path<TAB>md5` per line). Recorded paths are relative to the install root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{parse_sections, BackupFile, Package, PackageDatabase};
use crate::error::ArchdiffError;
use crate::logging::*;

pub struct PacmanDatabase {
	dbpath: PathBuf,
	local: PathBuf,
}

impl PacmanDatabase {
	/// Open the local database under `dbpath`
	pub fn open(dbpath: &Path) -> Result<Self, ArchdiffError> {
		let local = dbpath.join("local");
		match fs::metadata(&local) {
			Ok(meta) if meta.is_dir() => {}
			Ok(_) => {
				return Err(ArchdiffError::PackageDatabaseUnavailable {
					path: dbpath.to_path_buf(),
					reason: format!("{} is not a directory", local.display()),
				})
			}
			Err(e) => {
				return Err(ArchdiffError::PackageDatabaseUnavailable {
					path: dbpath.to_path_buf(),
					reason: format!("cannot access {}: {}", local.display(), e),
				})
			}
		}

		Ok(PacmanDatabase { dbpath: dbpath.to_path_buf(), local })
	}

	fn unavailable(&self, reason: String) -> ArchdiffError {
		ArchdiffError::PackageDatabaseUnavailable { path: self.dbpath.clone(), reason }
	}

	fn read_package(&self, dir: &Path) -> Result<Package, ArchdiffError> {
		let desc = fs::read_to_string(dir.join("desc"))
			.map_err(|e| self.unavailable(format!("cannot read {}/desc: {}", dir.display(), e)))?;

		let mut package = Package::default();
		for (name, values) in parse_sections(&desc) {
			match name.as_str() {
				"NAME" => package.name = values.into_iter().next().unwrap_or_default(),
				"VERSION" => package.version = values.into_iter().next().unwrap_or_default(),
				_ => {}
			}
		}
		if package.name.is_empty() {
			package.name =
				dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
		}

		let files = match fs::read_to_string(dir.join("files")) {
			Ok(contents) => contents,
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				warn!("Package {} has no files list", package.name);
				return Ok(package);
			}
			Err(e) => {
				return Err(self.unavailable(format!("cannot read {}/files: {}", dir.display(), e)))
			}
		};

		for (name, values) in parse_sections(&files) {
			match name.as_str() {
				"FILES" => {
					// Directory entries end with '/'
					package.files.extend(values.into_iter().filter(|f| !f.ends_with('/')));
				}
				"BACKUP" => {
					for line in values {
						match line.split_once('\t') {
							Some((path, hash)) => package.backup.push(BackupFile {
								path: path.to_string(),
								hash: hash.to_string(),
							}),
							None => warn!("Malformed backup entry in {}: {:?}", package.name, line),
						}
					}
				}
				_ => {}
			}
		}

		Ok(package)
	}
}

impl PackageDatabase for PacmanDatabase {
	fn packages(&self) -> Result<Vec<Package>, ArchdiffError> {
		let mut dirs = Vec::new();
		let entries = fs::read_dir(&self.local)
			.map_err(|e| self.unavailable(format!("cannot list {}: {}", self.local.display(), e)))?;
		for entry in entries {
			let entry = entry.map_err(|e| self.unavailable(e.to_string()))?;
			let file_type = entry.file_type().map_err(|e| self.unavailable(e.to_string()))?;
			// ALPM_DB_VERSION and friends live next to the package directories
			if file_type.is_dir() {
				dirs.push(entry.path());
			}
		}
		dirs.sort();

		let packages =
			dirs.iter().map(|dir| self.read_package(dir)).collect::<Result<Vec<_>, _>>()?;
		debug!("Read {} packages from {}", packages.len(), self.local.display());
		Ok(packages)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn write_package(dbpath: &Path, dir: &str, desc: &str, files: Option<&str>) {
		let pkg_dir = dbpath.join("local").join(dir);
		fs::create_dir_all(&pkg_dir).unwrap();
		fs::write(pkg_dir.join("desc"), desc).unwrap();
		if let Some(files) = files {
			fs::write(pkg_dir.join("files"), files).unwrap();
		}
	}

	#[test]
	fn test_reads_files_and_backup() {
		let temp_dir = TempDir::new().unwrap();
		fs::create_dir_all(temp_dir.path().join("local")).unwrap();
		fs::write(temp_dir.path().join("local/ALPM_DB_VERSION"), "9\n").unwrap();
		write_package(
			temp_dir.path(),
			"pacman-6.1.0-3",
			"%NAME%\npacman\n\n%VERSION%\n6.1.0-3\n\n%DESC%\nA library-based package manager\n",
			Some(
				"%FILES%\netc/\netc/pacman.conf\nusr/bin/pacman\n\n%BACKUP%\netc/pacman.conf\t0123abcd\n",
			),
		);

		let db = PacmanDatabase::open(temp_dir.path()).unwrap();
		let packages = db.packages().unwrap();

		assert_eq!(packages.len(), 1);
		let pkg = &packages[0];
		assert_eq!(pkg.name, "pacman");
		assert_eq!(pkg.version, "6.1.0-3");
		assert_eq!(pkg.files, vec!["etc/pacman.conf", "usr/bin/pacman"]);
		assert_eq!(
			pkg.backup,
			vec![BackupFile { path: "etc/pacman.conf".to_string(), hash: "0123abcd".to_string() }]
		);
		assert_eq!(db.hash_algorithm(), crate::hasher::HashAlgorithm::Md5);
	}

	#[test]
	fn test_missing_files_list_is_empty_package() {
		let temp_dir = TempDir::new().unwrap();
		write_package(temp_dir.path(), "meta-1-1", "%NAME%\nmeta\n", None);

		let packages = PacmanDatabase::open(temp_dir.path()).unwrap().packages().unwrap();
		assert_eq!(packages[0].name, "meta");
		assert!(packages[0].files.is_empty());
	}

	#[test]
	fn test_missing_local_dir_is_unavailable() {
		let temp_dir = TempDir::new().unwrap();
		let result = PacmanDatabase::open(temp_dir.path());
		assert!(matches!(result, Err(ArchdiffError::PackageDatabaseUnavailable { .. })));
	}

	#[test]
	fn test_missing_desc_is_unavailable() {
		let temp_dir = TempDir::new().unwrap();
		fs::create_dir_all(temp_dir.path().join("local/broken-1-1")).unwrap();

		let db = PacmanDatabase::open(temp_dir.path()).unwrap();
		assert!(matches!(db.packages(), Err(ArchdiffError::PackageDatabaseUnavailable { .. })));
	}
}

// vim: ts=4
