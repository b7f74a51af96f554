//! JSON package manifest, for systems without a pacman database
//!
//! ```json
//! {
//!   "hashAlgorithm": "blake3",
//!   "packages": [
//!     { "name": "tool", "version": "1.0", "files": ["/opt/tool/bin"],
//!       "backup": [{ "path": "/etc/tool.conf", "hash": "…" }] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{Package, PackageDatabase};
use crate::error::ArchdiffError;
use crate::hasher::HashAlgorithm;
use crate::logging::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Manifest {
	hash_algorithm: HashAlgorithm,
	packages: Vec<Package>,
}

pub struct ManifestDatabase {
	path: PathBuf,
	manifest: Manifest,
}

impl ManifestDatabase {
	pub fn load(path: &Path) -> Result<Self, ArchdiffError> {
		let unavailable = |reason: String| ArchdiffError::PackageDatabaseUnavailable {
			path: path.to_path_buf(),
			reason,
		};

		let contents = fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
		let manifest: Manifest =
			serde_json::from_str(&contents).map_err(|e| unavailable(e.to_string()))?;

		Ok(ManifestDatabase { path: path.to_path_buf(), manifest })
	}
}

impl PackageDatabase for ManifestDatabase {
	fn packages(&self) -> Result<Vec<Package>, ArchdiffError> {
		debug!("Read {} packages from {}", self.manifest.packages.len(), self.path.display());
		Ok(self.manifest.packages.clone())
	}

	fn hash_algorithm(&self) -> HashAlgorithm {
		self.manifest.hash_algorithm
	}
}


// vim: ts=4
