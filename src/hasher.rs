//! Streaming content digests

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fs::{self, File};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::str::FromStr;

use crate::error::HashError;

/// Digest used to compare file contents
///
/// Both sides of a comparison must use the same algorithm. Pacman records
/// backup hashes as MD5, so that is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
	#[default]
	Md5,
	Blake3,
}

impl FromStr for HashAlgorithm {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"md5" => Ok(Self::Md5),
			"blake3" | "b3" => Ok(Self::Blake3),
			_ => Err(format!("Unknown hash algorithm: {}. Valid options: md5, blake3", s)),
		}
	}
}

impl std::fmt::Display for HashAlgorithm {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Md5 => write!(f, "md5"),
			Self::Blake3 => write!(f, "blake3"),
		}
	}
}

/// Hashes files by streaming their bytes through a digest
///
/// Keeps a count of hash calls so callers can prove which paths were read.
#[derive(Debug)]
pub struct ContentHasher {
	algorithm: HashAlgorithm,
	calls: Cell<usize>,
}

impl ContentHasher {
	pub fn new(algorithm: HashAlgorithm) -> Self {
		ContentHasher { algorithm, calls: Cell::new(0) }
	}

	pub fn algorithm(&self) -> HashAlgorithm {
		self.algorithm
	}

	/// Number of `hash` calls made so far
	pub fn calls(&self) -> usize {
		self.calls.get()
	}

	/// Lowercase hex digest of the file at `path`
	///
	/// A symlink is hashed by its target path, never followed, so a link
	/// compares equal to a link with the same target. Anything else that is
	/// not a regular file (directory, FIFO, socket, device) has no content and
	/// reports `NotFound`, so a FIFO is never opened.
	pub fn hash(&self, path: &Path) -> Result<String, HashError> {
		self.calls.set(self.calls.get() + 1);

		let meta = fs::symlink_metadata(path).map_err(|e| HashError::from_io(path, e))?;
		if meta.file_type().is_symlink() {
			let target = fs::read_link(path).map_err(|e| HashError::from_io(path, e))?;
			return Ok(self.hash_bytes(target.as_os_str().as_bytes()));
		}
		if !meta.file_type().is_file() {
			return Err(HashError::NotFound { path: path.to_path_buf() });
		}

		let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
		match self.algorithm {
			HashAlgorithm::Md5 => {
				let mut hasher = Md5::new();
				io::copy(&mut file, &mut hasher).map_err(|e| HashError::from_io(path, e))?;
				Ok(hex::encode(hasher.finalize()))
			}
			HashAlgorithm::Blake3 => {
				let mut hasher = blake3::Hasher::new();
				io::copy(&mut file, &mut hasher).map_err(|e| HashError::from_io(path, e))?;
				Ok(hasher.finalize().to_hex().to_string())
			}
		}
	}

	/// Digest of an in-memory buffer, for building test fixtures and manifests
	pub fn hash_bytes(&self, data: &[u8]) -> String {
		match self.algorithm {
			HashAlgorithm::Md5 => hex::encode(Md5::digest(data)),
			HashAlgorithm::Blake3 => blake3::hash(data).to_hex().to_string(),
		}
	}
}


// vim: ts=4
