//! Error types for archdiff operations

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Fatal errors that abort a run
#[derive(Debug)]
pub enum ArchdiffError {
	/// An ignore rule failed to compile
	MalformedIgnoreRule { file: PathBuf, line: usize, pattern: String, message: String },

	/// The package database could not be opened or read
	PackageDatabaseUnavailable { path: PathBuf, reason: String },

	/// The repository file lister failed
	RepoListingFailed { command: String, message: String },

	/// Permission denied while walking in strict mode
	PermissionDenied { path: PathBuf },

	/// I/O error on a specific path
	Io { path: PathBuf, source: io::Error },

	/// Invalid configuration
	InvalidConfig { message: String },
}

impl ArchdiffError {
	pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
		ArchdiffError::Io { path: path.into(), source }
	}

	pub fn config(message: impl Into<String>) -> Self {
		ArchdiffError::InvalidConfig { message: message.into() }
	}
}

impl fmt::Display for ArchdiffError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ArchdiffError::MalformedIgnoreRule { file, line, pattern, message } => {
				write!(
					f,
					"Malformed ignore rule '{}' at {}:{}: {}",
					pattern,
					file.display(),
					line,
					message
				)
			}
			ArchdiffError::PackageDatabaseUnavailable { path, reason } => {
				write!(f, "Package database {} unavailable: {}", path.display(), reason)
			}
			ArchdiffError::RepoListingFailed { command, message } => {
				write!(f, "Repository listing '{}' failed: {}", command, message)
			}
			ArchdiffError::PermissionDenied { path } => {
				write!(f, "Permission denied: {}", path.display())
			}
			ArchdiffError::Io { path, .. } => write!(f, "I/O error on {}", path.display()),
			ArchdiffError::InvalidConfig { message } => {
				write!(f, "Invalid configuration: {}", message)
			}
		}
	}
}

impl Error for ArchdiffError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			ArchdiffError::Io { source, .. } => Some(source),
			_ => None,
		}
	}
}

impl From<HashError> for ArchdiffError {
	fn from(e: HashError) -> Self {
		match e {
			HashError::NotFound { path } => ArchdiffError::Io {
				source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
				path,
			},
			HashError::PermissionDenied { path } => ArchdiffError::PermissionDenied { path },
			HashError::Io { path, source } => ArchdiffError::Io { path, source },
		}
	}
}

/// Errors from hashing a single file
///
/// Only `Io` is fatal; callers decide what the other two mean.
#[derive(Debug)]
pub enum HashError {
	/// The path does not exist
	NotFound { path: PathBuf },

	/// Read access was refused
	PermissionDenied { path: PathBuf },

	/// Any other read failure
	Io { path: PathBuf, source: io::Error },
}

impl HashError {
	/// Classify an I/O error raised while hashing `path`
	pub fn from_io(path: impl Into<PathBuf>, e: io::Error) -> Self {
		let path = path.into();
		match e.kind() {
			// A file standing where a parent directory should be
			io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => HashError::NotFound { path },
			io::ErrorKind::PermissionDenied => HashError::PermissionDenied { path },
			_ => HashError::Io { path, source: e },
		}
	}
}

impl fmt::Display for HashError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			HashError::NotFound { path } => write!(f, "No such file: {}", path.display()),
			HashError::PermissionDenied { path } => {
				write!(f, "Permission denied: {}", path.display())
			}
			HashError::Io { path, .. } => write!(f, "Failed to hash {}", path.display()),
		}
	}
}

impl Error for HashError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			HashError::Io { source, .. } => Some(source),
			_ => None,
		}
	}
}


// vim: ts=4
