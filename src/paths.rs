//! Canonical path representation shared by every inventory
//!
//! A canonical path is the location of a file relative to some root, written
//! as an absolute `/`-separated string: `/etc/pacman.conf`. Live-tree paths,
//! repository paths and package database entries are all converted to this
//! form so that set membership works across sources.

use std::path::{Component, Path, PathBuf};

/// Check if a path is safe (no parent directory references)
pub fn is_path_safe(path: &str) -> bool {
	!Path::new(path).components().any(|c| matches!(c, Component::ParentDir))
}

/// Normalize a path string into canonical form
///
/// Accepts `etc/foo`, `/etc/foo`, `/etc//foo/` and `./etc/foo` alike.
/// Returns `None` for paths that would escape the root or name the root itself.
pub fn canonicalize(path: &str) -> Option<String> {
	if !is_path_safe(path) {
		return None;
	}

	let mut out = String::with_capacity(path.len() + 1);
	for part in path.split('/') {
		if part.is_empty() || part == "." {
			continue;
		}
		out.push('/');
		out.push_str(part);
	}

	if out.is_empty() {
		None
	} else {
		Some(out)
	}
}

/// Canonical path of `path` relative to `root`
///
/// Returns `None` when `path` is not under `root`, is `root` itself, or is
/// not valid UTF-8.
pub fn relative_to(path: &Path, root: &Path) -> Option<String> {
	let rel = path.strip_prefix(root).ok()?;
	canonicalize(rel.to_str()?)
}

/// Absolute filesystem location of a canonical path under `root`
pub fn join(root: &Path, canonical: &str) -> PathBuf {
	root.join(canonical.trim_start_matches('/'))
}


// vim: ts=4
