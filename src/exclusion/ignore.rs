//! Ignore rule files
//!
//! One rule per line; blank lines and lines starting with `#` are skipped.
//! A rule source is either a single file or a directory of such files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ArchdiffError;
use crate::logging::*;

/// A rule line together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleLine {
	pub file: PathBuf,
	pub line: usize,
	pub text: String,
}

/// Parser for ignore rule files
pub struct IgnoreFileParser;

impl IgnoreFileParser {
	/// Parse ignore file contents into `(line number, rule)` pairs
	pub fn parse_contents(contents: &str) -> Vec<(usize, String)> {
		contents
			.lines()
			.enumerate()
			.filter_map(|(idx, line)| {
				let line = line.trim();

				// Skip empty lines and comments
				if line.is_empty() || line.starts_with('#') {
					return None;
				}

				Some((idx + 1, line.to_string()))
			})
			.collect()
	}

	/// Parse a single ignore file
	pub fn parse_file(path: &Path) -> Result<Vec<RuleLine>, ArchdiffError> {
		let contents = fs::read_to_string(path).map_err(|e| ArchdiffError::io(path, e))?;

		Ok(Self::parse_contents(&contents)
			.into_iter()
			.map(|(line, text)| RuleLine { file: path.to_path_buf(), line, text })
			.collect())
	}

	/// Read every rule from a file or a directory tree of files
	///
	/// Directory entries are visited in name order so rule order is stable.
	/// A missing source yields no rules.
	pub fn parse_source(source: &Path) -> Result<Vec<RuleLine>, ArchdiffError> {
		let meta = match fs::metadata(source) {
			Ok(m) => m,
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				info!("Ignore source {} does not exist, using no file rules", source.display());
				return Ok(Vec::new());
			}
			Err(e) => return Err(ArchdiffError::io(source, e)),
		};

		if !meta.is_dir() {
			return Self::parse_file(source);
		}

		let mut entries = fs::read_dir(source)
			.map_err(|e| ArchdiffError::io(source, e))?
			.map(|entry| entry.map(|e| e.path()))
			.collect::<Result<Vec<_>, _>>()
			.map_err(|e| ArchdiffError::io(source, e))?;
		entries.sort();

		let mut rules = Vec::new();
		for path in entries {
			rules.extend(Self::parse_source(&path)?);
		}
		debug!("Read {} ignore rules from {}", rules.len(), source.display());
		Ok(rules)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_parse_ignore_file() {
		let contents = r#"
# Account databases
/etc/passwd
/etc/shadow

# Host keys
/etc/ssh/ssh_host_*key*
"#;

		let rules = IgnoreFileParser::parse_contents(contents);

		assert_eq!(
			rules,
			vec![
				(3, "/etc/passwd".to_string()),
				(4, "/etc/shadow".to_string()),
				(7, "/etc/ssh/ssh_host_*key*".to_string()),
			]
		);
	}

	#[test]
	fn test_directory_source_is_sorted_and_recursive() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(temp_dir.path().join("20-local"), "/srv\n").unwrap();
		fs::write(temp_dir.path().join("10-base"), "/etc/passwd\n").unwrap();
		fs::create_dir(temp_dir.path().join("30-extra")).unwrap();
		fs::write(temp_dir.path().join("30-extra/more"), "/var/tmp\n").unwrap();

		let rules = IgnoreFileParser::parse_source(temp_dir.path()).unwrap();
		let texts: Vec<&str> = rules.iter().map(|r| r.text.as_str()).collect();
		assert_eq!(texts, vec!["/etc/passwd", "/srv", "/var/tmp"]);
		assert!(rules[0].file.ends_with("10-base"));
	}

	#[test]
	fn test_missing_source_yields_no_rules() {
		let temp_dir = TempDir::new().unwrap();
		let rules = IgnoreFileParser::parse_source(&temp_dir.path().join("absent")).unwrap();
		assert!(rules.is_empty());
	}
}

// vim: ts=4
