//! Individual ignore rules

use globset::{Glob, GlobMatcher};

/// Characters that turn an ignore line into a glob rule
const WILDCARDS: &[char] = &['*', '?', '['];

/// A single path-exclusion rule
///
/// Rules are matched against canonical paths (`/etc/foo`).
#[derive(Debug, Clone)]
pub enum IgnoreRule {
	/// Matches the literal path and anything nested under it
	Prefix(String),

	/// Matches via a wildcard pattern; `*` also crosses `/`
	Glob(GlobMatcher),
}

impl IgnoreRule {
	/// Compile one ignore line
	///
	/// A line containing any of `*?[` becomes a glob rule, anything else a
	/// prefix rule.
	pub fn compile(line: &str) -> Result<Self, globset::Error> {
		if line.contains(WILDCARDS) {
			Ok(IgnoreRule::Glob(Glob::new(line)?.compile_matcher()))
		} else {
			let prefix = line.trim_end_matches('/');
			Ok(IgnoreRule::Prefix(prefix.to_string()))
		}
	}

	pub fn matches(&self, path: &str) -> bool {
		match self {
			IgnoreRule::Prefix(prefix) => {
				// An empty prefix comes from the rule "/" and covers everything
				path == prefix
					|| (path.starts_with(prefix.as_str())
						&& path.as_bytes().get(prefix.len()) == Some(&b'/'))
			}
			IgnoreRule::Glob(matcher) => matcher.is_match(path),
		}
	}

	/// The rule as written, for diagnostics
	pub fn pattern(&self) -> &str {
		match self {
			IgnoreRule::Prefix(prefix) => prefix,
			IgnoreRule::Glob(matcher) => matcher.glob().glob(),
		}
	}
}


// vim: ts=4
