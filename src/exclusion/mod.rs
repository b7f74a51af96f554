//! Ignore rules and the compiled matcher applied to every inventory
//!
//! Rules are compiled once at startup. A bad glob aborts the run before any
//! inventory is built.

mod ignore;
mod patterns;

pub use ignore::{IgnoreFileParser, RuleLine};
pub use patterns::IgnoreRule;

use std::path::{Path, PathBuf};

use crate::error::ArchdiffError;

/// Compiled, ordered set of ignore rules
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
	rules: Vec<IgnoreRule>,
}

impl IgnoreMatcher {
	/// A matcher that ignores nothing
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn builder() -> IgnoreMatcherBuilder {
		IgnoreMatcherBuilder::default()
	}

	/// Check a canonical path against the rules
	pub fn matches(&self, path: &str) -> bool {
		self.matching_rule(path).is_some()
	}

	/// First rule that matches a canonical path
	pub fn matching_rule(&self, path: &str) -> Option<&IgnoreRule> {
		self.rules.iter().find(|rule| rule.matches(path))
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}
}

/// Collects rule lines from their sources and compiles them
#[derive(Debug, Default)]
pub struct IgnoreMatcherBuilder {
	lines: Vec<RuleLine>,
}

impl IgnoreMatcherBuilder {
	/// Add every rule from an ignore file or directory
	pub fn source(mut self, source: &Path) -> Result<Self, ArchdiffError> {
		self.lines.extend(IgnoreFileParser::parse_source(source)?);
		Ok(self)
	}

	/// Add inline rules, e.g. from the config file or the quick preset
	pub fn patterns<S: AsRef<str>>(mut self, origin: &str, patterns: &[S]) -> Self {
		for (idx, pattern) in patterns.iter().enumerate() {
			let text = pattern.as_ref().trim();
			if text.is_empty() || text.starts_with('#') {
				continue;
			}
			self.lines.push(RuleLine {
				file: PathBuf::from(origin),
				line: idx + 1,
				text: text.to_string(),
			});
		}
		self
	}

	pub fn build(self) -> Result<IgnoreMatcher, ArchdiffError> {
		let rules = self
			.lines
			.into_iter()
			.map(|line| {
				IgnoreRule::compile(&line.text).map_err(|e| ArchdiffError::MalformedIgnoreRule {
					file: line.file,
					line: line.line,
					pattern: line.text.clone(),
					message: e.kind().to_string(),
				})
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(IgnoreMatcher { rules })
	}
}


// vim: ts=4
