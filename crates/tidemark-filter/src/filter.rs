//! Glob filtering of the changed-path list.
//!
//! Patterns use fnmatch semantics: `*` also matches `/`, so `*.js` matches
//! `src/a.js`. Results are grouped by pattern: every path matched by the
//! first pattern, then those matched by the second, and so on, with
//! duplicates removed in favour of their first group.

use std::collections::HashSet;

use tidemark_core::{split_lines, Result, TidemarkError};
use tracing::debug;

/// Ordered set of compiled glob patterns.
///
/// An empty filter is disabled and passes paths through untouched.
///
/// # Examples
///
/// ```
/// use tidemark_filter::PathFilter;
///
/// let filter = PathFilter::from_input("src/*.js\n\n").unwrap();
/// let paths = vec!["src/a.js".to_string(), "docs/readme.md".into(), "src/b.js".into()];
/// assert_eq!(filter.apply(paths), vec!["src/a.js", "src/b.js"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    patterns: Vec<glob::Pattern>,
}

impl PathFilter {
    /// Compile `patterns`, ignoring blank entries.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Pattern`] for the first pattern that is not a
    /// valid glob.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut compiled = Vec::new();
        for raw in patterns {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            let pattern = glob::Pattern::new(raw).map_err(|e| TidemarkError::Pattern {
                pattern: raw.to_string(),
                reason: e.msg.to_string(),
            })?;
            compiled.push(pattern);
        }
        Ok(Self { patterns: compiled })
    }

    /// Compile a newline-delimited pattern list.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Pattern`] if any line is not a valid glob.
    pub fn from_input(input: &str) -> Result<Self> {
        Self::new(split_lines(input).as_slice())
    }

    /// Whether no patterns are configured.
    pub fn is_disabled(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Patterns in evaluation order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(glob::Pattern::as_str)
    }

    /// Keep the paths matching at least one pattern.
    ///
    /// A disabled filter returns `paths` unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidemark_filter::PathFilter;
    ///
    /// let filter = PathFilter::new(&["*.js", "src/*"]).unwrap();
    /// let paths = vec!["src/a.js".to_string(), "lib/b.js".into()];
    /// assert_eq!(filter.apply(paths), vec!["src/a.js", "lib/b.js"]);
    /// ```
    pub fn apply(&self, paths: Vec<String>) -> Vec<String> {
        if self.is_disabled() {
            return paths;
        }

        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for pattern in &self.patterns {
            let mut hits = 0usize;
            for path in paths.iter().filter(|p| pattern.matches(p)) {
                hits += 1;
                if !path.trim().is_empty() && seen.insert(path.as_str()) {
                    kept.push(path.clone());
                }
            }
            debug!(pattern = pattern.as_str(), hits, "pattern applied");
        }
        kept
    }
}
