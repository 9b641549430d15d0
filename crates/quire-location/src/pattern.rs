//! Glob pattern sets with negation.

use glob::{MatchOptions, Pattern};

use crate::{Location, LocationError};

/// Prefix that turns a pattern into an exclusion.
pub const NEGATION_MARKER: char = '|';

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled set of include and exclude glob patterns.
///
/// Patterns are matched against the location's `/`-joined path
/// (`dir1/dir2/page.md`). `\` and `::` in patterns are read as separators and
/// `*` also matches across directories. A pattern starting with
/// [`NEGATION_MARKER`] excludes.
///
/// A location matches when at least one include pattern matches and no
/// exclude pattern does.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl PatternSet {
    /// Compile a pattern set.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvalidPattern`] for malformed glob syntax.
    pub fn new<I, S>(patterns: I) -> Result<Self, LocationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();

        for raw in patterns {
            let raw = raw.as_ref();
            let (negated, body) = match raw.strip_prefix(NEGATION_MARKER) {
                Some(body) => (true, body),
                None => (false, raw),
            };

            let normalized = body.replace("::", "/").replace('\\', "/");
            let pattern = Pattern::new(&normalized).map_err(|source| {
                LocationError::InvalidPattern {
                    pattern: raw.to_owned(),
                    source,
                }
            })?;

            if negated {
                set.exclude.push(pattern);
            } else {
                set.include.push(pattern);
            }
        }

        Ok(set)
    }

    /// Whether the set holds no patterns at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Test a location against the set.
    #[must_use]
    pub fn matches(&self, location: &Location) -> bool {
        let path = location.to_match_path();
        let hit = |p: &Pattern| p.matches_with(&path, MATCH_OPTIONS);

        self.include.iter().any(hit) && !self.exclude.iter().any(hit)
    }
}

impl Location {
    /// Test this location against a compiled [`PatternSet`].
    #[must_use]
    pub fn matches(&self, patterns: &PatternSet) -> bool {
        patterns.matches(self)
    }
}
