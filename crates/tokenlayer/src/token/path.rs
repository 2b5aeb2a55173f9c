//! Dot-delimited token paths.

use std::fmt;

use crate::error::PathIssue;

/// A validated, dot-delimited token path such as `colors.highlight.low`.
///
/// The first segment is the token's top-level category. Segment text is kept
/// verbatim, so `DEFAULT`, `ping-once` and `2xl` are all valid segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenPath {
    segments: Vec<String>,
}

impl TokenPath {
    /// Parses a dotted path.
    ///
    /// Surrounding whitespace is not trimmed: `" gold"` is a distinct segment
    /// from `"gold"`.
    pub fn parse(raw: &str) -> Result<Self, PathIssue> {
        if raw.is_empty() {
            return Err(PathIssue::Empty);
        }
        Self::from_segments(raw.split('.'))
    }

    /// Builds a path from already-split segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathIssue>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(PathIssue::Empty);
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(PathIssue::EmptySegment);
        }
        Ok(Self { segments })
    }

    /// Returns the top-level category (the first segment).
    pub fn category(&self) -> &str {
        &self.segments[0]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: &str) -> Result<Self, PathIssue> {
        let mut segments = self.segments.clone();
        segments.extend(segment.split('.').map(str::to_string));
        Self::from_segments(segments)
    }
}

impl fmt::Display for TokenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
