//! Token documents: one theme configuration as a tree of token groups.
//!
//! A [`TokenDocument`] is what a config loader produces from one source file.
//! Tokens are addressed by dotted paths, and a document is stored as a tree
//! keyed by top-level category (`colors`, `borderRadius`, `animation`, ...).
//!
//! Documents are built through [`DocumentBuilder`], which is the only place
//! path rules are enforced:
//!
//! - paths must be non-empty and have no empty segments
//! - a token may be defined only once per document
//! - a path cannot be both a token and a group (`colors.muted` and
//!   `colors.muted.DEFAULT` in the same document)
//!
//! Groups are containers, not tokens. A group given in several parts (twice
//! under the same path, or once nested and once through dotted paths) merges
//! its members, as long as no token inside it is given twice.
//!
//! Keys that are absent from a document are simply absent. There is no way to
//! express "delete this token" in a document.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::error::{PathIssue, ResolveError, Result};

use super::path::TokenPath;
use super::value::TokenValue;

/// An immutable tree of design tokens from a single source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenDocument {
    name: Option<String>,
    root: BTreeMap<String, TokenValue>,
}

impl TokenDocument {
    /// Creates an empty, unnamed document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a document.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tokenlayer::TokenDocument;
    ///
    /// let doc = TokenDocument::builder()
    ///     .name("rose-pine")
    ///     .token("colors.gold", "#f6c177")
    ///     .token("colors.highlight.low", "#21202e")
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(doc.len(), 2);
    /// assert_eq!(doc.name(), Some("rose-pine"));
    /// ```
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    pub(crate) fn from_root(name: Option<String>, root: BTreeMap<String, TokenValue>) -> Self {
        Self { name, root }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns a copy of this document with the given name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Iterates top-level categories in key order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &TokenValue)> {
        self.root.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn category(&self, name: &str) -> Option<&TokenValue> {
        self.root.get(name)
    }

    /// Looks up a token or group by dotted path.
    pub fn get(&self, path: &str) -> Option<&TokenValue> {
        let mut segments = path.split('.');
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_composite()?.get(segment)?;
        }
        Some(current)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Returns every single token with its full dotted path, in path order.
    pub fn leaves(&self) -> Vec<(String, &TokenValue)> {
        let mut out = Vec::new();
        for (key, value) in &self.root {
            collect_leaves(key.clone(), value, &mut out);
        }
        out
    }

    /// Returns the number of single tokens (groups are not counted).
    pub fn len(&self) -> usize {
        self.leaves().len()
    }

    /// Returns true if the document defines no categories.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

fn collect_leaves<'a>(path: String, value: &'a TokenValue, out: &mut Vec<(String, &'a TokenValue)>) {
    match value {
        TokenValue::Composite(children) => {
            for (key, child) in children {
                collect_leaves(format!("{}.{}", path, key), child, out);
            }
        }
        scalar => out.push((path, scalar)),
    }
}

/// Collects `(path, value)` entries and validates them into a [`TokenDocument`].
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    name: Option<String>,
    entries: Vec<(String, TokenValue)>,
}

impl DocumentBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a token (or a whole group) at a dotted path.
    ///
    /// A group added at a path that already holds a group contributes its
    /// members to it.
    ///
    /// String values are classified with [`TokenValue::parse`], so
    /// `"hsl(var(--ring))"` becomes a variable reference.
    pub fn token(mut self, path: impl Into<String>, value: impl Into<TokenValue>) -> Self {
        self.push(path, value);
        self
    }

    /// Adds a token without consuming the builder.
    pub fn push(&mut self, path: impl Into<String>, value: impl Into<TokenValue>) {
        self.entries.push((path.into(), value.into()));
    }

    /// Validates all entries and builds the document.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MalformedPath`] for an empty path, an empty
    /// segment, a token defined twice, or a path used for both a token and a
    /// group.
    pub fn build(self) -> Result<TokenDocument> {
        let mut root = BTreeMap::new();
        for (raw, value) in self.entries {
            let path = TokenPath::parse(&raw).map_err(|reason| malformed(&raw, reason))?;
            insert(&mut root, path.segments(), value, &raw)?;
        }
        Ok(TokenDocument::from_root(self.name, root))
    }
}

fn malformed(path: &str, reason: PathIssue) -> ResolveError {
    ResolveError::MalformedPath {
        path: path.to_string(),
        layer: None,
        reason,
    }
}

fn insert(
    map: &mut BTreeMap<String, TokenValue>,
    segments: &[String],
    value: TokenValue,
    path: &str,
) -> Result<()> {
    let Some((head, rest)) = segments.split_first() else {
        return Err(malformed(path, PathIssue::Empty));
    };

    if !rest.is_empty() {
        let children = group_at(map, head, path)?;
        return insert(children, rest, value, path);
    }

    match value {
        TokenValue::Composite(members) => {
            let children = group_at(map, head, path)?;
            for (key, member) in members {
                let member_path = format!("{}.{}", path, key);
                let sub = TokenPath::parse(&key).map_err(|reason| malformed(&member_path, reason))?;
                insert(children, sub.segments(), member, &member_path)?;
            }
            Ok(())
        }
        scalar => match map.entry(head.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(scalar);
                Ok(())
            }
            Entry::Occupied(_) => Err(malformed(path, PathIssue::Duplicate)),
        },
    }
}

/// Returns the group stored under `key`, creating it if absent.
fn group_at<'a>(
    map: &'a mut BTreeMap<String, TokenValue>,
    key: &str,
    path: &str,
) -> Result<&'a mut BTreeMap<String, TokenValue>> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| TokenValue::Composite(BTreeMap::new()));
    match slot {
        TokenValue::Composite(children) => Ok(children),
        _ => Err(malformed(path, PathIssue::Duplicate)),
    }
}
