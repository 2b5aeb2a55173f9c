//! Theme layers: a document plus how it merges onto earlier layers.
//!
//! Every top-level category of a layer merges in one of two ways:
//!
//! - [`MergeMode::Extend`] (the default): keys are unioned with what earlier
//!   layers defined, and keys defined here shadow earlier ones. Groups merge
//!   recursively, so overriding `primary.foreground` keeps `primary.DEFAULT`.
//! - [`MergeMode::Replace`]: everything earlier layers put in the category is
//!   discarded before this layer's keys are applied.
//!
//! A layer may also be scoped to one [`ColorMode`]. Scoped layers only take
//! part when a theme is resolved for that mode; unscoped layers always do.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::theme::ColorMode;
use crate::token::TokenDocument;

/// How a layer's category combines with earlier layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Union with earlier keys; keys defined here win.
    #[default]
    Extend,
    /// Discard earlier keys in the category first.
    Replace,
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::Extend => write!(f, "extend"),
            MergeMode::Replace => write!(f, "replace"),
        }
    }
}

impl FromStr for MergeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "extend" => Ok(MergeMode::Extend),
            "replace" => Ok(MergeMode::Replace),
            other => Err(other.to_string()),
        }
    }
}

/// One document in an ordered stack of theme layers.
///
/// # Example
///
/// ```rust
/// use tokenlayer::{ColorMode, MergeMode, ThemeLayer, TokenDocument};
///
/// let doc = TokenDocument::builder()
///     .token("colors.background", "#191724")
///     .build()
///     .unwrap();
///
/// let layer = ThemeLayer::new(doc)
///     .replace("colors")
///     .for_mode(ColorMode::Dark);
///
/// assert_eq!(layer.merge_mode("colors"), MergeMode::Replace);
/// assert_eq!(layer.merge_mode("spacing"), MergeMode::Extend);
/// assert!(!layer.applies_to(Some(ColorMode::Light)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeLayer {
    document: TokenDocument,
    merge: BTreeMap<String, MergeMode>,
    mode: Option<ColorMode>,
}

impl ThemeLayer {
    /// Wraps a document; every category extends by default.
    pub fn new(document: TokenDocument) -> Self {
        Self {
            document,
            merge: BTreeMap::new(),
            mode: None,
        }
    }

    /// Sets the merge mode for one top-level category.
    ///
    /// Annotations for categories the document does not define have no
    /// effect: absence is never an operation, even under `Replace`.
    pub fn with_merge(mut self, category: impl Into<String>, mode: MergeMode) -> Self {
        self.merge.insert(category.into(), mode);
        self
    }

    /// Marks a category as replacing everything earlier layers defined in it.
    pub fn replace(self, category: impl Into<String>) -> Self {
        self.with_merge(category, MergeMode::Replace)
    }

    /// Marks a category as extending earlier layers (the default).
    pub fn extend(self, category: impl Into<String>) -> Self {
        self.with_merge(category, MergeMode::Extend)
    }

    /// Names the layer. The name only appears in logs and error context.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.document = self.document.with_name(name);
        self
    }

    /// Restricts the layer to one color mode.
    pub fn for_mode(mut self, mode: ColorMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn document(&self) -> &TokenDocument {
        &self.document
    }

    /// Returns the document's name.
    pub fn name(&self) -> Option<&str> {
        self.document.name()
    }

    pub fn mode(&self) -> Option<ColorMode> {
        self.mode
    }

    /// Returns the merge mode for a category, defaulting to `Extend`.
    pub fn merge_mode(&self, category: &str) -> MergeMode {
        self.merge.get(category).copied().unwrap_or_default()
    }

    /// Returns the explicit merge annotations.
    pub fn merge_modes(&self) -> &BTreeMap<String, MergeMode> {
        &self.merge
    }

    /// Returns true if the layer takes part when resolving for `mode`.
    ///
    /// Unscoped layers apply to every resolution. Scoped layers apply only
    /// when resolving for their own mode, never for a mode-less resolution.
    pub fn applies_to(&self, mode: Option<ColorMode>) -> bool {
        match self.mode {
            None => true,
            Some(scope) => mode == Some(scope),
        }
    }

    /// Parses a merge annotation value, attributing errors to `category`.
    pub(crate) fn parse_merge_mode(category: &str, value: &str) -> Result<MergeMode, DocumentError> {
        value
            .parse()
            .map_err(|value| DocumentError::InvalidMergeMode {
                category: category.to_string(),
                value,
            })
    }
}

impl From<TokenDocument> for ThemeLayer {
    fn from(document: TokenDocument) -> Self {
        ThemeLayer::new(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> TokenDocument {
        TokenDocument::builder()
            .name("base")
            .token("colors.gold", "#f6c177")
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let layer = ThemeLayer::new(doc());
        assert_eq!(layer.name(), Some("base"));
        assert_eq!(layer.merge_mode("colors"), MergeMode::Extend);
        assert_eq!(layer.mode(), None);
        assert!(layer.merge_modes().is_empty());
    }

    #[test]
    fn test_named_overrides_document_name() {
        let layer = ThemeLayer::new(doc()).named("user");
        assert_eq!(layer.name(), Some("user"));
        assert_eq!(layer.document().len(), 1);
    }

    #[test]
    fn test_replace_then_extend_last_wins() {
        let layer = ThemeLayer::new(doc()).replace("colors").extend("colors");
        assert_eq!(layer.merge_mode("colors"), MergeMode::Extend);
    }

    #[test]
    fn test_applies_to_unscoped() {
        let layer = ThemeLayer::new(doc());
        assert!(layer.applies_to(None));
        assert!(layer.applies_to(Some(ColorMode::Light)));
        assert!(layer.applies_to(Some(ColorMode::Dark)));
    }

    #[test]
    fn test_applies_to_scoped() {
        let layer = ThemeLayer::new(doc()).for_mode(ColorMode::Light);
        assert!(!layer.applies_to(None));
        assert!(layer.applies_to(Some(ColorMode::Light)));
        assert!(!layer.applies_to(Some(ColorMode::Dark)));
    }

    #[test]
    fn test_merge_mode_parse() {
        assert_eq!("Replace".parse::<MergeMode>(), Ok(MergeMode::Replace));
        assert_eq!("extend".parse::<MergeMode>(), Ok(MergeMode::Extend));

        let err = ThemeLayer::parse_merge_mode("colors", "merge").unwrap_err();
        assert_eq!(
            err,
            DocumentError::InvalidMergeMode {
                category: "colors".into(),
                value: "merge".into(),
            }
        );
    }
}
