//! The flat result of resolving a layer stack.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::layer::ThemeLayer;
use crate::render::ColorSpace;
use crate::token::{TokenDocument, TokenValue};

use super::adaptive::ColorMode;

/// A fully resolved theme: every single token keyed by its full dotted path.
///
/// Values are literals or validated variable references; groups are
/// flattened away. Iteration is always in path order, so two resolutions of
/// the same input compare and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTheme {
    tokens: BTreeMap<String, TokenValue>,
    mode: Option<ColorMode>,
}

impl ResolvedTheme {
    pub(crate) fn new(tokens: BTreeMap<String, TokenValue>, mode: Option<ColorMode>) -> Self {
        Self { tokens, mode }
    }

    /// Returns the token at an exact path.
    pub fn get(&self, path: &str) -> Option<&TokenValue> {
        self.tokens.get(path)
    }

    /// Looks up a path the way utility classes address it.
    ///
    /// `colors.primary` finds `colors.primary` if it is a single token, and
    /// otherwise falls back to `colors.primary.DEFAULT`.
    pub fn lookup(&self, path: &str) -> Option<&TokenValue> {
        self.tokens
            .get(path)
            .or_else(|| self.tokens.get(&format!("{}.DEFAULT", path)))
    }

    /// Iterates the tokens of one top-level category in path order.
    pub fn category<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a TokenValue)> + 'a {
        self.tokens
            .iter()
            .filter(move |(path, _)| {
                path.strip_prefix(name)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
            })
            .map(|(path, value)| (path.as_str(), value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenValue)> {
        self.tokens.iter().map(|(path, value)| (path.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The mode this theme was resolved for, or `None` for a mode-less
    /// resolution.
    pub fn mode(&self) -> Option<ColorMode> {
        self.mode
    }

    /// Converts the theme back into a single unscoped layer.
    ///
    /// Resolving the returned layer reproduces this theme, which makes a
    /// resolved prefix of a stack usable as the base of a longer one.
    pub fn to_layer(&self) -> ThemeLayer {
        let mut root: BTreeMap<String, TokenValue> = BTreeMap::new();
        for (path, value) in &self.tokens {
            let segments: Vec<&str> = path.split('.').collect();
            insert_leaf(&mut root, &segments, value);
        }
        ThemeLayer::new(TokenDocument::from_root(None, root))
    }

    /// Renders every token as CSS text.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tokenlayer::{resolve, ColorSpace, KnownVariables, TokenDocument};
    ///
    /// let doc = TokenDocument::builder()
    ///     .token("colors.ring", "hsl(var(--ring))")
    ///     .token("borderRadius.lg", "var(--radius)")
    ///     .build()
    ///     .unwrap();
    /// let known = KnownVariables::new().declare("--ring").declare("--radius");
    /// let theme = resolve(&[doc.into()], &known).unwrap();
    ///
    /// let css = theme.render(ColorSpace::Oklch);
    /// assert_eq!(css["colors.ring"], "oklch(var(--ring))");
    /// assert_eq!(css["borderRadius.lg"], "var(--radius)");
    /// ```
    pub fn render(&self, space: ColorSpace) -> BTreeMap<String, String> {
        self.tokens
            .iter()
            .filter_map(|(path, value)| value.to_css(space).map(|css| (path.clone(), css)))
            .collect()
    }
}

fn insert_leaf(map: &mut BTreeMap<String, TokenValue>, segments: &[&str], value: &TokenValue) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        map.insert(head.to_string(), value.clone());
        return;
    }
    let node = map
        .entry(head.to_string())
        .or_insert_with(|| TokenValue::Composite(BTreeMap::new()));
    if let TokenValue::Composite(children) = node {
        insert_leaf(children, rest, value);
    }
}

impl<'a> IntoIterator for &'a ResolvedTheme {
    type Item = (&'a String, &'a TokenValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, TokenValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Serializes as a flat map from path to CSS text, in path order.
///
/// Color references are written with the default color function
/// ([`ColorSpace::Hsl`]) whatever function the source used, so a token given
/// as `oklch(var(--ring))` serializes as `hsl(var(--ring))`. Serialize the
/// map from [`ResolvedTheme::render`] to pick another one.
impl Serialize for ResolvedTheme {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.tokens
                .iter()
                .filter_map(|(path, value)| value.to_css(ColorSpace::default()).map(|css| (path, css))),
        )
    }
}
