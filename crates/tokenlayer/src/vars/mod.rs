//! Known custom properties, per color mode.
//!
//! The resolver does not define variables; it only checks that every reference
//! in a theme names a variable the hosting build declares. [`KnownVariables`]
//! is that declaration set. It can be built by hand, or scanned from the
//! stylesheet that declares the variables with [`KnownVariables::from_css`].

mod css;

use std::collections::BTreeSet;

use crate::theme::ColorMode;

pub use css::parse_css_variables;

/// Custom-property names declared by the runtime environment.
///
/// Names are stored exactly as given, including the leading `--`.
///
/// # Example
///
/// ```rust
/// use tokenlayer::{ColorMode, KnownVariables};
///
/// let known = KnownVariables::new()
///     .declare("--radius")
///     .declare_for(ColorMode::Dark, "--glow");
///
/// assert!(known.contains(ColorMode::Light, "--radius"));
/// assert!(known.contains(ColorMode::Dark, "--glow"));
/// assert!(!known.contains(ColorMode::Light, "--glow"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownVariables {
    light: BTreeSet<String>,
    dark: BTreeSet<String>,
}

impl KnownVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a variable for both modes.
    pub fn declare(mut self, name: impl Into<String>) -> Self {
        self.insert(None, name);
        self
    }

    /// Declares a variable for one mode only.
    pub fn declare_for(mut self, mode: ColorMode, name: impl Into<String>) -> Self {
        self.insert(Some(mode), name);
        self
    }

    /// Adds a name; `None` means both modes.
    pub fn insert(&mut self, mode: Option<ColorMode>, name: impl Into<String>) {
        let name = name.into();
        match mode {
            Some(mode) => {
                self.names_mut(mode).insert(name);
            }
            None => {
                self.light.insert(name.clone());
                self.dark.insert(name);
            }
        }
    }

    pub fn contains(&self, mode: ColorMode, name: &str) -> bool {
        self.names(mode).contains(name)
    }

    /// Returns the declared names for a mode, sorted.
    pub fn names(&self, mode: ColorMode) -> &BTreeSet<String> {
        match mode {
            ColorMode::Light => &self.light,
            ColorMode::Dark => &self.dark,
        }
    }

    fn names_mut(&mut self, mode: ColorMode) -> &mut BTreeSet<String> {
        match mode {
            ColorMode::Light => &mut self.light,
            ColorMode::Dark => &mut self.dark,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.light.is_empty() && self.dark.is_empty()
    }

    /// Combines two declaration sets.
    pub fn merge(mut self, other: KnownVariables) -> Self {
        self.light.extend(other.light);
        self.dark.extend(other.dark);
        self
    }
}

impl<S: Into<String>> FromIterator<S> for KnownVariables {
    /// Collects names declared for both modes.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut known = KnownVariables::new();
        for name in iter {
            known.insert(None, name);
        }
        known
    }
}
