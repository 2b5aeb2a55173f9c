//! Token value types: literals, variable references and token groups.
//!
//! A token value is written the way it would appear in a stylesheet config:
//!
//! ```text
//! "#f6c177"                      -> Literal
//! "cubic-bezier(0.2, 0, 0, 1)"   -> Literal (opaque, never parsed)
//! "var(--radius)"                -> VariableRef, bare
//! "hsl(var(--border))"           -> VariableRef, wrapped in a color function
//! "calc(var(--radius) - 2px)"    -> Literal that embeds a reference
//! ```
//!
//! The color function a reference was written with (`hsl`, `oklch`, ...) is not
//! part of the value's identity. It is chosen again at render time through
//! [`ColorSpace`], so `hsl(var(--ring))` and `oklch(var(--ring))` are the same
//! token.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::render::ColorSpace;

/// Color functions recognized around a bare `var(--name)` reference.
pub const COLOR_FUNCTIONS: &[&str] = &[
    "hsl", "hsla", "rgb", "rgba", "oklch", "oklab", "lab", "lch", "hwb",
];

/// How a variable reference is embedded in the final CSS value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wrap {
    /// Rendered as `var(--name)`.
    #[default]
    Bare,
    /// Rendered inside the configured color function, e.g. `hsl(var(--name))`.
    Color,
}

/// A reference to an externally defined CSS custom property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableRef {
    name: String,
    #[serde(default)]
    wrap: Wrap,
}

impl VariableRef {
    /// Creates a bare reference. `name` includes the leading `--`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wrap: Wrap::Bare,
        }
    }

    /// Creates a reference that renders inside a color function.
    pub fn color(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wrap: Wrap::Color,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wrap(&self) -> Wrap {
        self.wrap
    }

    /// Parses `var(--name)` or `<color-fn>(var(--name))`.
    ///
    /// Returns `None` for anything else, including references with a fallback
    /// (`var(--x, red)`) and color functions with extra arguments.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(name) = parse_var_call(raw) {
            return Some(Self::new(name));
        }

        let open = raw.find('(')?;
        let function = raw[..open].to_ascii_lowercase();
        if !COLOR_FUNCTIONS.contains(&function.as_str()) {
            return None;
        }
        let inner = raw[open + 1..].strip_suffix(')')?;
        parse_var_call(inner.trim()).map(Self::color)
    }

    /// Renders the reference as a CSS value.
    pub fn to_css(&self, space: ColorSpace) -> String {
        match (self.wrap, space.function()) {
            (Wrap::Color, Some(function)) => format!("{}(var({}))", function, self.name),
            _ => format!("var({})", self.name),
        }
    }
}

/// The kind of a [`TokenValue`], used when reporting merge conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Literal,
    VariableRef,
    Composite,
}

impl ValueKind {
    /// Literals and variable references are single tokens; composites are groups.
    pub fn is_scalar(self) -> bool {
        !matches!(self, ValueKind::Composite)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Literal => write!(f, "literal"),
            ValueKind::VariableRef => write!(f, "variable reference"),
            ValueKind::Composite => write!(f, "composite"),
        }
    }
}

/// A single design-token value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenValue {
    /// A value used as written: hex colors, timing curves, shadow lists.
    Literal(String),
    /// A reference to an external custom property.
    VariableRef(VariableRef),
    /// A group of named sub-tokens, such as `primary.DEFAULT` and
    /// `primary.foreground`.
    Composite(BTreeMap<String, TokenValue>),
}

impl TokenValue {
    pub fn literal(value: impl Into<String>) -> Self {
        TokenValue::Literal(value.into())
    }

    /// Creates a bare `var(--name)` reference.
    pub fn var(name: impl Into<String>) -> Self {
        TokenValue::VariableRef(VariableRef::new(name))
    }

    /// Creates a color reference, rendered as e.g. `hsl(var(--name))`.
    pub fn color_var(name: impl Into<String>) -> Self {
        TokenValue::VariableRef(VariableRef::color(name))
    }

    /// Creates a token group from `(key, value)` pairs.
    pub fn group<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<TokenValue>,
    {
        TokenValue::Composite(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Classifies a raw config string as a reference or an opaque literal.
    ///
    /// Literals keep their original text, including surrounding whitespace.
    pub fn parse(raw: &str) -> Self {
        match VariableRef::parse(raw) {
            Some(reference) => TokenValue::VariableRef(reference),
            None => TokenValue::Literal(raw.to_string()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            TokenValue::Literal(_) => ValueKind::Literal,
            TokenValue::VariableRef(_) => ValueKind::VariableRef,
            TokenValue::Composite(_) => ValueKind::Composite,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.kind().is_scalar()
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            TokenValue::Literal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableRef> {
        match self {
            TokenValue::VariableRef(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&BTreeMap<String, TokenValue>> {
        match self {
            TokenValue::Composite(children) => Some(children),
            _ => None,
        }
    }

    /// Returns every custom-property name this value depends on.
    ///
    /// For literals these are the references embedded in the text, such as
    /// `--radius` in `calc(var(--radius) + 4px)`. Groups report the references
    /// of all their members in key order.
    pub fn references(&self) -> Vec<&str> {
        match self {
            TokenValue::Literal(text) => embedded_references(text),
            TokenValue::VariableRef(reference) => vec![reference.name()],
            TokenValue::Composite(children) => {
                children.values().flat_map(|v| v.references()).collect()
            }
        }
    }

    /// Renders a single token as a CSS value. Groups have no single value.
    pub fn to_css(&self, space: ColorSpace) -> Option<String> {
        match self {
            TokenValue::Literal(text) => Some(text.clone()),
            TokenValue::VariableRef(reference) => Some(reference.to_css(space)),
            TokenValue::Composite(_) => None,
        }
    }
}

impl From<&str> for TokenValue {
    fn from(raw: &str) -> Self {
        TokenValue::parse(raw)
    }
}

impl From<String> for TokenValue {
    fn from(raw: String) -> Self {
        TokenValue::parse(&raw)
    }
}

impl From<VariableRef> for TokenValue {
    fn from(reference: VariableRef) -> Self {
        TokenValue::VariableRef(reference)
    }
}

impl From<BTreeMap<String, TokenValue>> for TokenValue {
    fn from(children: BTreeMap<String, TokenValue>) -> Self {
        TokenValue::Composite(children)
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Literal(text) => write!(f, "{}", text),
            TokenValue::VariableRef(reference) => {
                write!(f, "{}", reference.to_css(ColorSpace::default()))
            }
            TokenValue::Composite(children) => {
                write!(f, "{{")?;
                for (i, (key, value)) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Matches exactly `var(--name)` with no fallback.
fn parse_var_call(raw: &str) -> Option<&str> {
    let name = raw.strip_prefix("var(")?.strip_suffix(')')?.trim();
    is_custom_property(name).then_some(name)
}

fn is_custom_property(name: &str) -> bool {
    name.len() > 2
        && name.starts_with("--")
        && name[2..].chars().all(is_name_char)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Finds `var(--name` occurrences anywhere in a literal.
fn embedded_references(text: &str) -> Vec<&str> {
    let mut references = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find("var(") {
        rest = &rest[pos + 4..];
        let candidate = rest.trim_start();
        if let Some(body) = candidate.strip_prefix("--") {
            let len = body.find(|c: char| !is_name_char(c)).unwrap_or(body.len());
            if len > 0 {
                references.push(&candidate[..len + 2]);
            }
        }
    }
    references
}
