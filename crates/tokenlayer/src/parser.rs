//! YAML and JSON theme files.
//!
//! A theme file is either a bare token tree:
//!
//! ```yaml
//! colors:
//!   gold: "#f6c177"
//!   # surface: "#1f1d2e"     <- commented out: simply absent
//!   primary:
//!     DEFAULT: "hsl(var(--primary))"
//!     foreground: "hsl(var(--primary-foreground))"
//! borderRadius:
//!   lg: var(--radius)
//! ```
//!
//! or a layer envelope with the tree under `tokens`:
//!
//! ```yaml
//! name: rose-pine-moon
//! mode: dark              # optional: only applies when resolving dark
//! merge:
//!   colors: replace       # optional: extend (default) or replace
//! tokens:
//!   colors:
//!     gold: "#f6c177"
//! ```
//!
//! Value rules:
//!
//! - strings are classified by [`TokenValue::parse`]
//! - numbers and booleans become literals of their text
//! - sequences become a comma-separated literal (font-family fallback lists)
//! - `null` is absent, exactly like a commented-out key
//! - keys may be dotted (`highlight.low`), which is the same as nesting
//! - a key repeated within one mapping is a duplicate path, in YAML and JSON
//!   alike

use std::collections::BTreeSet;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};

use crate::error::{DocumentError, PathIssue, ResolveError};
use crate::layer::ThemeLayer;
use crate::token::{DocumentBuilder, TokenDocument, TokenValue};

const ENVELOPE_KEYS: &[&str] = &["name", "mode", "merge", "tokens"];

impl TokenDocument {
    /// Parses a bare token tree from YAML.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tokenlayer::{TokenDocument, TokenValue};
    ///
    /// let doc = TokenDocument::from_yaml(r##"
    /// colors:
    ///   gold: "#f6c177"
    ///   border: hsl(var(--border))
    /// fontFamily:
    ///   sans: [Inter, sans-serif]
    /// "##).unwrap();
    ///
    /// assert_eq!(doc.get("colors.border"), Some(&TokenValue::color_var("--border")));
    /// assert_eq!(doc.get("fontFamily.sans"), Some(&TokenValue::literal("Inter, sans-serif")));
    /// ```
    pub fn from_yaml(text: &str) -> Result<Self, DocumentError> {
        document_from_value(&parse_yaml(text)?, None)
    }

    /// Parses a bare token tree from JSON.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        document_from_value(&parse_json(text)?, None)
    }
}

impl ThemeLayer {
    /// Parses a layer from YAML, either enveloped or as a bare token tree.
    pub fn from_yaml(text: &str) -> Result<Self, DocumentError> {
        layer_from_value(&parse_yaml(text)?)
    }

    /// Parses a layer from JSON, either enveloped or as a bare token tree.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        layer_from_value(&parse_json(text)?)
    }
}

// ============================================================================
// Raw values
// ============================================================================

/// A YAML or JSON value with every mapping entry kept in source order, so a
/// repeated key can be reported as the token path it duplicates.
#[derive(Debug)]
enum Raw {
    Null,
    Text(String),
    /// A number or boolean, as text.
    Scalar(String),
    List(Vec<Raw>),
    Map(Vec<(Raw, Raw)>),
    Tagged,
}

impl<'de> Deserialize<'de> for Raw {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RawVisitor)
    }
}

struct RawVisitor;

impl<'de> Visitor<'de> for RawVisitor {
    type Value = Raw;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a token tree")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Raw, E> {
        Ok(Raw::Scalar(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Raw, E> {
        Ok(Raw::Scalar(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Raw, E> {
        Ok(Raw::Scalar(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Raw, E> {
        // Whole floats keep their fraction so `1.0` does not read back as `1`.
        let text = if v.is_finite() && v.fract() == 0.0 {
            format!("{:.1}", v)
        } else {
            v.to_string()
        };
        Ok(Raw::Scalar(text))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Raw, E> {
        Ok(Raw::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Raw, E> {
        Ok(Raw::Text(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Raw, E> {
        Ok(Raw::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Raw, E> {
        Ok(Raw::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Raw, D::Error>
    where
        D: Deserializer<'de>,
    {
        Raw::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Raw, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Raw::List(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Raw, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::new();
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }
        Ok(Raw::Map(entries))
    }

    fn visit_enum<A>(self, data: A) -> Result<Raw, A::Error>
    where
        A: EnumAccess<'de>,
    {
        // YAML tags (`!color "#fff"`) arrive as enums.
        let (_tag, variant): (String, _) = data.variant()?;
        variant.newtype_variant::<Raw>()?;
        Ok(Raw::Tagged)
    }
}

fn parse_yaml(text: &str) -> Result<Raw, DocumentError> {
    serde_yaml::from_str(text).map_err(|e| DocumentError::Parse {
        format: "yaml",
        message: e.to_string(),
    })
}

fn parse_json(text: &str) -> Result<Raw, DocumentError> {
    serde_json::from_str(text).map_err(|e| DocumentError::Parse {
        format: "json",
        message: e.to_string(),
    })
}

// ============================================================================
// Layers and documents
// ============================================================================

fn layer_from_value(value: &Raw) -> Result<ThemeLayer, DocumentError> {
    let entries = match value {
        Raw::Map(entries) if entry(entries, "tokens").is_some() => entries,
        _ => return Ok(ThemeLayer::new(document_from_value(value, None)?)),
    };

    let mut seen = BTreeSet::new();
    for (key, _) in entries {
        let key = key_string(key, "")?;
        if !ENVELOPE_KEYS.contains(&key.as_str()) {
            return Err(invalid(
                &key,
                "unknown layer key (expected name, mode, merge or tokens)",
            ));
        }
        if !seen.insert(key.clone()) {
            return Err(invalid(&key, "layer key is given more than once"));
        }
    }

    let name = match entry(entries, "name") {
        None | Some(Raw::Null) => None,
        Some(Raw::Text(s)) => Some(s.clone()),
        Some(_) => return Err(invalid("name", "layer name must be a string")),
    };

    let tokens = entry(entries, "tokens").unwrap_or(&Raw::Null);
    let mut layer = ThemeLayer::new(document_from_value(tokens, name)?);

    match entry(entries, "mode") {
        None | Some(Raw::Null) => {}
        Some(Raw::Text(s)) => layer = layer.for_mode(s.parse()?),
        Some(_) => return Err(invalid("mode", "layer mode must be 'light' or 'dark'")),
    }

    match entry(entries, "merge") {
        None | Some(Raw::Null) => {}
        Some(Raw::Map(modes)) => {
            let mut categories = BTreeSet::new();
            for (key, mode) in modes {
                let category = key_string(key, "merge")?;
                if !categories.insert(category.clone()) {
                    return Err(invalid(&category, "merge mode is given more than once"));
                }
                let Raw::Text(mode) = mode else {
                    return Err(invalid(&category, "merge mode must be a string"));
                };
                layer = layer.with_merge(&category, ThemeLayer::parse_merge_mode(&category, mode)?);
            }
        }
        Some(_) => return Err(invalid("merge", "merge must map categories to modes")),
    }

    Ok(layer)
}

fn entry<'a>(entries: &'a [(Raw, Raw)], key: &str) -> Option<&'a Raw> {
    entries.iter().find_map(|(k, v)| match k {
        Raw::Text(k) if k == key => Some(v),
        _ => None,
    })
}

fn document_from_value(value: &Raw, name: Option<String>) -> Result<TokenDocument, DocumentError> {
    let mut builder = TokenDocument::builder();
    if let Some(name) = name {
        builder = builder.name(name);
    }

    match value {
        Raw::Null => {}
        Raw::Map(entries) => collect_mapping("", entries, &mut builder)?,
        _ => return Err(invalid("", "document root must be a mapping")),
    }

    Ok(builder.build()?)
}

fn collect_mapping(
    prefix: &str,
    entries: &[(Raw, Raw)],
    builder: &mut DocumentBuilder,
) -> Result<(), DocumentError> {
    let mut seen = BTreeSet::new();
    for (key, value) in entries {
        let key = key_string(key, prefix)?;
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        if !seen.insert(key) {
            return Err(ResolveError::MalformedPath {
                path,
                layer: None,
                reason: PathIssue::Duplicate,
            }
            .into());
        }
        collect(&path, value, builder)?;
    }
    Ok(())
}

fn collect(path: &str, value: &Raw, builder: &mut DocumentBuilder) -> Result<(), DocumentError> {
    match value {
        Raw::Null => {}
        Raw::Text(s) => builder.push(path, s.as_str()),
        Raw::Scalar(s) => builder.push(path, TokenValue::literal(s.as_str())),
        Raw::List(items) => builder.push(path, TokenValue::literal(join_list(path, items)?)),
        Raw::Map(entries) if entries.is_empty() => {
            builder.push(path, TokenValue::group(Vec::<(String, TokenValue)>::new()))
        }
        Raw::Map(entries) => collect_mapping(path, entries, builder)?,
        Raw::Tagged => return Err(invalid(path, "tagged values are not supported")),
    }
    Ok(())
}

/// Joins a fallback list such as `[Inter, system-ui, sans-serif]`.
fn join_list(path: &str, items: &[Raw]) -> Result<String, DocumentError> {
    let parts = items
        .iter()
        .map(|item| match item {
            Raw::Text(s) | Raw::Scalar(s) => Ok(s.as_str()),
            _ => Err(invalid(path, "list items must be strings or numbers")),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(", "))
}

fn key_string(key: &Raw, parent: &str) -> Result<String, DocumentError> {
    match key {
        Raw::Text(s) | Raw::Scalar(s) => Ok(s.clone()),
        _ => Err(invalid(parent, "keys must be strings")),
    }
}

fn invalid(path: &str, message: &str) -> DocumentError {
    DocumentError::InvalidValue {
        path: path.to_string(),
        message: message.to_string(),
    }
}
