//! Error types for token resolution and document loading.
//!
//! [`ResolveError`] covers the resolver itself: value-kind conflicts between
//! layers, references to undeclared variables, and malformed token paths.
//! [`DocumentError`] covers the adapters that turn YAML, JSON or CSS text into
//! documents and variable sets.

use std::fmt;

use thiserror::Error;

use crate::theme::ColorMode;
use crate::token::ValueKind;

/// Why a token path was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathIssue {
    /// The path has no segments at all.
    Empty,
    /// A segment between dots is empty (`colors..gold`, `.gold`, `gold.`).
    EmptySegment,
    /// The same path is defined twice in one document, or is defined both as
    /// a token and as a group of tokens.
    Duplicate,
}

impl fmt::Display for PathIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathIssue::Empty => write!(f, "path is empty"),
            PathIssue::EmptySegment => write!(f, "path contains an empty segment"),
            PathIssue::Duplicate => write!(f, "path is defined more than once"),
        }
    }
}

/// Errors produced while resolving theme layers.
///
/// Every variant names the offending token path. Resolution is all-or-nothing:
/// when any of these is returned, no partial theme exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A layer gives a path a value kind that cannot be merged with what
    /// earlier layers accumulated there (a single token vs. a token group).
    #[error("conflicting kinds for token '{path}' in layer {layer}: existing {existing} cannot be merged with {incoming}")]
    Conflict {
        path: String,
        layer: usize,
        existing: ValueKind,
        incoming: ValueKind,
    },

    /// A variable reference names a variable that is not declared for `mode`.
    #[error("token '{path}' from layer {layer} references undeclared variable '{reference}' in {mode} mode")]
    UnresolvedReference {
        path: String,
        reference: String,
        layer: usize,
        mode: ColorMode,
    },

    /// A token path is empty, has an empty segment, or is defined twice.
    #[error("malformed token path '{path}'{}: {reason}", layer_suffix(.layer))]
    MalformedPath {
        path: String,
        layer: Option<usize>,
        reason: PathIssue,
    },
}

impl ResolveError {
    /// Returns the token path the error is about.
    pub fn path(&self) -> &str {
        match self {
            ResolveError::Conflict { path, .. }
            | ResolveError::UnresolvedReference { path, .. }
            | ResolveError::MalformedPath { path, .. } => path,
        }
    }

    /// Returns the index of the layer the error was found in, if known.
    pub fn layer(&self) -> Option<usize> {
        match self {
            ResolveError::Conflict { layer, .. }
            | ResolveError::UnresolvedReference { layer, .. } => Some(*layer),
            ResolveError::MalformedPath { layer, .. } => *layer,
        }
    }

    /// Records which layer a malformed path came from.
    ///
    /// Documents are built before they have a place in a stack, so a loader
    /// that knows the index attaches it here. An index already present is
    /// kept, and the other variants always carry one.
    pub fn at_layer(self, index: usize) -> Self {
        match self {
            ResolveError::MalformedPath {
                path,
                layer: None,
                reason,
            } => ResolveError::MalformedPath {
                path,
                layer: Some(index),
                reason,
            },
            other => other,
        }
    }
}

fn layer_suffix(layer: &Option<usize>) -> String {
    layer
        .map(|index| format!(" in layer {}", index))
        .unwrap_or_default()
}

/// Errors produced while turning text into documents, layers or variable sets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The text is not valid YAML, JSON or CSS.
    #[error("failed to parse {format} document: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// A value has a shape that cannot become a token.
    #[error("invalid value for '{path}': {message}")]
    InvalidValue { path: String, message: String },

    /// A merge annotation is neither `extend` nor `replace`.
    #[error("invalid merge mode '{value}' for category '{category}' (expected 'extend' or 'replace')")]
    InvalidMergeMode { category: String, value: String },

    /// A layer scope is neither `light` nor `dark`.
    #[error("invalid color mode '{0}' (expected 'light' or 'dark')")]
    InvalidColorMode(String),

    /// A custom property is declared twice within the same scope.
    #[error("variable '{name}' is declared more than once in {scope} scope")]
    DuplicateVariable { name: String, scope: String },

    /// A token path in the document is malformed.
    #[error(transparent)]
    Path(#[from] ResolveError),
}

impl DocumentError {
    /// Attaches a layer index to a malformed-path error, see
    /// [`ResolveError::at_layer`].
    pub fn at_layer(self, index: usize) -> Self {
        match self {
            DocumentError::Path(err) => DocumentError::Path(err.at_layer(index)),
            other => other,
        }
    }
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display() {
        let err = ResolveError::Conflict {
            path: "colors.text".to_string(),
            layer: 2,
            existing: ValueKind::Literal,
            incoming: ValueKind::Composite,
        };
        let msg = err.to_string();
        assert!(msg.contains("colors.text"));
        assert!(msg.contains("layer 2"));
        assert!(msg.contains("literal"));
        assert!(msg.contains("composite"));
    }

    #[test]
    fn test_unresolved_reference_display() {
        let err = ResolveError::UnresolvedReference {
            path: "border".to_string(),
            reference: "--border".to_string(),
            layer: 0,
            mode: ColorMode::Dark,
        };
        let msg = err.to_string();
        assert!(msg.contains("'border'"));
        assert!(msg.contains("--border"));
        assert!(msg.contains("dark mode"));
    }

    #[test]
    fn test_malformed_path_display_with_and_without_layer() {
        let err = ResolveError::MalformedPath {
            path: "colors..gold".to_string(),
            layer: None,
            reason: PathIssue::EmptySegment,
        };
        assert_eq!(
            err.to_string(),
            "malformed token path 'colors..gold': path contains an empty segment"
        );

        let err = ResolveError::MalformedPath {
            path: "".to_string(),
            layer: Some(3),
            reason: PathIssue::Empty,
        };
        assert_eq!(
            err.to_string(),
            "malformed token path '' in layer 3: path is empty"
        );
    }

    #[test]
    fn test_accessors() {
        let err = ResolveError::UnresolvedReference {
            path: "ring".to_string(),
            reference: "--ring".to_string(),
            layer: 4,
            mode: ColorMode::Light,
        };
        assert_eq!(err.path(), "ring");
        assert_eq!(err.layer(), Some(4));
    }

    #[test]
    fn test_at_layer_fills_missing_index() {
        let err = ResolveError::MalformedPath {
            path: "colors.muted".to_string(),
            layer: None,
            reason: PathIssue::Duplicate,
        };
        let err = err.at_layer(1);
        assert_eq!(err.layer(), Some(1));
        assert!(err.to_string().contains("in layer 1"));

        // An index already known is not overwritten.
        assert_eq!(err.at_layer(5).layer(), Some(1));
    }

    #[test]
    fn test_at_layer_leaves_other_errors() {
        let err = ResolveError::Conflict {
            path: "colors.text".to_string(),
            layer: 2,
            existing: ValueKind::Literal,
            incoming: ValueKind::Composite,
        };
        assert_eq!(err.clone().at_layer(0), err);

        let doc = DocumentError::InvalidColorMode("dusk".to_string());
        assert_eq!(doc.clone().at_layer(0), doc);

        let doc = DocumentError::Path(ResolveError::MalformedPath {
            path: "".to_string(),
            layer: None,
            reason: PathIssue::Empty,
        });
        assert!(matches!(
            doc.at_layer(2),
            DocumentError::Path(ResolveError::MalformedPath { layer: Some(2), .. })
        ));
    }

    #[test]
    fn test_document_error_wraps_path_error() {
        let inner = ResolveError::MalformedPath {
            path: "a".to_string(),
            layer: None,
            reason: PathIssue::Duplicate,
        };
        let err: DocumentError = inner.clone().into();
        assert_eq!(err.to_string(), inner.to_string());
    }
}
