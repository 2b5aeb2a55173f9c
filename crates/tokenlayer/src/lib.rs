//! # Tokenlayer - Layered Design-Token Resolution
//!
//! `tokenlayer` resolves an ordered stack of design-token documents (colors,
//! radii, shadows, animations, ...) into one flat, validated token table.
//! Framework defaults come first, user configuration last; later layers win.
//!
//! ## Core Concepts
//!
//! - [`TokenDocument`]: one source's tokens as a tree keyed by category
//! - [`TokenValue`]: a literal, a reference to a CSS custom property, or a
//!   group of named sub-tokens
//! - [`ThemeLayer`]: a document plus per-category [`MergeMode`] and an
//!   optional [`ColorMode`] scope
//! - [`KnownVariables`]: the custom properties the hosting build declares
//! - [`ResolvedTheme`]: the flat `path -> value` result
//!
//! ## Quick Start
//!
//! ```rust
//! use tokenlayer::{resolve, KnownVariables, ThemeLayer, TokenDocument};
//!
//! let defaults = TokenDocument::builder()
//!     .name("defaults")
//!     .token("colors.primary.DEFAULT", "hsl(var(--primary))")
//!     .token("colors.primary.foreground", "hsl(var(--primary-foreground))")
//!     .token("borderRadius.lg", "var(--radius)")
//!     .token("borderRadius.md", "calc(var(--radius) - 2px)")
//!     .build()
//!     .unwrap();
//!
//! let user = TokenDocument::builder()
//!     .name("rose-pine")
//!     .token("colors.gold", "#f6c177")
//!     .token("borderRadius.xs", "2px")
//!     .build()
//!     .unwrap();
//!
//! let known: KnownVariables = ["--primary", "--primary-foreground", "--radius"]
//!     .into_iter()
//!     .collect();
//!
//! let theme = resolve(&[defaults.into(), user.into()], &known).unwrap();
//!
//! assert_eq!(theme.len(), 6);
//! assert_eq!(theme.lookup("colors.primary").unwrap().to_string(), "hsl(var(--primary))");
//! assert_eq!(theme.get("borderRadius.xs").unwrap().to_string(), "2px");
//! ```
//!
//! ## Replacing a Category
//!
//! By default a layer extends each category it defines. Marking a category as
//! `replace` discards everything earlier layers put there:
//!
//! ```rust
//! use tokenlayer::{resolve, KnownVariables, ThemeLayer};
//!
//! let defaults = ThemeLayer::from_yaml(r##"
//! colors:
//!   slate: "#64748b"
//!   zinc: "#71717a"
//! spacing:
//!   "1": 0.25rem
//! "##).unwrap();
//!
//! let user = ThemeLayer::from_yaml(r##"
//! merge:
//!   colors: replace
//! tokens:
//!   colors:
//!     love: "#eb6f92"
//! "##).unwrap();
//!
//! let theme = resolve(&[defaults, user], &KnownVariables::new()).unwrap();
//! let colors: Vec<&str> = theme.category("colors").map(|(path, _)| path).collect();
//! assert_eq!(colors, vec!["colors.love"]);
//! assert!(theme.get("spacing.1").is_some());
//! ```
//!
//! ## Validation
//!
//! References are checked after merging. A reference to a variable the build
//! never declares fails the whole resolution:
//!
//! ```rust
//! use tokenlayer::{resolve, KnownVariables, ResolveError, TokenDocument};
//!
//! let doc = TokenDocument::builder()
//!     .token("colors.ring", "hsl(var(--ring))")
//!     .build()
//!     .unwrap();
//!
//! let known = KnownVariables::from_css(":root { --border: 240 5% 26%; }").unwrap();
//! let err = resolve(&[doc.into()], &known).unwrap_err();
//! assert!(matches!(err, ResolveError::UnresolvedReference { .. }));
//! assert_eq!(err.path(), "colors.ring");
//! ```

mod error;
pub mod layer;
mod parser;
pub mod render;
pub mod theme;
pub mod token;
pub mod vars;

pub use error::{DocumentError, PathIssue, ResolveError, Result};
pub use layer::{MergeMode, ThemeLayer};
pub use render::ColorSpace;
pub use theme::{
    detect_color_mode, resolve, set_theme_detector, ColorMode, ResolvedTheme, Resolver,
};
pub use token::{DocumentBuilder, TokenDocument, TokenPath, TokenValue, ValueKind, VariableRef, Wrap};
pub use vars::{parse_css_variables, KnownVariables};
