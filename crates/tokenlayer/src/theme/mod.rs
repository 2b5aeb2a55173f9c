//! Theme resolution.
//!
//! A theme is resolved from an ordered stack of [`ThemeLayer`](crate::ThemeLayer)s:
//! the framework defaults first, the user configuration last. Each layer is
//! applied category by category, extending or replacing what came before, and
//! the merged tree is flattened into a [`ResolvedTheme`].
//!
//! After merging, every variable reference in the result is checked against
//! the [`KnownVariables`](crate::KnownVariables) the build declares. A theme
//! either resolves completely or not at all.
//!
//! ## Color modes
//!
//! Layers can be scoped to [`ColorMode::Light`] or [`ColorMode::Dark`]. A
//! [`Resolver`] built with [`Resolver::with_mode`] applies unscoped layers plus
//! the layers for that mode. Without a mode, only unscoped layers apply and
//! references must be declared for both modes.

mod adaptive;
mod resolved;
mod resolver;

pub use adaptive::{detect_color_mode, set_theme_detector, ColorMode};
pub use resolved::ResolvedTheme;
pub use resolver::{resolve, Resolver};
