//! The token data model: paths, values and documents.
//!
//! - [`TokenPath`]: validated dotted path (`colors.primary.DEFAULT`)
//! - [`TokenValue`]: literal, variable reference, or group of tokens
//! - [`TokenDocument`]: one source's tokens as a tree of categories

mod document;
mod path;
mod value;

pub use document::{DocumentBuilder, TokenDocument};
pub use path::TokenPath;
pub use value::{TokenValue, ValueKind, VariableRef, Wrap, COLOR_FUNCTIONS};
