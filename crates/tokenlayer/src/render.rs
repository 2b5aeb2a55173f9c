//! Rendering resolved tokens to CSS value strings.
//!
//! The same token set can target different palette conventions. A project that
//! stores HSL channels in its custom properties renders color references as
//! `hsl(var(--x))`; one that stores OKLCH components renders `oklch(var(--x))`.
//! The choice is made here, once, instead of in each theme document.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Color function used when rendering color-wrapped variable references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// `hsl(var(--x))`
    #[default]
    Hsl,
    /// `oklch(var(--x))`
    Oklch,
    /// `rgb(var(--x))`
    Rgb,
    /// `var(--x)`, for custom properties that hold complete colors.
    None,
}

impl ColorSpace {
    /// Returns the CSS function name, or `None` for unwrapped output.
    pub fn function(self) -> Option<&'static str> {
        match self {
            ColorSpace::Hsl => Some("hsl"),
            ColorSpace::Oklch => Some("oklch"),
            ColorSpace::Rgb => Some("rgb"),
            ColorSpace::None => None,
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.function().unwrap_or("none"))
    }
}

impl FromStr for ColorSpace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hsl" => Ok(ColorSpace::Hsl),
            "oklch" => Ok(ColorSpace::Oklch),
            "rgb" => Ok(ColorSpace::Rgb),
            "none" => Ok(ColorSpace::None),
            other => Err(format!(
                "unknown color space '{}' (expected hsl, oklch, rgb or none)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_hsl() {
        assert_eq!(ColorSpace::default(), ColorSpace::Hsl);
    }

    #[test]
    fn test_from_str_roundtrips_display() {
        for space in [
            ColorSpace::Hsl,
            ColorSpace::Oklch,
            ColorSpace::Rgb,
            ColorSpace::None,
        ] {
            assert_eq!(space.to_string().parse::<ColorSpace>(), Ok(space));
        }
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("OKLCH".parse::<ColorSpace>(), Ok(ColorSpace::Oklch));
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "lab".parse::<ColorSpace>().unwrap_err();
        assert!(err.contains("lab"));
    }
}
