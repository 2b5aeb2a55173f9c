//! Color modes and OS color-mode detection.
//!
//! Resolution itself never looks at the OS: callers pass a mode to
//! [`Resolver::with_mode`](crate::Resolver::with_mode), or none at all. This
//! module offers [`detect_color_mode`] for callers that want to follow the
//! user's system setting, and [`set_theme_detector`] to pin it in tests.
//!
//! ```rust
//! use tokenlayer::{set_theme_detector, detect_color_mode, ColorMode};
//!
//! set_theme_detector(|| ColorMode::Dark);
//! assert_eq!(detect_color_mode(), ColorMode::Dark);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use dark_light::Mode as OsThemeMode;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Light or dark color mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Light background, dark text.
    Light,
    /// Dark background, light text.
    Dark,
}

impl ColorMode {
    /// Both modes, in a fixed order.
    pub const ALL: [ColorMode; 2] = [ColorMode::Light, ColorMode::Dark];

    pub fn as_str(self) -> &'static str {
        match self {
            ColorMode::Light => "light",
            ColorMode::Dark => "dark",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColorMode {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ColorMode::Light),
            "dark" => Ok(ColorMode::Dark),
            _ => Err(DocumentError::InvalidColorMode(s.to_string())),
        }
    }
}

type ThemeDetector = fn() -> ColorMode;

static THEME_DETECTOR: Lazy<Mutex<ThemeDetector>> = Lazy::new(|| Mutex::new(os_theme_detector));

/// Overrides the detector used by [`detect_color_mode`].
///
/// Useful in tests, or to force a mode regardless of the OS setting.
pub fn set_theme_detector(detector: ThemeDetector) {
    let mut guard = THEME_DETECTOR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = detector;
}

/// Detects the user's preferred color mode.
///
/// Uses the `dark-light` crate unless overridden with [`set_theme_detector`].
/// When the OS does not report a preference, light mode is assumed.
pub fn detect_color_mode() -> ColorMode {
    let detector = THEME_DETECTOR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    (*detector)()
}

fn os_theme_detector() -> ColorMode {
    match dark_light::detect() {
        Ok(OsThemeMode::Dark) => ColorMode::Dark,
        Ok(_) | Err(_) => ColorMode::Light,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_color_mode() {
        assert_eq!("light".parse::<ColorMode>(), Ok(ColorMode::Light));
        assert_eq!(" Dark ".parse::<ColorMode>(), Ok(ColorMode::Dark));
        assert_eq!(
            "dim".parse::<ColorMode>(),
            Err(DocumentError::InvalidColorMode("dim".into()))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ColorMode::Light.to_string(), "light");
        assert_eq!(ColorMode::Dark.to_string(), "dark");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ColorMode::Dark).unwrap();
        assert_eq!(json, "\"dark\"");
    }

    #[test]
    #[serial]
    fn test_detector_override() {
        set_theme_detector(|| ColorMode::Dark);
        assert_eq!(detect_color_mode(), ColorMode::Dark);

        set_theme_detector(|| ColorMode::Light);
        assert_eq!(detect_color_mode(), ColorMode::Light);
    }
}
