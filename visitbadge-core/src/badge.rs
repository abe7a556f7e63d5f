//! Badge rendering options.

use serde::{Deserialize, Serialize};

/// Default right-hand colour.
pub const DEFAULT_COLOUR: &str = "blue";
/// Default left-hand (label) colour.
pub const DEFAULT_LABEL_COLOUR: &str = "grey";
/// Default shields style.
pub const DEFAULT_STYLE: &str = "flat";
/// Default label text.
pub const DEFAULT_LABEL: &str = "Visitors";
/// Default logo (none).
pub const DEFAULT_LOGO: &str = "";
/// Default logo colour.
pub const DEFAULT_LOGO_COLOUR: &str = "white";

/// Everything the renderer needs to draw one badge.
///
/// `text` is empty until the count has been resolved; [`BadgeOptions::with_text`]
/// produces the final value handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeOptions {
    /// Left-hand text.
    pub label: String,
    /// Right-hand text, normally the rendered count.
    pub text: String,
    /// Right-hand colour.
    pub colour: String,
    /// Left-hand colour.
    pub label_colour: String,
    /// Shields style (`flat`, `flat-square`, `plastic`, ...).
    pub style: String,
    /// Simple-icons logo identifier.
    pub logo: String,
    /// Logo colour.
    pub logo_colour: String,
    /// Whether the request increments the counter or only reads it.
    pub hit: bool,
}

impl Default for BadgeOptions {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_owned(),
            text: String::new(),
            colour: DEFAULT_COLOUR.to_owned(),
            label_colour: DEFAULT_LABEL_COLOUR.to_owned(),
            style: DEFAULT_STYLE.to_owned(),
            logo: DEFAULT_LOGO.to_owned(),
            logo_colour: DEFAULT_LOGO_COLOUR.to_owned(),
            hit: true,
        }
    }
}

impl BadgeOptions {
    /// Returns a copy with `text` replaced.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BadgeOptions::default();
        assert_eq!(options.colour, "blue");
        assert_eq!(options.label_colour, "grey");
        assert_eq!(options.style, "flat");
        assert_eq!(options.label, "Visitors");
        assert_eq!(options.logo, "");
        assert_eq!(options.logo_colour, "white");
        assert!(options.hit);
    }

    #[test]
    fn test_with_text() {
        let options = BadgeOptions::default().with_text("42");
        assert_eq!(options.text, "42");
        assert_eq!(options.label, "Visitors");
    }
}
