// ── Route colors ──

use std::fmt;

use serde::{Deserialize, Serialize};

/// A six-digit RGB hex color, stored uppercase without the leading `#`.
///
/// InfoPoint sends route colors as `"0C6CB4"`, occasionally lowercase or
/// blank. Anything unparseable becomes [`HexColor::FALLBACK`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Neutral gray for routes without a usable color.
    pub const FALLBACK: &'static str = "808080";

    /// Normalize a raw color (`"FF0000"`, `"#ff0000"`, `"f00"`).
    pub fn parse(raw: &str) -> Option<Self> {
        let hex = raw.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded = match hex.len() {
            6 => hex.to_ascii_uppercase(),
            3 => hex
                .chars()
                .flat_map(|c| [c, c])
                .collect::<String>()
                .to_ascii_uppercase(),
            _ => return None,
        };
        Some(Self(expanded))
    }

    pub fn fallback() -> Self {
        Self(Self::FALLBACK.to_owned())
    }

    /// Uppercase hex without `#`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `#RRGGBB` for CSS, SVG, and GeoJSON style properties.
    pub fn css(&self) -> String {
        format!("#{}", self.0)
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        let channel = |i: usize| {
            self.0
                .get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .unwrap_or(0x80)
        };
        (channel(0), channel(2), channel(4))
    }
}

impl Default for HexColor {
    fn default() -> Self {
        Self::fallback()
    }
}

impl From<String> for HexColor {
    fn from(raw: String) -> Self {
        Self::parse(&raw).unwrap_or_default()
    }
}

impl From<Option<&str>> for HexColor {
    fn from(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or_default()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
