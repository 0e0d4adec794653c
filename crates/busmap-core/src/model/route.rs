// ── Route domain type ──

use serde::{Deserialize, Serialize};

use super::color::HexColor;
use super::ids::{MessageId, RouteId, StopId};

/// One direction a route runs in (e.g. `"Inbound"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direction {
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    /// Public route code shown on buses (e.g. `"B43"`).
    pub abbreviation: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub color: HexColor,
    pub text_color: HexColor,
    pub group: Option<String>,
    pub is_visible: bool,
    pub sort_order: i32,
    pub trace_filename: Option<String>,
    /// Changes whenever the trace file content changes.
    pub trace_hash: Option<String>,
    pub directions: Vec<Direction>,
    pub stop_ids: Vec<StopId>,
    /// Vehicles embedded in the route details response at fetch time.
    pub embedded_vehicle_count: usize,
    pub alert_ids: Vec<MessageId>,
}

impl Route {
    /// Abbreviation, else short name, else the numeric id.
    pub fn label(&self) -> String {
        [&self.abbreviation, &self.short_name]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map_or_else(|| self.id.to_string(), str::to_owned)
    }

    /// True if `needle` names this route by abbreviation, short name, or id.
    pub fn matches_label(&self, needle: &str) -> bool {
        let needle = needle.trim();
        [&self.abbreviation, &self.short_name]
            .into_iter()
            .flatten()
            .any(|s| s.trim().eq_ignore_ascii_case(needle))
            || self.id.to_string() == needle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(abbr: Option<&str>, short: Option<&str>) -> Route {
        Route {
            id: RouteId(20030),
            abbreviation: abbr.map(str::to_owned),
            short_name: short.map(str::to_owned),
            long_name: None,
            color: HexColor::default(),
            text_color: HexColor::default(),
            group: None,
            is_visible: true,
            sort_order: 0,
            trace_filename: None,
            trace_hash: None,
            directions: Vec::new(),
            stop_ids: Vec::new(),
            embedded_vehicle_count: 0,
            alert_ids: Vec::new(),
        }
    }

    #[test]
    fn label_prefers_abbreviation() {
        assert_eq!(route(Some("B43"), Some("43")).label(), "B43");
        assert_eq!(route(Some(" "), Some("43")).label(), "43");
        assert_eq!(route(None, None).label(), "20030");
    }

    #[test]
    fn matches_label_case_insensitively() {
        let r = route(Some("B43"), Some("Amherst"));
        assert!(r.matches_label("b43"));
        assert!(r.matches_label("AMHERST"));
        assert!(r.matches_label("20030"));
        assert!(!r.matches_label("R29"));
    }
}
