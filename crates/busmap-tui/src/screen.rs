//! Screen identifiers for the tab bar.

use std::fmt;

/// Each primary screen, navigable by number keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Map, // 1
    Vehicles, // 2
    Routes,   // 3
    Alerts,   // 4
}

impl ScreenId {
    /// Tab-bar order.
    pub const ALL: [ScreenId; 4] = [Self::Map, Self::Vehicles, Self::Routes, Self::Alerts];

    pub fn number(self) -> u8 {
        match self {
            Self::Map => 1,
            Self::Vehicles => 2,
            Self::Routes => 3,
            Self::Alerts => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == n)
    }

    /// Next screen in tab order (wraps around).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous screen in tab order (wraps around).
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Map => "Map",
            Self::Vehicles => "Vehicles",
            Self::Routes => "Routes",
            Self::Alerts => "Alerts",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
