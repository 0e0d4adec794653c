// ── Status text ──

use std::fmt;

use chrono::{DateTime, TimeZone};

use crate::store::LoadPhase;

/// Headline shown above the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine {
    /// No vehicle poll has completed yet.
    Initializing,
    /// Vehicles are live; only routes with buses are drawn.
    ActiveRoutesOnly,
}

impl StatusLine {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "Initializing...",
            Self::ActiveRoutesOnly => "Only showing active routes",
        }
    }
}

impl From<LoadPhase> for StatusLine {
    fn from(phase: LoadPhase) -> Self {
        match phase {
            LoadPhase::Initializing => Self::Initializing,
            LoadPhase::Live => Self::ActiveRoutesOnly,
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn vehicle_count_label(n: usize) -> String {
    format!("{n} vehicles")
}

/// 12-hour wall clock without a leading zero (`"3:07 PM"`).
pub fn clock_label<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    now.format("%-I:%M %p").to_string()
}
