//! Route color chips.

use ratatui::style::Style;
use ratatui::text::Span;

use busmap_core::Route;

use crate::theme;

/// A two-cell block in the route's color.
pub fn route_swatch(route: &Route) -> Span<'static> {
    Span::styled("██", Style::default().fg(theme::route_color(&route.color)))
}

/// The route label drawn on its own color with its text color, like the
/// badges on the web map.
pub fn route_badge(route: &Route) -> Span<'static> {
    Span::styled(
        format!(" {} ", route.label()),
        Style::default()
            .bg(theme::route_color(&route.color))
            .fg(theme::route_color(&route.text_color)),
    )
}
