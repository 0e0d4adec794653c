//! Map screen: active route traces and live buses on a braille canvas.

use std::cell::Cell;
use std::sync::Arc;

use chrono::Local;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Points};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use busmap_core::kml::{self, Bounds};
use busmap_core::map::{VehicleMarker, clock_label, route_layers, vehicle_count_label, vehicle_markers};
use busmap_core::{MapView, Route, RouteId, RouteTrace, Vehicle, VehicleId};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::viewport::{Viewport, points_extent};

/// One active route's trace, flattened for drawing.
struct TraceLayer {
    color: Color,
    paths: Vec<Vec<(f64, f64)>>,
    extent: Option<Bounds>,
}

pub struct MapScreen {
    focused: bool,
    routes: Arc<Vec<Arc<Route>>>,
    vehicles: Arc<Vec<Arc<Vehicle>>>,
    traces: Arc<Vec<Arc<RouteTrace>>>,
    markers: Vec<VehicleMarker>,
    layers: Vec<TraceLayer>,
    selected: Option<VehicleId>,
    viewport: Viewport,
    home: Viewport,
    /// Canvas size from the last render, for fitting.
    canvas_size: Cell<(u16, u16)>,
}

impl MapScreen {
    pub fn new(view: &MapView) -> Self {
        let home = Viewport::new(view.center, view.zoom);
        Self {
            focused: false,
            routes: Arc::new(Vec::new()),
            vehicles: Arc::new(Vec::new()),
            traces: Arc::new(Vec::new()),
            markers: Vec::new(),
            layers: Vec::new(),
            selected: None,
            viewport: home,
            home,
            canvas_size: Cell::new((0, 0)),
        }
    }

    /// Re-join vehicles to routes and pick the traces to draw. Only routes
    /// with a bus on them are drawn.
    fn rebuild(&mut self) {
        self.markers = vehicle_markers(self.vehicles.as_slice(), self.routes.as_slice());

        let mut active: Vec<RouteId> = Vec::new();
        for marker in &self.markers {
            if !active.contains(&marker.route_id) {
                active.push(marker.route_id);
            }
        }

        self.layers = route_layers(self.traces.as_slice(), &active)
            .iter()
            .map(|layer| TraceLayer {
                color: theme::route_color(&layer.color),
                paths: kml::line_strings(&layer.geojson),
                extent: kml::bounds(&layer.geojson),
            })
            .collect();

        let markers = &self.markers;
        if self
            .selected
            .is_some_and(|id| !markers.iter().any(|m| m.vehicle_id == id))
        {
            self.selected = None;
        }
    }

    fn selected_marker(&self) -> Option<&VehicleMarker> {
        let id = self.selected?;
        self.markers.iter().find(|m| m.vehicle_id == id)
    }

    /// Move the selection forward or back through the markers, wrapping.
    fn cycle_selection(&mut self, forward: bool) {
        let len = self.markers.len();
        if len == 0 {
            self.selected = None;
            return;
        }
        let current = self
            .selected
            .and_then(|id| self.markers.iter().position(|m| m.vehicle_id == id));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        self.selected = self.markers.get(next).map(|m| m.vehicle_id);
    }

    fn center_on_selected(&mut self) {
        if let Some(position) = self.selected_marker().map(|m| m.position) {
            self.viewport.center = position;
        }
    }

    /// Fit the view to the drawn traces, or to the buses when no trace has
    /// loaded yet.
    fn fit(&mut self) {
        let extent = self
            .layers
            .iter()
            .filter_map(|l| l.extent)
            .reduce(Bounds::union)
            .or_else(|| points_extent(self.markers.iter().map(|m| m.position)));
        if let Some(extent) = extent {
            let (w, h) = self.canvas_size.get();
            self.viewport.fit(extent, w, h);
        }
    }

    fn paint(&self, ctx: &mut Context<'_>) {
        for layer in &self.layers {
            for path in &layer.paths {
                for pair in path.windows(2) {
                    if let &[(x1, y1), (x2, y2)] = pair {
                        ctx.draw(&CanvasLine {
                            x1,
                            y1,
                            x2,
                            y2,
                            color: layer.color,
                        });
                    }
                }
            }
        }

        // Buses sit above the traces
        ctx.layer();

        let ring = self.viewport.half_lon_span() * 0.03;
        for marker in &self.markers {
            let (lat, lon) = marker.position;
            let color = theme::route_color(&marker.color);
            let is_selected = self.selected == Some(marker.vehicle_id);

            ctx.draw(&Points {
                coords: &[(lon, lat)],
                color,
            });
            if is_selected {
                ctx.draw(&Circle {
                    x: lon,
                    y: lat,
                    radius: ring,
                    color: theme::NEON_CYAN,
                });
            }

            let label_style = if is_selected {
                Style::default()
                    .fg(theme::BG_DARK)
                    .bg(theme::NEON_CYAN)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            };
            ctx.print(lon, lat, Span::styled(format!(" {}", marker.label), label_style));
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let count = Line::from(Span::styled(
            format!(" {}", vehicle_count_label(self.vehicles.len())),
            Style::default()
                .fg(theme::NEON_CYAN)
                .add_modifier(Modifier::BOLD),
        ));
        let clock = Line::from(vec![
            Span::styled("It's currently: ", Style::default().fg(theme::DIM_WHITE)),
            Span::styled(
                format!("{} ", clock_label(&Local::now())),
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ),
        ])
        .right_aligned();

        frame.render_widget(Paragraph::new(count), area);
        frame.render_widget(Paragraph::new(clock), area);
    }

    /// Popup for the selected bus, pinned to the top-right corner.
    fn render_popup(&self, frame: &mut Frame, area: Rect) {
        let Some(marker) = self.selected_marker() else {
            return;
        };
        let vehicle = self.vehicles.iter().find(|v| v.id == marker.vehicle_id);
        let schedule = vehicle.map(|v| (v.schedule_label(), v.deviation_minutes));

        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", marker.popup.title),
                Style::default()
                    .fg(theme::route_color(&marker.color))
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));

        let mut lines = vec![Line::from(Span::styled(
            format!(" {}", marker.popup.body),
            Style::default().fg(theme::DIM_WHITE),
        ))];
        if let Some((label, deviation)) = schedule {
            lines.push(Line::from(Span::styled(
                format!(" {label}"),
                Style::default().fg(theme::schedule_color(deviation)),
            )));
        }
        let (lat, lon) = marker.position;
        if !self.viewport.contains(lat, lon, area.width, area.height) {
            lines.push(Line::from(Span::styled(
                " off screen, c to center",
                theme::key_hint(),
            )));
        }

        let body_width = lines
            .iter()
            .map(Line::width)
            .max()
            .unwrap_or(0)
            .max(marker.popup.title.chars().count() + 2);
        let width = u16::try_from(body_width + 3)
            .unwrap_or(u16::MAX)
            .min(area.width);
        let height = u16::try_from(lines.len() + 2)
            .unwrap_or(u16::MAX)
            .min(area.height);
        let popup_area = Rect::new(area.right().saturating_sub(width), area.y, width, height);

        frame.render_widget(Clear, popup_area);
        frame.render_widget(Paragraph::new(lines).block(block), popup_area);
    }
}

impl Component for MapScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.viewport.pan(-1, 0),
            KeyCode::Right | KeyCode::Char('l') => self.viewport.pan(1, 0),
            KeyCode::Up | KeyCode::Char('k') => self.viewport.pan(0, 1),
            KeyCode::Down | KeyCode::Char('j') => self.viewport.pan(0, -1),
            KeyCode::Char('+' | '=') => self.viewport.zoom_in(),
            KeyCode::Char('-' | '_') => self.viewport.zoom_out(),
            KeyCode::Char('f') => self.fit(),
            KeyCode::Char('r') => self.viewport = self.home,
            KeyCode::Char('n') => self.cycle_selection(true),
            KeyCode::Char('N') => self.cycle_selection(false),
            KeyCode::Char('c') => self.center_on_selected(),
            KeyCode::Enter => {
                return Ok(self.selected.map(Action::OpenVehicleDetail));
            }
            KeyCode::Esc => {
                if self.selected.take().is_none() {
                    return Ok(Some(Action::GoBack));
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::RoutesUpdated(routes) => {
                self.routes = Arc::clone(routes);
                self.rebuild();
            }
            Action::VehiclesUpdated(vehicles) => {
                self.vehicles = Arc::clone(vehicles);
                self.rebuild();
            }
            Action::TracesUpdated(traces) => {
                self.traces = Arc::clone(traces);
                self.rebuild();
            }
            Action::ShowOnMap(id) => {
                if self.markers.iter().any(|m| m.vehicle_id == *id) {
                    self.selected = Some(*id);
                    self.center_on_selected();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            " Map  ·  {} active routes  ·  Zoom {:.0}% ",
            self.layers.len(),
            self.viewport.scale * 100.0
        );
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [header_area, canvas_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        self.canvas_size.set((canvas_area.width, canvas_area.height));
        let (x_bounds, y_bounds) = self.viewport.bounds(canvas_area.width, canvas_area.height);
        let canvas = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(|ctx| self.paint(ctx));
        frame.render_widget(canvas, canvas_area);

        self.render_header(frame, header_area);
        self.render_popup(frame, canvas_area);

        let hints = Line::from(vec![
            Span::styled("  ←→↑↓ ", theme::key_hint_key()),
            Span::styled("pan  ", theme::key_hint()),
            Span::styled("+/- ", theme::key_hint_key()),
            Span::styled("zoom  ", theme::key_hint()),
            Span::styled("f ", theme::key_hint_key()),
            Span::styled("fit  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("reset  ", theme::key_hint()),
            Span::styled("n/N ", theme::key_hint_key()),
            Span::styled("next bus  ", theme::key_hint()),
            Span::styled("c ", theme::key_hint_key()),
            Span::styled("center", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), hints_area);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{key, render_to_string, route, trace, vehicle};

    fn loaded() -> MapScreen {
        let mut screen = MapScreen::new(&MapView::default());
        let routes = Arc::new(vec![
            route(20030, "B43", "0C6CB4"),
            route(20031, "R29", "F4A000"),
        ]);
        let vehicles = Arc::new(vec![
            vehicle(3201, 20030, (42.37, -72.52), 0),
            vehicle(3202, 20030, (42.32, -72.63), 4),
            vehicle(9999, 55555, (42.30, -72.60), 0),
        ]);
        let traces = Arc::new(vec![trace(20030, "0C6CB4"), trace(20031, "F4A000")]);
        screen.update(&Action::RoutesUpdated(routes)).unwrap();
        screen.update(&Action::VehiclesUpdated(vehicles)).unwrap();
        screen.update(&Action::TracesUpdated(traces)).unwrap();
        screen
    }

    #[test]
    fn only_routes_with_buses_are_drawn() {
        let screen = loaded();
        // the bus on an unknown route has no marker
        assert_eq!(screen.markers.len(), 2);
        assert_eq!(screen.layers.len(), 1);
        assert_eq!(screen.layers[0].color, Color::Rgb(0x0C, 0x6C, 0xB4));
    }

    #[test]
    fn n_cycles_through_buses() {
        let mut screen = loaded();
        screen.handle_key_event(key('n')).unwrap();
        assert_eq!(screen.selected, Some(VehicleId(3201)));
        screen.handle_key_event(key('n')).unwrap();
        assert_eq!(screen.selected, Some(VehicleId(3202)));
        screen.handle_key_event(key('n')).unwrap();
        assert_eq!(screen.selected, Some(VehicleId(3201)));
        screen.handle_key_event(key('N')).unwrap();
        assert_eq!(screen.selected, Some(VehicleId(3202)));
    }

    #[test]
    fn selection_drops_when_bus_leaves() {
        let mut screen = loaded();
        screen.update(&Action::ShowOnMap(VehicleId(3202))).unwrap();
        assert_eq!(screen.selected, Some(VehicleId(3202)));
        assert_eq!(screen.viewport.center, (42.32, -72.63));

        let remaining = Arc::new(vec![vehicle(3201, 20030, (42.37, -72.52), 0)]);
        screen.update(&Action::VehiclesUpdated(remaining)).unwrap();
        assert_eq!(screen.selected, None);
    }

    #[test]
    fn reset_restores_configured_view() {
        let mut screen = loaded();
        screen.handle_key_event(key('+')).unwrap();
        screen.handle_key_event(key('l')).unwrap();
        assert_ne!(screen.viewport, screen.home);
        screen.handle_key_event(key('r')).unwrap();
        assert_eq!(screen.viewport, screen.home);
    }

    #[test]
    fn fit_centers_on_traces() {
        let mut screen = loaded();
        screen.canvas_size.set((100, 30));
        screen.handle_key_event(key('f')).unwrap();
        let extent = screen.layers[0].extent.unwrap();
        assert_eq!(screen.viewport.center, extent.center());
    }

    #[test]
    fn renders_header_and_popup() {
        let mut screen = loaded();
        screen.handle_key_event(key('n')).unwrap();
        let text = render_to_string(&screen, 120, 30);
        assert!(text.contains("3 vehicles"), "{text}");
        assert!(text.contains("It's currently:"));
        assert!(text.contains("Route B43"));
        assert!(text.contains("Destination: UMass (N)"));
    }

    #[test]
    fn esc_clears_selection_before_going_back() {
        let mut screen = loaded();
        screen.handle_key_event(key('n')).unwrap();
        let first = screen
            .handle_key_event(KeyEvent::from(KeyCode::Esc))
            .unwrap();
        assert!(first.is_none());
        assert_eq!(screen.selected, None);
        let second = screen
            .handle_key_event(KeyEvent::from(KeyCode::Esc))
            .unwrap();
        assert!(matches!(second, Some(Action::GoBack)));
    }
}
