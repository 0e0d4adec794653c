//! Vehicles screen: every bus in the latest poll, sortable, with a detail
//! panel for the selected one.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Local;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use busmap_core::{Route, RouteId, Vehicle, VehicleId};

use crate::action::{Action, VehicleSort};
use crate::component::Component;
use crate::theme;
use crate::widgets::swatch;

pub struct VehiclesScreen {
    focused: bool,
    routes: HashMap<RouteId, Arc<Route>>,
    vehicles: Arc<Vec<Arc<Vehicle>>>,
    /// `vehicles` in display order.
    rows: Vec<Arc<Vehicle>>,
    sort: VehicleSort,
    table_state: TableState,
    detail: Option<VehicleId>,
}

impl VehiclesScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            routes: HashMap::new(),
            vehicles: Arc::new(Vec::new()),
            rows: Vec::new(),
            sort: VehicleSort::default(),
            table_state: TableState::default().with_selected(Some(0)),
            detail: None,
        }
    }

    fn route_label(&self, vehicle: &Vehicle) -> String {
        self.routes
            .get(&vehicle.route_id)
            .map_or_else(|| "?".to_owned(), |r| r.label())
    }

    /// Re-sort rows, keeping the selected bus selected when it is still
    /// in the poll.
    fn recompute_rows(&mut self) {
        let keep = self.selected_vehicle().map(|v| v.id);

        let mut rows: Vec<Arc<Vehicle>> = self.vehicles.iter().cloned().collect();
        match self.sort {
            VehicleSort::Route => rows.sort_by_cached_key(|v| {
                let order = self.routes.get(&v.route_id).map_or(i32::MAX, |r| r.sort_order);
                (order, self.route_label(v), v.name.clone())
            }),
            VehicleSort::Name => rows.sort_by(|a, b| a.name.cmp(&b.name)),
            VehicleSort::Destination => rows.sort_by(|a, b| a.destination.cmp(&b.destination)),
            // Latest first
            VehicleSort::Schedule => {
                rows.sort_by_key(|v| std::cmp::Reverse(v.deviation_minutes.unwrap_or(0)));
            }
            VehicleSort::Updated => rows.sort_by_key(|v| std::cmp::Reverse(v.last_updated)),
        }
        self.rows = rows;

        if self.detail.is_some_and(|id| !self.rows.iter().any(|v| v.id == id)) {
            self.detail = None;
        }
        let index = keep
            .and_then(|id| self.rows.iter().position(|v| v.id == id))
            .unwrap_or_else(|| self.selected_index());
        self.select(index);
    }

    fn selected_index(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn selected_vehicle(&self) -> Option<&Arc<Vehicle>> {
        self.rows.get(self.selected_index())
    }

    fn select(&mut self, index: usize) {
        let clamped = index.min(self.rows.len().saturating_sub(1));
        self.table_state.select(Some(clamped));
    }

    fn move_down(&mut self) {
        self.select(self.selected_index().saturating_add(1));
    }

    fn move_up(&mut self) {
        self.select(self.selected_index().saturating_sub(1));
    }

    fn sort_header(&self, sort: VehicleSort, label: &'static str) -> Cell<'static> {
        if self.sort == sort {
            Cell::from(format!("{label} ▾")).style(
                Style::default()
                    .fg(theme::ELECTRIC_PURPLE)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )
        } else {
            Cell::from(label).style(theme::table_header())
        }
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect, vehicle: &Vehicle) {
        let route = self.routes.get(&vehicle.route_id);
        let title = format!(
            " Bus {}  ·  Route {}  ·  {} ",
            vehicle.name,
            self.route_label(vehicle),
            vehicle.destination.as_deref().unwrap_or("─"),
        );
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let label = |s: &'static str| Span::styled(format!("  {s:<12}"), theme::key_hint());
        let value = |s: String| Span::styled(s, Style::default().fg(theme::DIM_WHITE));
        let dash = || "─".to_owned();

        let speed = vehicle.speed.map_or_else(dash, |mph| format!("{mph:.0} mph"));
        let heading = vehicle.heading.map_or_else(dash, |deg| format!("{deg}°"));
        let load = match (vehicle.on_board, vehicle.total_capacity) {
            (Some(on), Some(total)) => format!("{on} / {total}"),
            (Some(on), None) => on.to_string(),
            _ => dash(),
        };
        let seats = vehicle.seating_capacity.map_or_else(dash, |s| s.to_string());
        let (lat, lon) = vehicle.position();
        let run = vehicle.run_id.map_or_else(dash, |r| r.to_string());
        let trip = vehicle.trip_id.map_or_else(dash, |t| t.to_string());

        let mut lines = vec![
            Line::from(vec![
                label("Schedule"),
                Span::styled(
                    vehicle.schedule_label(),
                    Style::default().fg(theme::schedule_color(vehicle.deviation_minutes)),
                ),
            ]),
            Line::from(vec![
                label("Direction"),
                value(
                    vehicle
                        .direction_long
                        .clone()
                        .unwrap_or_else(|| vehicle.direction_label().to_owned()),
                ),
            ]),
            Line::from(vec![label("Speed"), value(speed), label("Heading"), value(heading)]),
            Line::from(vec![
                label("Last stop"),
                value(vehicle.last_stop.clone().unwrap_or_else(dash)),
            ]),
            Line::from(vec![label("On board"), value(load), label("Seats"), value(seats)]),
            Line::from(vec![
                label("Occupancy"),
                value(vehicle.occupancy.clone().unwrap_or_else(dash)),
            ]),
            Line::from(vec![label("Position"), value(format!("{lat:.5}, {lon:.5}"))]),
            Line::from(vec![label("Run"), value(run), label("Trip"), value(trip)]),
        ];
        if let Some(route) = route {
            lines.insert(
                0,
                Line::from(vec![
                    label("Route"),
                    swatch::route_badge(route),
                    Span::raw(" "),
                    value(route.long_name.clone().unwrap_or_default()),
                ]),
            );
        }

        let [body, hints_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
        frame.render_widget(Paragraph::new(lines), body);

        let hints = Line::from(vec![
            Span::styled("  m ", theme::key_hint_key()),
            Span::styled("show on map  ", theme::key_hint()),
            Span::styled("Esc ", theme::key_hint_key()),
            Span::styled("back", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), hints_area);
    }
}

impl Component for VehiclesScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let selected = self.selected_vehicle().map(|v| v.id);
        match key.code {
            KeyCode::Esc => {
                if self.detail.take().is_some() {
                    return Ok(Some(Action::CloseDetail));
                }
                return Ok(Some(Action::GoBack));
            }
            KeyCode::Char('m') => return Ok(selected.map(Action::ShowOnMap)),
            KeyCode::Enter => {
                if let Some(id) = selected {
                    self.detail = Some(id);
                    return Ok(Some(Action::OpenVehicleDetail(id)));
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),
            KeyCode::Char('g') | KeyCode::Home => self.select(0),
            KeyCode::Char('G') | KeyCode::End => self.select(usize::MAX),
            KeyCode::Char('s') => {
                self.sort = self.sort.next();
                self.recompute_rows();
                return Ok(Some(Action::SortVehicles(self.sort)));
            }
            _ => {}
        }
        // Detail follows the cursor while open
        if self.detail.is_some() {
            self.detail = self.selected_vehicle().map(|v| v.id);
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::RoutesUpdated(routes) => {
                self.routes = routes.iter().map(|r| (r.id, Arc::clone(r))).collect();
                self.recompute_rows();
            }
            Action::VehiclesUpdated(vehicles) => {
                self.vehicles = Arc::clone(vehicles);
                self.recompute_rows();
            }
            Action::OpenVehicleDetail(id) => {
                if let Some(index) = self.rows.iter().position(|v| v.id == *id) {
                    self.select(index);
                    self.detail = Some(*id);
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" Vehicles ({}) ", self.rows.len());
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

        let detail = self
            .detail
            .and_then(|id| self.rows.iter().find(|v| v.id == id));
        let (list_area, detail_area) = if detail.is_some() {
            let [top, bottom] =
                Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)])
                    .areas(inner);
            (top, Some(bottom))
        } else {
            (inner, None)
        };

        let [table_area, hints_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(list_area);

        let header = Row::new(vec![
            self.sort_header(VehicleSort::Route, "Route"),
            self.sort_header(VehicleSort::Name, "Bus"),
            self.sort_header(VehicleSort::Destination, "Destination"),
            Cell::from("Dir").style(theme::table_header()),
            self.sort_header(VehicleSort::Schedule, "Schedule"),
            Cell::from("Occupancy").style(theme::table_header()),
            self.sort_header(VehicleSort::Updated, "Updated"),
        ]);

        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|v| {
                let route = self.routes.get(&v.route_id).map_or_else(
                    || Cell::from("?").style(Style::default().fg(theme::ERROR_RED)),
                    |r| Cell::from(swatch::route_badge(r)),
                );
                let updated = v.last_updated.map_or_else(
                    || "─".to_owned(),
                    |t| t.with_timezone(&Local).format("%-I:%M:%S %p").to_string(),
                );
                Row::new(vec![
                    route,
                    Cell::from(v.name.clone()),
                    Cell::from(v.destination.clone().unwrap_or_else(|| "─".into())),
                    Cell::from(v.direction_label().to_owned()),
                    Cell::from(v.schedule_label())
                        .style(Style::default().fg(theme::schedule_color(v.deviation_minutes))),
                    Cell::from(v.occupancy.clone().unwrap_or_else(|| "─".into())),
                    Cell::from(updated),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Fill(2),
            Constraint::Length(4),
            Constraint::Length(14),
            Constraint::Fill(1),
            Constraint::Length(12),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected())
            .highlight_symbol("▸ ");

        let mut state = self.table_state;
        frame.render_stateful_widget(table, table_area, &mut state);

        let hints = Line::from(vec![
            Span::styled("  j/k ", theme::key_hint_key()),
            Span::styled("navigate  ", theme::key_hint()),
            Span::styled("s ", theme::key_hint_key()),
            Span::styled("sort  ", theme::key_hint()),
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled("detail  ", theme::key_hint()),
            Span::styled("m ", theme::key_hint_key()),
            Span::styled("show on map", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), hints_area);

        if let (Some(area), Some(vehicle)) = (detail_area, detail) {
            self.render_detail(frame, area, vehicle);
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{key, render_to_string, route, vehicle};
    use pretty_assertions::assert_eq;

    fn loaded() -> VehiclesScreen {
        let mut screen = VehiclesScreen::new();
        let routes = Arc::new(vec![route(20030, "B43", "0C6CB4"), route(20031, "R29", "F4A000")]);
        let vehicles = Arc::new(vec![
            vehicle(3305, 20031, (42.10, -72.59), 7),
            vehicle(3201, 20030, (42.37, -72.52), 0),
            vehicle(3202, 20030, (42.32, -72.63), -2),
        ]);
        screen.update(&Action::RoutesUpdated(routes)).unwrap();
        screen.update(&Action::VehiclesUpdated(vehicles)).unwrap();
        screen
    }

    fn names(screen: &VehiclesScreen) -> Vec<&str> {
        screen.rows.iter().map(|v| v.name.as_str()).collect()
    }

    #[test]
    fn default_sort_groups_by_route() {
        let screen = loaded();
        assert_eq!(names(&screen), ["3201", "3202", "3305"]);
    }

    #[test]
    fn schedule_sort_puts_latest_first() {
        let mut screen = loaded();
        let mut last = None;
        while screen.sort != VehicleSort::Schedule {
            last = screen.handle_key_event(key('s')).unwrap();
        }
        assert!(matches!(last, Some(Action::SortVehicles(VehicleSort::Schedule))));
        assert_eq!(names(&screen), ["3305", "3201", "3202"]);
    }

    #[test]
    fn selection_survives_resort() {
        let mut screen = loaded();
        screen.handle_key_event(key('G')).unwrap();
        assert_eq!(screen.selected_vehicle().unwrap().name, "3305");
        screen.handle_key_event(key('s')).unwrap();
        assert_eq!(screen.selected_vehicle().unwrap().name, "3305");
    }

    #[test]
    fn enter_opens_detail_and_esc_closes_it() {
        let mut screen = loaded();
        let opened = screen.handle_key_event(KeyEvent::from(KeyCode::Enter)).unwrap();
        assert!(matches!(opened, Some(Action::OpenVehicleDetail(VehicleId(3201)))));

        let text = render_to_string(&screen, 120, 40);
        assert!(text.contains("Bus 3201"), "{text}");
        assert!(text.contains("Haigis Mall"));
        assert!(text.contains("4 / 57"));

        let closed = screen.handle_key_event(KeyEvent::from(KeyCode::Esc)).unwrap();
        assert!(matches!(closed, Some(Action::CloseDetail)));
        let back = screen.handle_key_event(KeyEvent::from(KeyCode::Esc)).unwrap();
        assert!(matches!(back, Some(Action::GoBack)));
    }

    #[test]
    fn m_shows_selected_on_map() {
        let mut screen = loaded();
        screen.handle_key_event(key('j')).unwrap();
        let action = screen.handle_key_event(key('m')).unwrap();
        assert!(matches!(action, Some(Action::ShowOnMap(VehicleId(3202)))));
    }

    #[test]
    fn unknown_route_renders_placeholder() {
        let mut screen = loaded();
        let vehicles = Arc::new(vec![vehicle(4000, 99999, (42.0, -72.0), 0)]);
        screen.update(&Action::VehiclesUpdated(vehicles)).unwrap();
        let text = render_to_string(&screen, 120, 10);
        assert!(text.contains("Vehicles (1)"));
        assert!(text.contains('?'));
    }
}
