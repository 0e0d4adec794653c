//! Routes screen: every published route with its color, live bus count and
//! alert count.

use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use busmap_core::{Route, RouteId};

use crate::action::{Action, RouteFilter};
use crate::component::Component;
use crate::theme;
use crate::widgets::{sub_tabs, swatch};

pub struct RoutesScreen {
    focused: bool,
    routes: Arc<Vec<Arc<Route>>>,
    vehicle_counts: HashMap<RouteId, usize>,
    alert_counts: HashMap<RouteId, usize>,
    traced: Vec<RouteId>,
    filter: RouteFilter,
    rows: Vec<Arc<Route>>,
    table_state: TableState,
}

impl RoutesScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            routes: Arc::new(Vec::new()),
            vehicle_counts: HashMap::new(),
            alert_counts: HashMap::new(),
            traced: Vec::new(),
            filter: RouteFilter::default(),
            rows: Vec::new(),
            table_state: TableState::default().with_selected(Some(0)),
        }
    }

    fn vehicle_count(&self, id: RouteId) -> usize {
        self.vehicle_counts.get(&id).copied().unwrap_or(0)
    }

    fn recompute_rows(&mut self) {
        let mut rows: Vec<Arc<Route>> = self
            .routes
            .iter()
            .filter(|r| match self.filter {
                RouteFilter::All => true,
                RouteFilter::Active => self.vehicle_count(r.id) > 0,
            })
            .cloned()
            .collect();
        rows.sort_by_cached_key(|r| (r.sort_order, r.label()));
        self.rows = rows;

        let clamped = self
            .table_state
            .selected()
            .unwrap_or(0)
            .min(self.rows.len().saturating_sub(1));
        self.table_state.select(Some(clamped));
    }

    fn move_selection(&mut self, down: bool) {
        let current = self.table_state.selected().unwrap_or(0);
        let next = if down {
            current.saturating_add(1).min(self.rows.len().saturating_sub(1))
        } else {
            current.saturating_sub(1)
        };
        self.table_state.select(Some(next));
    }
}

impl Component for RoutesScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(false),
            KeyCode::Char('f') => {
                self.filter = self.filter.toggled();
                self.recompute_rows();
                return Ok(Some(Action::FilterRoutes(self.filter)));
            }
            KeyCode::Esc => return Ok(Some(Action::GoBack)),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::RoutesUpdated(routes) => {
                self.routes = Arc::clone(routes);
                self.recompute_rows();
            }
            Action::VehiclesUpdated(vehicles) => {
                self.vehicle_counts = count_by_route(vehicles.iter().map(|v| v.route_id));
                self.recompute_rows();
            }
            Action::AlertsUpdated(alerts) => {
                self.alert_counts =
                    count_by_route(alerts.iter().flat_map(|a| a.route_ids.iter().copied()));
            }
            Action::TracesUpdated(traces) => {
                self.traced = traces.iter().map(|t| t.route_id).collect();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let active = self.vehicle_counts.values().filter(|n| **n > 0).count();
        let title = format!(" Routes ({} shown, {active} active) ", self.rows.len());
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

        let [tabs_area, table_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let tabs = sub_tabs::render_sub_tabs(&RouteFilter::LABELS, self.filter.index());
        frame.render_widget(Paragraph::new(tabs), tabs_area);

        let header = Row::new(
            ["", "Route", "Name", "Buses", "Alerts", "Trace"]
                .map(|h| Cell::from(h).style(theme::table_header())),
        );

        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|r| {
                let buses = self.vehicle_count(r.id);
                let alerts = self.alert_counts.get(&r.id).copied().unwrap_or(0);
                let bus_style = if buses > 0 {
                    Style::default().fg(theme::SUCCESS_GREEN)
                } else {
                    theme::table_row()
                };
                let alert_style = if alerts > 0 {
                    Style::default().fg(theme::CORAL)
                } else {
                    theme::table_row()
                };
                let trace = if self.traced.contains(&r.id) { "●" } else { "" };
                Row::new(vec![
                    Cell::from(swatch::route_swatch(r)),
                    Cell::from(r.label()),
                    Cell::from(r.long_name.clone().unwrap_or_default()),
                    Cell::from(buses.to_string()).style(bus_style),
                    Cell::from(alerts.to_string()).style(alert_style),
                    Cell::from(trace).style(Style::default().fg(theme::NEON_CYAN)),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Length(2),
            Constraint::Length(8),
            Constraint::Fill(1),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(6),
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
            Span::styled("f ", theme::key_hint_key()),
            Span::styled("all/active", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), hints_area);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

fn count_by_route(ids: impl Iterator<Item = RouteId>) -> HashMap<RouteId, usize> {
    let mut counts = HashMap::new();
    for id in ids {
        *counts.entry(id).or_insert(0) += 1;
    }
    counts
}
