//! Alerts screen: published service messages, most urgent first.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState, Wrap,
};

use busmap_core::{RouteId, ServiceAlert};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

pub struct AlertsScreen {
    focused: bool,
    alerts: Vec<Arc<ServiceAlert>>,
    route_labels: HashMap<RouteId, String>,
    table_state: TableState,
}

impl AlertsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            alerts: Vec::new(),
            route_labels: HashMap::new(),
            table_state: TableState::default().with_selected(Some(0)),
        }
    }

    fn selected(&self) -> Option<&Arc<ServiceAlert>> {
        self.alerts.get(self.table_state.selected().unwrap_or(0))
    }

    fn routes_text(&self, alert: &ServiceAlert) -> String {
        if alert.route_ids.is_empty() {
            return "All routes".into();
        }
        alert
            .route_ids
            .iter()
            .map(|id| {
                self.route_labels
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| id.to_string())
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn move_selection(&mut self, down: bool) {
        let current = self.table_state.selected().unwrap_or(0);
        let next = if down {
            current.saturating_add(1).min(self.alerts.len().saturating_sub(1))
        } else {
            current.saturating_sub(1)
        };
        self.table_state.select(Some(next));
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect, alert: &ServiceAlert) {
        let block = Block::default()
            .title(format!(" {} ", self.routes_text(alert)))
            .title_style(theme::title_style())
            .borders(Borders::TOP)
            .border_style(theme::border_default());

        let mut lines = vec![Line::from(Span::styled(
            alert.message.clone(),
            Style::default().fg(theme::DIM_WHITE),
        ))];
        let extra = [("Cause", &alert.cause), ("Effect", &alert.effect), ("More", &alert.url)];
        for (label, value) in extra {
            if let Some(value) = value {
                lines.push(Line::from(vec![
                    Span::styled(format!("{label}: "), theme::key_hint()),
                    Span::styled(value.clone(), Style::default().fg(theme::NEON_CYAN)),
                ]));
            }
        }

        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            area,
        );
    }
}

fn window_text(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> String {
    let fmt = |t: DateTime<Utc>| t.with_timezone(&Local).format("%b %-d").to_string();
    match (from, to) {
        (Some(f), Some(t)) => format!("{} – {}", fmt(f), fmt(t)),
        (Some(f), None) => format!("from {}", fmt(f)),
        (None, Some(t)) => format!("until {}", fmt(t)),
        (None, None) => "─".into(),
    }
}

impl Component for AlertsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(false),
            KeyCode::Esc => return Ok(Some(Action::GoBack)),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::AlertsUpdated(alerts) => {
                let mut sorted: Vec<_> = alerts.iter().cloned().collect();
                sorted.sort_by_key(|a| (a.priority, a.id));
                self.alerts = sorted;
                let clamped = self
                    .table_state
                    .selected()
                    .unwrap_or(0)
                    .min(self.alerts.len().saturating_sub(1));
                self.table_state.select(Some(clamped));
            }
            Action::RoutesUpdated(routes) => {
                self.route_labels = routes.iter().map(|r| (r.id, r.label())).collect();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" Alerts ({}) ", self.alerts.len()))
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

        if self.alerts.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                "  No service alerts",
                Style::default()
                    .fg(theme::SUCCESS_GREEN)
                    .add_modifier(Modifier::ITALIC),
            )));
            frame.render_widget(empty, inner);
            return;
        }

        let [table_area, detail_area] =
            Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(inner);

        let header = Row::new(
            ["Pri", "Routes", "Message", "When"].map(|h| Cell::from(h).style(theme::table_header())),
        );
        let rows: Vec<Row> = self
            .alerts
            .iter()
            .map(|a| {
                let priority_style = if a.priority <= 1 {
                    Style::default()
                        .fg(theme::ERROR_RED)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme::ELECTRIC_YELLOW)
                };
                let first_line = a.message.lines().next().unwrap_or_default().to_owned();
                Row::new(vec![
                    Cell::from(a.priority.to_string()).style(priority_style),
                    Cell::from(self.routes_text(a)),
                    Cell::from(first_line),
                    Cell::from(window_text(a.from, a.to)),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Length(4),
            Constraint::Length(16),
            Constraint::Fill(1),
            Constraint::Length(16),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected())
            .highlight_symbol("▸ ");
        let mut state = self.table_state;
        frame.render_stateful_widget(table, table_area, &mut state);

        if let Some(alert) = self.selected() {
            self.render_detail(frame, detail_area, alert);
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
