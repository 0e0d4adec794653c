//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use busmap_core::map::StatusLine;
use busmap_core::{Controller, LoadPhase};

use crate::action::Action;
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

/// Connection status as seen by the TUI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Last attempt failed with this message.
    Failed(String),
}

/// Top-level application state and event loop.
pub struct App {
    active_screen: ScreenId,
    /// Previous screen for GoBack.
    previous_screen: Option<ScreenId>,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    connection_status: ConnectionStatus,
    help_visible: bool,
    phase: LoadPhase,
    last_poll: Option<DateTime<Utc>>,
    throbber_state: ThrobberState,
    /// Components and the data bridge dispatch through this.
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    controller: Controller,
    /// Cancels the current data bridge task. Replaced on reconnect.
    data_cancel: CancellationToken,
}

impl App {
    pub fn new(controller: Controller) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let mut screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens(controller.map_view()).into_iter().collect();
        let active_screen = ScreenId::default();
        if let Some(screen) = screens.get_mut(&active_screen) {
            screen.set_focused(true);
        }

        Self {
            active_screen,
            previous_screen: None,
            screens,
            running: true,
            connection_status: ConnectionStatus::default(),
            help_visible: false,
            phase: LoadPhase::default(),
            last_poll: None,
            throbber_state: ThrobberState::default(),
            action_tx,
            action_rx,
            controller,
            data_cancel: CancellationToken::new(),
        }
    }

    fn spawn_bridge(&self) {
        let controller = self.controller.clone();
        let cancel = self.data_cancel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            crate::data_bridge::spawn_data_bridge(controller, tx, cancel).await;
        });
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        self.spawn_bridge();

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            // Drain everything queued, including bridge updates
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        self.controller.disconnect().await;
        events.stop();
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Global keys are handled here; everything else goes to the active
    /// screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char('?')) => {
                return Ok(Some(Action::ToggleHelp));
            }
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char('R')) => {
                return Ok(Some(Action::Reconnect));
            }
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='4')) => {
                let screen = c
                    .to_digit(10)
                    .and_then(|n| u8::try_from(n).ok())
                    .and_then(ScreenId::from_number);
                if let Some(screen) = screen {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (_, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }
            _ => {}
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }
        Ok(None)
    }

    fn switch_to(&mut self, target: ScreenId) {
        if target == self.active_screen {
            return;
        }
        debug!("switching screen: {} → {}", self.active_screen, target);
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(false);
        }
        self.previous_screen = Some(self.active_screen);
        self.active_screen = target;
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
    }

    /// Update app state and propagate to components.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::SwitchScreen(target) => self.switch_to(*target),

            Action::GoBack => {
                if let Some(prev) = self.previous_screen.take() {
                    self.action_tx.send(Action::SwitchScreen(prev))?;
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Connecting => self.connection_status = ConnectionStatus::Connecting,
            Action::Connected => self.connection_status = ConnectionStatus::Connected,
            Action::Disconnected(reason) => {
                self.connection_status = ConnectionStatus::Failed(reason.clone());
            }

            Action::Reconnect => {
                info!("reconnecting");
                self.data_cancel.cancel();
                self.data_cancel = CancellationToken::new();
                self.phase = LoadPhase::Initializing;
                self.last_poll = None;
                self.spawn_bridge();
            }

            Action::PhaseChanged(phase) => self.phase = *phase,
            Action::VehiclesPolled(at) => self.last_poll = Some(*at),

            Action::Tick => self.throbber_state.calc_next(),

            // Data updates go to ALL screens so they stay in sync
            Action::RoutesUpdated(_)
            | Action::VehiclesUpdated(_)
            | Action::AlertsUpdated(_)
            | Action::TracesUpdated(_) => {
                for screen in self.screens.values_mut() {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }

            Action::ShowOnMap(_) => {
                self.switch_to(ScreenId::Map);
                if let Some(screen) = self.screens.get_mut(&ScreenId::Map) {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }

            Action::OpenVehicleDetail(_) => {
                self.switch_to(ScreenId::Vehicles);
                if let Some(screen) = self.screens.get_mut(&ScreenId::Vehicles) {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }

            Action::Render | Action::Resize(..) => {}

            _ => {
                if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let [content_area, tab_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, content_area);
        }
        self.render_tab_bar(frame, tab_area);
        self.render_status_bar(frame, status_area);

        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", id.number(), id.label()), style))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );
        frame.render_widget(tabs, area);
    }

    /// Load phase on the left, poll age and connection state in the middle,
    /// key hints on the right.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let status = StatusLine::from(self.phase);
        let [phase_area, rest_area] =
            Layout::horizontal([Constraint::Length(30), Constraint::Min(1)]).areas(area);

        if status == StatusLine::Initializing {
            let throbber = Throbber::default()
                .label(format!(" {status}"))
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, phase_area, &mut self.throbber_state.clone());
        } else {
            let line = Line::from(Span::styled(
                format!(" {status}"),
                Style::default().fg(theme::NEON_CYAN),
            ));
            frame.render_widget(Paragraph::new(line), phase_area);
        }

        let mut spans = Vec::new();
        if let Some(at) = self.last_poll {
            let age = (Utc::now() - at).to_std().unwrap_or_default();
            let secs = Duration::from_secs(age.as_secs());
            spans.push(Span::styled(
                format!("updated {} ago  ", humantime::format_duration(secs)),
                theme::key_hint(),
            ));
        }
        spans.push(match &self.connection_status {
            ConnectionStatus::Connected => {
                Span::styled("● connected", Style::default().fg(theme::SUCCESS_GREEN))
            }
            ConnectionStatus::Connecting => {
                Span::styled("◐ connecting", Style::default().fg(theme::ELECTRIC_YELLOW))
            }
            ConnectionStatus::Disconnected => {
                Span::styled("○ disconnected", Style::default().fg(theme::ERROR_RED))
            }
            ConnectionStatus::Failed(reason) => Span::styled(
                format!("○ {reason} (R to retry)"),
                Style::default().fg(theme::ERROR_RED),
            ),
        });
        spans.push(Span::styled(" │ ? help  q quit", theme::key_hint()));

        frame.render_widget(Paragraph::new(Line::from(spans)), rest_area);
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_width = 56u16.min(area.width.saturating_sub(4));
    let help_height = 24u16.min(area.height.saturating_sub(2));
    let x = area.width.saturating_sub(help_width) / 2;
    let y = area.height.saturating_sub(help_height) / 2;
    let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(
            format!("  {title}"),
            Style::default().fg(theme::NEON_CYAN),
        ))
    };
    let entry = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {keys:<10}"), theme::key_hint_key()),
            Span::styled(what, theme::key_hint()),
        ])
    };

    let help_text = vec![
        Line::from(""),
        section("Global"),
        entry("1-4", "Jump to screen"),
        entry("Tab", "Next screen"),
        entry("R", "Reconnect"),
        entry("?", "This help"),
        entry("q", "Quit"),
        Line::from(""),
        section("Map"),
        entry("←→↑↓ hjkl", "Pan"),
        entry("+ / -", "Zoom in / out"),
        entry("f / r", "Fit routes / reset view"),
        entry("n / N", "Next / previous bus"),
        entry("c", "Center on selected bus"),
        Line::from(""),
        section("Lists"),
        entry("j/k ↑/↓", "Move up/down"),
        entry("Enter", "Bus detail"),
        entry("m", "Show bus on map"),
        entry("s / f", "Sort buses / filter routes"),
        entry("Esc", "Back / close"),
    ];
    frame.render_widget(Paragraph::new(help_text), inner);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{key, route, vehicle};
    use busmap_core::{ControllerConfig, VehicleId};
    use std::sync::Arc;

    fn app() -> App {
        let url = url::Url::parse("http://127.0.0.1:9/InfoPoint/").unwrap();
        App::new(Controller::new(ControllerConfig::new(url)))
    }

    fn drain(app: &mut App) {
        while let Ok(action) = app.action_rx.try_recv() {
            app.process_action(&action).unwrap();
        }
    }

    #[test]
    fn number_keys_switch_and_esc_goes_back() {
        let mut app = app();
        let action = app.handle_key_event(key('3')).unwrap().unwrap();
        app.process_action(&action).unwrap();
        assert_eq!(app.active_screen, ScreenId::Routes);

        let back = app
            .handle_key_event(KeyEvent::from(KeyCode::Esc))
            .unwrap()
            .unwrap();
        app.process_action(&back).unwrap();
        drain(&mut app);
        assert_eq!(app.active_screen, ScreenId::Map);
    }

    #[test]
    fn help_swallows_keys() {
        let mut app = app();
        app.process_action(&Action::ToggleHelp).unwrap();
        assert!(app.handle_key_event(key('2')).unwrap().is_none());
        let close = app.handle_key_event(key('?')).unwrap();
        assert!(matches!(close, Some(Action::ToggleHelp)));
    }

    #[test]
    fn show_on_map_switches_screen() {
        let mut app = app();
        app.process_action(&Action::RoutesUpdated(Arc::new(vec![route(
            20030, "B43", "0C6CB4",
        )])))
        .unwrap();
        app.process_action(&Action::VehiclesUpdated(Arc::new(vec![vehicle(
            3201,
            20030,
            (42.37, -72.52),
            0,
        )])))
        .unwrap();
        app.process_action(&Action::SwitchScreen(ScreenId::Vehicles))
            .unwrap();

        app.process_action(&Action::ShowOnMap(VehicleId(3201)))
            .unwrap();
        assert_eq!(app.active_screen, ScreenId::Map);
        assert_eq!(app.previous_screen, Some(ScreenId::Vehicles));
    }

    #[test]
    fn phase_and_connection_tracked() {
        let mut app = app();
        assert_eq!(StatusLine::from(app.phase), StatusLine::Initializing);
        app.process_action(&Action::PhaseChanged(LoadPhase::Live))
            .unwrap();
        app.process_action(&Action::Disconnected("timed out".into()))
            .unwrap();
        assert_eq!(app.phase, LoadPhase::Live);
        assert_eq!(
            app.connection_status,
            ConnectionStatus::Failed("timed out".into())
        );
    }
}
