//! Terminal UI module using ratatui.
//!
//! This module provides the interactive slot editor. Poll cycles are scheduled
//! from the same loop that reads the keyboard, so everything stays on one thread.

pub mod app;
pub mod input;
pub mod widgets;

use app::App;
use input::handle_input;

use crate::error::{Result, UiError};
use crate::platform::StartupRegistry;
use crate::service::MonitorService;
use crate::slots;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use widgets::status_bar::StatusInfo;

/// Longest wait for a key before checking the poll schedule again
const INPUT_TICK: Duration = Duration::from_millis(100);

/// Run the interactive UI until the user quits or a stop signal arrives
pub fn run_interactive(
    service: &mut MonitorService,
    registry: &mut dyn StartupRegistry,
    config_path: PathBuf,
    startup_command: String,
) -> Result<()> {
    let mut terminal =
        ratatui::try_init().map_err(|e| UiError::InitializationError(e.to_string()))?;
    let mut app = App::new(config_path, startup_command);
    let result = run_loop(&mut terminal, &mut app, service, registry);
    if let Err(e) = ratatui::try_restore() {
        tracing::warn!("Failed to restore terminal: {}", e);
    }
    result
}

fn run_loop(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    service: &mut MonitorService,
    registry: &mut dyn StartupRegistry,
) -> Result<()> {
    let mut next_poll = Instant::now();

    while !app.should_quit && !service.should_stop() {
        if Instant::now() >= next_poll {
            service.poll_cycle();
            next_poll = Instant::now() + service.config().refresh_period.as_duration();
        }

        terminal
            .draw(|frame| draw(frame, app, service))
            .map_err(|e| UiError::RenderError(e.to_string()))?;

        let timeout = next_poll
            .saturating_duration_since(Instant::now())
            .min(INPUT_TICK);
        let action = handle_input(timeout).map_err(|e| UiError::InputError(e.to_string()))?;
        app.handle(action, service, registry);
    }

    tracing::info!("Interactive session ended");
    Ok(())
}

fn draw(frame: &mut Frame, app: &App, service: &MonitorService) {
    let config = service.config();
    let report = service.last_report();
    let info = StatusInfo {
        last_cycle: report.map(|r| r.elapsed),
        link: service.link_status(),
        port: &config.serial_port,
        baud_rate: config.baud_rate,
        status_message: app.status_message.as_deref(),
        error_message: app.error_message.as_deref(),
    };

    if app.minimized {
        let line = report.map(|r| r.buffer.to_line()).unwrap_or_default();
        widgets::render_compact(frame, frame.area(), &info, &line);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(4),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let title = Line::from(vec![
        Span::styled(
            " HW2Serial ",
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            report.map(|r| r.buffer.to_line()).unwrap_or_default(),
            Style::default().fg(Color::Green),
        ),
        Span::styled("   ? for help", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(title), chunks[0]);

    let values = report
        .map(|r| slots::display_values(&r.table, &config.slots))
        .unwrap_or_default();
    widgets::render_slot_table(frame, chunks[1], &config.slots, &values, app.selected_slot);
    widgets::render_settings(frame, chunks[2], config, service.is_transmitting());
    widgets::render_status_bar(frame, chunks[3], &info);

    if app.show_help {
        widgets::render_help(frame, centered(frame.area(), 60, 80));
    }
    if let Some(pending) = app.pending {
        widgets::render_confirm(frame, centered(frame.area(), 50, 30), pending);
    }
}

/// A rectangle of the given percentage size centred in `area`
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
