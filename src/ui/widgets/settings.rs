//! Settings panel widget.

use crate::config::AppConfig;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn setting<'a>(key: &'a str, label: &'a str, value: String) -> Vec<Span<'a>> {
    vec![
        Span::styled(format!("[{}] ", key), Style::default().fg(Color::Cyan)),
        Span::raw(format!("{}: ", label)),
        Span::styled(value, Style::default().fg(Color::White)),
        Span::raw("   "),
    ]
}

fn check(enabled: bool) -> String {
    if enabled { "✓".to_string() } else { "✗".to_string() }
}

/// Render the settings panel
pub fn render_settings(frame: &mut Frame, area: Rect, config: &AppConfig, transmitting: bool) {
    let block = Block::default()
        .title(" Settings ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let mut serial = setting("p", "Port", config.serial_port.clone());
    serial.extend(setting("b", "Baud", config.baud_rate.to_string()));
    serial.extend(setting("f", "Refresh", config.refresh_period.to_string()));
    serial.extend(setting("Space", "Sending", check(transmitting)));

    let mut window = setting("t", "Minimize to tray", check(config.minimize_to_tray));
    window.extend(setting("l", "Launch at startup", check(config.launch_at_startup)));
    window.extend(setting("o", "Admin only", check(config.admin_only)));

    let paragraph = Paragraph::new(vec![Line::from(serial), Line::from(window)]).block(block);
    frame.render_widget(paragraph, area);
}
