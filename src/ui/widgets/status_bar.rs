//! Status bar widget.

use crate::transmitter::LinkStatus;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::time::Duration;

/// What the status bar shows
pub struct StatusInfo<'a> {
    /// Duration of the last completed poll cycle
    pub last_cycle: Option<Duration>,
    pub link: LinkStatus,
    pub port: &'a str,
    pub baud_rate: u32,
    pub status_message: Option<&'a str>,
    pub error_message: Option<&'a str>,
}

fn link_color(link: LinkStatus) -> Color {
    match link {
        LinkStatus::Connected => Color::Green,
        LinkStatus::Disconnected => Color::Red,
        LinkStatus::Paused => Color::Yellow,
        LinkStatus::Unknown => Color::Gray,
    }
}

fn cycle_text(last_cycle: Option<Duration>) -> String {
    match last_cycle {
        Some(elapsed) => format!("CYCLE {} ms", elapsed.as_millis()),
        None => "WAITING".to_string(),
    }
}

fn status_spans<'a>(info: &StatusInfo<'a>) -> Vec<Span<'a>> {
    let mut spans = vec![
        Span::styled(
            cycle_text(info.last_cycle),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
        Span::styled(
            info.link.to_string().to_uppercase(),
            Style::default().fg(link_color(info.link)),
        ),
        Span::raw(" │ "),
        Span::raw(format!("{} @ {}", info.port, info.baud_rate)),
    ];

    // Error message takes priority
    if let Some(error) = info.error_message {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("ERROR: {}", error),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    } else if let Some(status) = info.status_message {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(status, Style::default().fg(Color::Gray)));
    }

    spans
}

/// Render the status bar
pub fn render_status_bar(frame: &mut Frame, area: Rect, info: &StatusInfo) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(Line::from(status_spans(info))).block(block);
    frame.render_widget(paragraph, area);
}

/// Render the minimized view: the last line sent plus the status, no borders
pub fn render_compact(frame: &mut Frame, area: Rect, info: &StatusInfo, line: &str) {
    let mut spans = vec![
        Span::styled("HW2Serial ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(line.to_string(), Style::default().fg(Color::Green)),
        Span::raw(" │ "),
    ];
    spans.extend(status_spans(info));
    spans.push(Span::styled(
        "  (any key restores)",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
