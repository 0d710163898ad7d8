//! Help panel widget.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Slots",
        &[
            ("↑/↓", "Select slot"),
            ("←/→", "Choose the sensor shown in the slot"),
            ("a", "Add a slot"),
            ("x", "Remove the selected slot"),
            ("Del", "Clear the selected slot"),
        ],
    ),
    (
        "Settings",
        &[
            ("p", "Next serial port"),
            ("b", "Next baud rate"),
            ("f", "Next refresh period"),
            ("t", "Toggle minimize to tray"),
            ("l", "Toggle launch at startup"),
            ("o", "Toggle run as administrator"),
            ("Space", "Pause/resume transmission"),
        ],
    ),
    (
        "Configuration",
        &[
            ("s", "Save"),
            ("r", "Reload saved configuration"),
            ("d", "Restore defaults"),
        ],
    ),
    (
        "Other",
        &[
            ("m", "Minimize"),
            ("?/h/F1", "Toggle this help"),
            ("Esc", "Close window"),
            ("q", "Quit"),
        ],
    ),
];

/// Render the help panel
pub fn render_help(frame: &mut Frame, area: Rect) {
    // Clear the area first
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let mut help_text = Vec::new();
    for (title, keys) in SECTIONS {
        help_text.push(Line::from(""));
        help_text.push(Line::from(Span::styled(
            *title,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        for (key, description) in *keys {
            help_text.push(Line::from(vec![
                Span::styled(format!("  {:<8}", key), Style::default().fg(Color::Cyan)),
                Span::raw(format!("- {}", description)),
            ]));
        }
    }
    help_text.push(Line::from(""));
    help_text.push(Line::from(vec![
        Span::raw("Press "),
        Span::styled("?", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(" to close this help"),
    ]));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}
