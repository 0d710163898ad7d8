//! Slot table widget: one row per slot with its key and current value.

use crate::slots::SlotList;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

/// Render the slot table. `values` is empty until the first cycle completes.
pub fn render_slot_table(
    frame: &mut Frame,
    area: Rect,
    slots: &SlotList,
    values: &[String],
    selected: usize,
) {
    let block = Block::default()
        .title(format!(" Slots ({}) ", slots.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let header = Row::new(vec!["#", "Sensor", "Value"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = slots
        .iter()
        .enumerate()
        .map(|(index, key)| {
            let (label, label_style) = if key.is_empty() {
                ("(none)", Style::default().fg(Color::DarkGray))
            } else {
                (key, Style::default())
            };
            let value = values.get(index).cloned().unwrap_or_default();

            Row::new(vec![
                Cell::from(index.to_string()),
                Cell::from(label).style(label_style),
                Cell::from(value).style(Style::default().fg(Color::Green)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Percentage(60),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut state = TableState::default().with_selected(Some(selected));
    frame.render_stateful_widget(table, area, &mut state);
}
