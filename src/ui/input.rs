//! Input handling for the TUI.
//!
//! This module handles keyboard input and translates it into application actions.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// Actions that can be performed based on user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Quit the application
    Quit,
    /// Close the window (minimizes when minimize-to-tray is on)
    Close,
    /// Select previous slot
    PrevSlot,
    /// Select next slot
    NextSlot,
    /// Point the selected slot at the previous table key
    PrevKey,
    /// Point the selected slot at the next table key
    NextKey,
    AddSlot,
    RemoveSlot,
    ClearSlot,
    CyclePort,
    CycleBaud,
    CycleRefresh,
    ToggleMinimizeToTray,
    ToggleLaunchAtStartup,
    ToggleAdminOnly,
    /// Pause or resume serial output
    ToggleTransmission,
    RestoreDefaults,
    Reload,
    Save,
    /// Answer yes to a pending confirmation
    Confirm,
    /// Answer no to a pending confirmation
    Cancel,
    Minimize,
    /// Toggle help panel
    ToggleHelp,
    /// A key with no binding
    Unbound,
    /// No key pressed
    None,
}

/// Handle keyboard input and return the corresponding action
pub fn handle_input(timeout: Duration) -> std::io::Result<InputAction> {
    if event::poll(timeout)? {
        if let Event::Key(key_event) = event::read()? {
            if key_event.kind == KeyEventKind::Press {
                return Ok(map_key_to_action(key_event));
            }
        }
    }
    Ok(InputAction::None)
}

/// Map a key event to an application action
fn map_key_to_action(key_event: KeyEvent) -> InputAction {
    match key_event.code {
        // Quit
        KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            InputAction::Quit
        }
        KeyCode::Char('q') | KeyCode::Char('Q') => InputAction::Quit,
        KeyCode::Esc => InputAction::Close,

        // Slots
        KeyCode::Up | KeyCode::Char('k') => InputAction::PrevSlot,
        KeyCode::Down | KeyCode::Char('j') => InputAction::NextSlot,
        KeyCode::Left => InputAction::PrevKey,
        KeyCode::Right => InputAction::NextKey,
        KeyCode::Char('a') | KeyCode::Char('A') => InputAction::AddSlot,
        KeyCode::Char('x') | KeyCode::Char('X') => InputAction::RemoveSlot,
        KeyCode::Delete | KeyCode::Backspace => InputAction::ClearSlot,

        // Settings
        KeyCode::Char('p') | KeyCode::Char('P') => InputAction::CyclePort,
        KeyCode::Char('b') | KeyCode::Char('B') => InputAction::CycleBaud,
        KeyCode::Char('f') | KeyCode::Char('F') => InputAction::CycleRefresh,
        KeyCode::Char('t') | KeyCode::Char('T') => InputAction::ToggleMinimizeToTray,
        KeyCode::Char('l') | KeyCode::Char('L') => InputAction::ToggleLaunchAtStartup,
        KeyCode::Char('o') | KeyCode::Char('O') => InputAction::ToggleAdminOnly,
        KeyCode::Char(' ') => InputAction::ToggleTransmission,

        // Config file
        KeyCode::Char('d') | KeyCode::Char('D') => InputAction::RestoreDefaults,
        KeyCode::Char('r') | KeyCode::Char('R') => InputAction::Reload,
        KeyCode::Char('s') | KeyCode::Char('S') => InputAction::Save,
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => InputAction::Confirm,
        KeyCode::Char('n') | KeyCode::Char('N') => InputAction::Cancel,

        // Window
        KeyCode::Char('m') | KeyCode::Char('M') => InputAction::Minimize,
        KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => InputAction::ToggleHelp,

        _ => InputAction::Unbound,
    }
}
