//! Application state management for the TUI.
//!
//! This module manages the UI state (selection, overlays, messages) and
//! applies user actions to the live [`MonitorService`].

use super::input::InputAction;
use crate::config::AppConfig;
use crate::platform::{self, StartupChange, StartupRegistry};
use crate::service::MonitorService;
use crate::transmitter;
use std::path::PathBuf;

/// Baud rates offered by the baud selector
pub const BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115200];

/// Operations that need a `y` before they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingConfirm {
    RestoreDefaults,
    Reload,
    Save,
}

impl PendingConfirm {
    pub fn prompt(self) -> &'static str {
        match self {
            PendingConfirm::RestoreDefaults => "Restore default settings?",
            PendingConfirm::Reload => "Discard changes and reload the saved configuration?",
            PendingConfirm::Save => "Save the current configuration?",
        }
    }
}

/// Application state
pub struct App {
    /// Whether the application should quit
    pub should_quit: bool,
    /// Compact single-line view
    pub minimized: bool,
    /// Show help panel
    pub show_help: bool,
    /// Index of currently selected slot
    pub selected_slot: usize,
    /// Operation waiting for confirmation
    pub pending: Option<PendingConfirm>,
    /// Status message
    pub status_message: Option<String>,
    /// Error message
    pub error_message: Option<String>,
    config_path: PathBuf,
    startup_command: String,
}

impl App {
    /// Create a new application state
    pub fn new(config_path: PathBuf, startup_command: String) -> Self {
        Self {
            should_quit: false,
            minimized: false,
            show_help: false,
            selected_slot: 0,
            pending: None,
            status_message: Some("Application started".to_string()),
            error_message: None,
            config_path,
            startup_command,
        }
    }

    /// Apply one user action
    pub fn handle(
        &mut self,
        action: InputAction,
        service: &mut MonitorService,
        registry: &mut dyn StartupRegistry,
    ) {
        if action == InputAction::None {
            return;
        }

        if self.minimized {
            if action == InputAction::Quit {
                self.should_quit = true;
            } else {
                self.minimized = false;
            }
            return;
        }

        if let Some(pending) = self.pending {
            match action {
                InputAction::Confirm => {
                    self.pending = None;
                    self.run_confirmed(pending, service, registry);
                }
                InputAction::Cancel | InputAction::Close => {
                    self.pending = None;
                    self.set_status("Cancelled".to_string());
                }
                InputAction::Quit => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match action {
            InputAction::Quit => self.should_quit = true,
            InputAction::Close => {
                if service.config().minimize_to_tray {
                    self.minimized = true;
                } else {
                    self.should_quit = true;
                }
            }
            InputAction::Minimize => self.minimized = true,
            InputAction::ToggleHelp => self.show_help = !self.show_help,

            InputAction::PrevSlot => self.prev_slot(service),
            InputAction::NextSlot => self.next_slot(service),
            InputAction::PrevKey => self.cycle_key(service, false),
            InputAction::NextKey => self.cycle_key(service, true),
            InputAction::AddSlot => self.add_slot(service),
            InputAction::RemoveSlot => self.remove_slot(service),
            InputAction::ClearSlot => self.assign_key(service, String::new()),

            InputAction::CyclePort => match transmitter::list_serial_ports() {
                Ok(ports) => self.cycle_port(service, &ports),
                Err(e) => self.set_error(e.to_string()),
            },
            InputAction::CycleBaud => self.cycle_baud(service),
            InputAction::CycleRefresh => {
                let config = service.config_mut();
                config.refresh_period = config.refresh_period.next();
                let message = format!("Refresh period {}", config.refresh_period);
                self.set_status(message);
            }
            InputAction::ToggleMinimizeToTray => {
                let config = service.config_mut();
                config.minimize_to_tray = !config.minimize_to_tray;
                let message = format!("Minimize to tray {}", on_off(config.minimize_to_tray));
                self.set_status(message);
            }
            InputAction::ToggleLaunchAtStartup => {
                let enabled = !service.config().launch_at_startup;
                service.config_mut().launch_at_startup = enabled;
                self.apply_launch_at_startup(enabled, registry);
            }
            InputAction::ToggleAdminOnly => {
                let config = service.config_mut();
                config.admin_only = !config.admin_only;
                let message = format!(
                    "Run as administrator {} (takes effect on next start)",
                    on_off(config.admin_only)
                );
                self.set_status(message);
            }
            InputAction::ToggleTransmission => {
                let running = service.toggle_transmission();
                self.set_status(format!(
                    "Transmission {}",
                    if running { "resumed" } else { "paused" }
                ));
            }

            InputAction::RestoreDefaults => self.pending = Some(PendingConfirm::RestoreDefaults),
            InputAction::Reload => self.pending = Some(PendingConfirm::Reload),
            InputAction::Save => self.pending = Some(PendingConfirm::Save),

            InputAction::Confirm
            | InputAction::Cancel
            | InputAction::Unbound
            | InputAction::None => {}
        }
    }

    fn run_confirmed(
        &mut self,
        pending: PendingConfirm,
        service: &mut MonitorService,
        registry: &mut dyn StartupRegistry,
    ) {
        match pending {
            PendingConfirm::RestoreDefaults => {
                service.replace_config(AppConfig::default());
                self.after_config_replaced(service, registry);
                self.set_status("Default settings restored".to_string());
            }
            PendingConfirm::Reload => match AppConfig::from_file(&self.config_path) {
                Ok(config) => {
                    service.replace_config(config);
                    self.after_config_replaced(service, registry);
                    self.set_status(format!("Reloaded {}", self.config_path.display()));
                }
                Err(e) => {
                    tracing::warn!("Reload failed: {}", e);
                    self.set_error(format!("Reload failed: {}", e));
                }
            },
            PendingConfirm::Save => match service.config().save(&self.config_path) {
                Ok(()) => self.set_status(format!("Saved {}", self.config_path.display())),
                Err(e) => {
                    tracing::error!("Save failed: {}", e);
                    self.set_error(format!("Save failed: {}", e));
                }
            },
        }
    }

    fn after_config_replaced(
        &mut self,
        service: &mut MonitorService,
        registry: &mut dyn StartupRegistry,
    ) {
        self.clamp_selection(service);
        let enabled = service.config().launch_at_startup;
        platform::sync_launch_at_startup(registry, enabled, &self.startup_command);
    }

    fn apply_launch_at_startup(&mut self, enabled: bool, registry: &mut dyn StartupRegistry) {
        match platform::sync_launch_at_startup(registry, enabled, &self.startup_command) {
            StartupChange::Failed => {
                self.set_error("Could not update launch at startup".to_string());
            }
            _ => self.set_status(format!("Launch at startup {}", on_off(enabled))),
        }
    }

    fn prev_slot(&mut self, service: &MonitorService) {
        let count = service.config().slots.len();
        if count > 0 {
            self.selected_slot = if self.selected_slot == 0 {
                count - 1
            } else {
                self.selected_slot - 1
            };
        }
    }

    fn next_slot(&mut self, service: &MonitorService) {
        let count = service.config().slots.len();
        if count > 0 {
            self.selected_slot = (self.selected_slot + 1) % count;
        }
    }

    fn clamp_selection(&mut self, service: &MonitorService) {
        let count = service.config().slots.len();
        self.selected_slot = self.selected_slot.min(count.saturating_sub(1));
    }

    /// Step the selected slot through "" followed by every table key.
    ///
    /// A key missing from the table sits just before the first real key.
    fn cycle_key(&mut self, service: &mut MonitorService, forward: bool) {
        let mut candidates = vec![String::new()];
        if let Some(report) = service.last_report() {
            candidates.extend(report.table.keys().map(str::to_string));
        }

        let current = service.config().slots.get(self.selected_slot).unwrap_or("");
        let len = candidates.len();
        let next = match candidates.iter().position(|k| k == current) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 1 % len,
            None => len - 1,
        };
        let key = candidates.swap_remove(next);
        self.assign_key(service, key);
    }

    fn assign_key(&mut self, service: &mut MonitorService, key: String) {
        let index = self.selected_slot;
        match service.config_mut().slots.assign(index, key) {
            Ok(()) => self.clear_error(),
            Err(e) => self.set_error(e.to_string()),
        }
    }

    fn add_slot(&mut self, service: &mut MonitorService) {
        match service.config_mut().slots.add() {
            Ok(index) => {
                self.selected_slot = index;
                self.set_status(format!("Added slot {}", index));
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    fn remove_slot(&mut self, service: &mut MonitorService) {
        let index = self.selected_slot;
        match service.config_mut().slots.remove(index) {
            Ok(_) => {
                self.clamp_selection(service);
                self.set_status(format!("Removed slot {}", index));
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    fn cycle_port(&mut self, service: &mut MonitorService, ports: &[String]) {
        if ports.is_empty() {
            self.set_error("No serial ports found".to_string());
            return;
        }
        let config = service.config_mut();
        let next = ports
            .iter()
            .position(|p| *p == config.serial_port)
            .map_or(0, |i| (i + 1) % ports.len());
        config.serial_port = ports[next].clone();
        let message = format!("Serial port {}", config.serial_port);
        self.set_status(message);
    }

    fn cycle_baud(&mut self, service: &mut MonitorService) {
        let config = service.config_mut();
        let next = BAUD_RATES
            .iter()
            .position(|b| *b == config.baud_rate)
            .map_or(0, |i| (i + 1) % BAUD_RATES.len());
        config.baud_rate = BAUD_RATES[next];
        let message = format!("Baud rate {}", config.baud_rate);
        self.set_status(message);
    }

    /// Set status message
    pub fn set_status(&mut self, message: String) {
        self.error_message = None;
        self.status_message = Some(message);
    }

    /// Set error message
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    /// Clear error message
    pub fn clear_error(&mut self) {
        self.error_message = None;
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
