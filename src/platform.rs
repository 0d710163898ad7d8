//! OS integration: launch-at-startup registration and elevation checks.
//!
//! Nothing in here is allowed to take the poll loop down. Registry failures
//! are logged and reported back as [`StartupChange::Failed`].

use crate::error::PlatformError;
use std::path::{Path, PathBuf};

/// Name of the startup entry
pub const APP_NAME: &str = "HW2Serial";

/// Access to the per-user run-at-login entry for this program
#[cfg_attr(test, mockall::automock)]
pub trait StartupRegistry {
    /// The registered command, if any
    fn current(&self) -> Result<Option<String>, PlatformError>;

    fn write(&mut self, command: &str) -> Result<(), PlatformError>;

    fn remove(&mut self) -> Result<(), PlatformError>;
}

/// Outcome of [`sync_launch_at_startup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupChange {
    Registered,
    Removed,
    Unchanged,
    Failed,
}

/// Bring the startup entry in line with `enabled`.
///
/// An existing entry is left alone when enabling, and a missing entry is not
/// an error when disabling.
pub fn sync_launch_at_startup(
    registry: &mut dyn StartupRegistry,
    enabled: bool,
    command: &str,
) -> StartupChange {
    let result = match registry.current() {
        Ok(None) if enabled => registry.write(command).map(|_| StartupChange::Registered),
        Ok(Some(_)) if !enabled => registry.remove().map(|_| StartupChange::Removed),
        Ok(_) => Ok(StartupChange::Unchanged),
        Err(e) => Err(e),
    };

    match result {
        Ok(change) => {
            tracing::debug!(enabled, ?change, "launch at startup synced");
            change
        }
        Err(e) => {
            tracing::warn!("Could not update launch at startup: {}", e);
            StartupChange::Failed
        }
    }
}

fn current_exe() -> Result<PathBuf, PlatformError> {
    std::env::current_exe().map_err(|e| PlatformError::ExecutablePath(e.to_string()))
}

/// Directory holding the executable; default config and log files live here
pub fn program_dir() -> Result<PathBuf, PlatformError> {
    let exe = current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| PlatformError::ExecutablePath(exe.display().to_string()))
}

/// Command line registered for launch at startup, pointing at `config_path`
pub fn startup_command(config_path: &Path) -> Result<String, PlatformError> {
    Ok(format_startup_command(&current_exe()?, config_path))
}

/// `"<exe>" --config "<config>"`
pub fn format_startup_command(exe: &Path, config_path: &Path) -> String {
    format!("\"{}\" --config \"{}\"", exe.display(), config_path.display())
}

/// `HKCU\Software\Microsoft\Windows\CurrentVersion\Run`
#[cfg(windows)]
pub struct RunKeyRegistry;

#[cfg(windows)]
impl RunKeyRegistry {
    const RUN_KEY: &'static str = r"Software\Microsoft\Windows\CurrentVersion\Run";

    fn open(&self) -> Result<winreg::RegKey, PlatformError> {
        use winreg::RegKey;
        use winreg::enums::{HKEY_CURRENT_USER, KEY_READ, KEY_WRITE};

        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        Ok(hkcu.open_subkey_with_flags(Self::RUN_KEY, KEY_READ | KEY_WRITE)?)
    }
}

#[cfg(windows)]
impl StartupRegistry for RunKeyRegistry {
    fn current(&self) -> Result<Option<String>, PlatformError> {
        match self.open()?.get_value::<String, _>(APP_NAME) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, command: &str) -> Result<(), PlatformError> {
        Ok(self.open()?.set_value(APP_NAME, &command)?)
    }

    fn remove(&mut self) -> Result<(), PlatformError> {
        Ok(self.open()?.delete_value(APP_NAME)?)
    }
}

/// XDG autostart desktop entry (`~/.config/autostart/hw2serial.desktop`)
pub struct DesktopAutostart {
    path: PathBuf,
}

impl DesktopAutostart {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Entry under `$XDG_CONFIG_HOME`, or `$HOME/.config` when unset
    pub fn for_current_user() -> Result<Self, PlatformError> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .ok_or(PlatformError::Unsupported)?;
        Ok(Self::new(base.join("autostart").join("hw2serial.desktop")))
    }
}

impl StartupRegistry for DesktopAutostart {
    fn current(&self) -> Result<Option<String>, PlatformError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content
                .lines()
                .find_map(|line| line.strip_prefix("Exec="))
                .map(|exec| exec.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, command: &str) -> Result<(), PlatformError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let entry = format!(
            "[Desktop Entry]\nType=Application\nName={}\nExec={}\nX-GNOME-Autostart-enabled=true\n",
            APP_NAME, command
        );
        std::fs::write(&self.path, entry)?;
        Ok(())
    }

    fn remove(&mut self) -> Result<(), PlatformError> {
        std::fs::remove_file(&self.path)?;
        Ok(())
    }
}

/// Stand-in used when no startup mechanism is available; every call fails
pub struct UnsupportedRegistry;

impl StartupRegistry for UnsupportedRegistry {
    fn current(&self) -> Result<Option<String>, PlatformError> {
        Err(PlatformError::Unsupported)
    }

    fn write(&mut self, _command: &str) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }

    fn remove(&mut self) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }
}

/// The startup registry for this OS
#[cfg(windows)]
pub fn default_registry() -> Box<dyn StartupRegistry> {
    Box::new(RunKeyRegistry)
}

/// The startup registry for this OS
#[cfg(not(windows))]
pub fn default_registry() -> Box<dyn StartupRegistry> {
    match DesktopAutostart::for_current_user() {
        Ok(entry) => Box::new(entry),
        Err(e) => {
            tracing::warn!("Launch at startup unavailable: {}", e);
            Box::new(UnsupportedRegistry)
        }
    }
}

/// Whether the process runs with administrator/root rights
#[cfg(unix)]
pub fn is_elevated() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Whether the process runs with administrator/root rights.
///
/// Only elevated processes may open HKLM\SOFTWARE for writing.
#[cfg(windows)]
pub fn is_elevated() -> bool {
    use winreg::RegKey;
    use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_WRITE};

    RegKey::predef(HKEY_LOCAL_MACHINE)
        .open_subkey_with_flags("SOFTWARE", KEY_WRITE)
        .is_ok()
}

#[cfg(not(any(unix, windows)))]
pub fn is_elevated() -> bool {
    false
}

/// Refuse to start when `admin_only` is set and the process is not elevated
pub fn ensure_privileges(admin_only: bool) -> Result<(), PlatformError> {
    if admin_only && !is_elevated() {
        return Err(PlatformError::NotElevated);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_twice_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut entry = DesktopAutostart::new(dir.path().join("autostart/hw2serial.desktop"));

        assert_eq!(
            sync_launch_at_startup(&mut entry, true, "/usr/bin/hw2serial"),
            StartupChange::Registered
        );
        assert_eq!(
            sync_launch_at_startup(&mut entry, true, "/usr/bin/hw2serial"),
            StartupChange::Unchanged
        );
        assert_eq!(entry.current().unwrap().as_deref(), Some("/usr/bin/hw2serial"));
    }

    #[test]
    fn test_disable_without_entry_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut entry = DesktopAutostart::new(dir.path().join("hw2serial.desktop"));

        assert_eq!(
            sync_launch_at_startup(&mut entry, false, "ignored"),
            StartupChange::Unchanged
        );
        assert_eq!(
            sync_launch_at_startup(&mut entry, true, "hw2serial"),
            StartupChange::Registered
        );
        assert_eq!(
            sync_launch_at_startup(&mut entry, false, "hw2serial"),
            StartupChange::Removed
        );
        assert_eq!(entry.current().unwrap(), None);
    }

    #[test]
    fn test_registry_errors_are_swallowed() {
        let mut registry = MockStartupRegistry::new();
        registry.expect_current().returning(|| Ok(None));
        registry
            .expect_write()
            .times(1)
            .returning(|_| Err(PlatformError::Unsupported));

        assert_eq!(
            sync_launch_at_startup(&mut registry, true, "hw2serial"),
            StartupChange::Failed
        );
    }

    #[test]
    fn test_existing_entry_not_rewritten() {
        let mut registry = MockStartupRegistry::new();
        registry
            .expect_current()
            .returning(|| Ok(Some("C:\\old\\hw2serial.exe".to_string())));
        registry.expect_write().never();

        assert_eq!(
            sync_launch_at_startup(&mut registry, true, "C:\\new\\hw2serial.exe"),
            StartupChange::Unchanged
        );
    }

    #[test]
    fn test_unsupported_registry_fails_softly() {
        assert_eq!(
            sync_launch_at_startup(&mut UnsupportedRegistry, true, "hw2serial"),
            StartupChange::Failed
        );
    }

    #[test]
    fn test_startup_command_carries_config_path() {
        let command = format_startup_command(
            Path::new("/opt/hw2serial/hw2serial"),
            Path::new("/opt/hw2serial/hw2serial.json"),
        );
        assert_eq!(
            command,
            "\"/opt/hw2serial/hw2serial\" --config \"/opt/hw2serial/hw2serial.json\""
        );
    }

    #[test]
    fn test_startup_command_uses_running_executable() {
        let config = Path::new("/etc/hw2serial.json");
        let command = startup_command(config).unwrap();
        let exe = std::env::current_exe().unwrap();
        assert!(command.starts_with(&format!("\"{}\"", exe.display())));
        assert!(command.ends_with("--config \"/etc/hw2serial.json\""));
    }

    #[test]
    fn test_privileges_not_required_by_default() {
        assert!(ensure_privileges(false).is_ok());
    }
}
