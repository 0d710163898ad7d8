//! Service layer for polling sensors and transmitting the transfer buffer.
//!
//! This module provides the poll cycle shared by the interactive UI and the
//! headless daemon mode.

use crate::config::AppConfig;
use crate::error::{Result, ServiceError};
use crate::normalizer::{self, SensorTable};
use crate::sensors::{self, SensorSource};
use crate::slots::TransferBuffer;
use crate::transmitter::{LinkSettings, LinkStatus, Transmitter};
use chrono::Local;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Run mode for the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Interactive mode with TUI
    Interactive,
    /// Background daemon mode
    Daemon,
}

/// Stages of one poll cycle, reported at trace level as the cycle runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStage {
    Idle,
    Polling,
    Formatting,
    Transmitting,
}

/// Everything one poll cycle produced
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub table: SensorTable,
    pub buffer: TransferBuffer,
    pub link: LinkStatus,
    pub elapsed: Duration,
}

/// Owns the sensor source, the transmitter and the live configuration
pub struct MonitorService {
    config: AppConfig,
    source: Box<dyn SensorSource>,
    transmitter: Box<dyn Transmitter>,
    link: LinkStatus,
    transmit_enabled: bool,
    last_report: Option<CycleReport>,
    should_stop: Arc<AtomicBool>,
}

impl MonitorService {
    /// Create a new monitor service
    pub fn new(
        config: AppConfig,
        source: Box<dyn SensorSource>,
        transmitter: Box<dyn Transmitter>,
    ) -> Self {
        Self {
            config,
            source,
            transmitter,
            link: LinkStatus::Unknown,
            transmit_enabled: true,
            last_report: None,
            should_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    /// Replace the whole configuration (restore defaults, reload)
    pub fn replace_config(&mut self, config: AppConfig) {
        self.config = config;
    }

    pub fn link_status(&self) -> LinkStatus {
        self.link
    }

    pub fn last_report(&self) -> Option<&CycleReport> {
        self.last_report.as_ref()
    }

    pub fn is_transmitting(&self) -> bool {
        self.transmit_enabled
    }

    /// Pause or resume serial output; polling continues either way
    pub fn toggle_transmission(&mut self) -> bool {
        self.transmit_enabled = !self.transmit_enabled;
        self.link = if self.transmit_enabled {
            LinkStatus::Unknown
        } else {
            LinkStatus::Paused
        };
        tracing::info!(
            "Transmission {}",
            if self.transmit_enabled { "resumed" } else { "paused" }
        );
        self.transmit_enabled
    }

    /// Run one full cycle: poll, format, transmit
    pub fn poll_cycle(&mut self) -> &CycleReport {
        let started = Instant::now();

        enter(PollStage::Polling);
        let readings = sensors::collect_readings(self.source.as_mut());
        let table = normalizer::normalize(&readings, Local::now());

        enter(PollStage::Formatting);
        let buffer = TransferBuffer::build(&table, &self.config.slots);

        enter(PollStage::Transmitting);
        if self.transmit_enabled {
            self.link = self.transmit(&buffer);
        }

        enter(PollStage::Idle);
        let report = CycleReport {
            table,
            buffer,
            link: self.link,
            elapsed: started.elapsed(),
        };
        tracing::debug!(
            sensors = report.table.keys().count(),
            link = %report.link,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "poll cycle complete"
        );
        self.last_report.insert(report)
    }

    fn transmit(&mut self, buffer: &TransferBuffer) -> LinkStatus {
        let link = LinkSettings::from_config(&self.config);
        match self.transmitter.transmit(&link, &buffer.to_ascii()) {
            Ok(()) => {
                if self.link != LinkStatus::Connected {
                    tracing::info!("Connected to {} at {} baud", link.port, link.baud_rate);
                }
                tracing::trace!("sent: {}", buffer.to_line());
                LinkStatus::Connected
            }
            Err(e) => {
                if self.link != LinkStatus::Disconnected {
                    tracing::warn!("Transmission failed: {}", e);
                } else {
                    tracing::debug!("Transmission failed: {}", e);
                }
                LinkStatus::Disconnected
            }
        }
    }

    /// Get the stop signal
    pub fn get_stop_signal(&self) -> Arc<AtomicBool> {
        self.should_stop.clone()
    }

    pub fn should_stop(&self) -> bool {
        self.should_stop.load(Ordering::SeqCst)
    }

    /// Run the service in daemon mode.
    ///
    /// The next cycle starts one refresh period after the previous one ends.
    pub fn run_daemon(&mut self) -> Result<()> {
        tracing::info!(
            "Starting hw2serial in daemon mode ({} every {})",
            self.config.serial_port,
            self.config.refresh_period
        );

        while !self.should_stop() {
            self.poll_cycle();

            let deadline = Instant::now() + self.config.refresh_period.as_duration();
            while !self.should_stop() {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                thread::sleep((deadline - now).min(Duration::from_millis(50)));
            }
        }

        tracing::info!("hw2serial stopped");
        Ok(())
    }
}

/// Setup signal handlers for graceful shutdown
pub fn setup_signal_handler(stop_signal: Arc<AtomicBool>) -> Result<()> {
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(signal, stop_signal.clone())
            .map_err(|e| ServiceError::SignalError(e.to_string()))?;
    }
    Ok(())
}

fn enter(stage: PollStage) {
    tracing::trace!(?stage, "poll stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SensorError, TransmitError};
    use crate::sensors::{Device, DeviceId, MockSensorSource, SensorReading, SensorType};
    use crate::slots::SlotList;
    use crate::transmitter::MockTransmitter;

    fn cpu_source() -> MockSensorSource {
        let mut source = MockSensorSource::new();
        source
            .expect_list_devices()
            .return_const(vec![Device::new(0, "CPU")]);
        source.expect_refresh().returning(|_| Ok(()));
        source.expect_read_sensors().returning(|_| {
            Ok(vec![
                SensorReading::new("CPU Package", SensorType::Temperature, Some(55.4)),
                SensorReading::new("CPU Core #1", SensorType::Load, Some(12.0)),
                SensorReading::new("CPU Core #2", SensorType::Load, Some(34.0)),
            ])
        });
        source
    }

    fn config_with_slots(keys: &[&str]) -> AppConfig {
        let mut config = AppConfig::default();
        config.slots = SlotList::new(keys.iter().map(|k| k.to_string()).collect()).unwrap();
        config
    }

    #[test]
    fn test_cycle_transmits_slot_values() {
        let mut transmitter = MockTransmitter::new();
        transmitter
            .expect_transmit()
            .withf(|link, line| link.baud_rate == 9600 && line == b"55 12:34 0")
            .times(1)
            .returning(|_, _| Ok(()));

        let config = config_with_slots(&["CPU Package Temperature", "#Core Loads", ""]);
        let mut service = MonitorService::new(config, Box::new(cpu_source()), Box::new(transmitter));
        let report = service.poll_cycle();

        assert_eq!(report.buffer.to_line(), "55 12:34 0");
        assert_eq!(report.link, LinkStatus::Connected);
        assert_eq!(service.last_report().map(|r| r.link), Some(LinkStatus::Connected));
    }

    #[test]
    fn test_transmit_failure_marks_disconnected() {
        let mut transmitter = MockTransmitter::new();
        transmitter.expect_transmit().returning(|link, _| {
            Err(TransmitError::OpenError {
                port: link.port.clone(),
                message: "No such file or directory".to_string(),
            })
        });

        let mut service = MonitorService::new(
            AppConfig::default(),
            Box::new(cpu_source()),
            Box::new(transmitter),
        );
        assert_eq!(service.poll_cycle().link, LinkStatus::Disconnected);
        assert_eq!(service.poll_cycle().link, LinkStatus::Disconnected);
        assert_eq!(service.link_status(), LinkStatus::Disconnected);
    }

    #[test]
    fn test_paused_transmission_skips_transmitter() {
        let mut transmitter = MockTransmitter::new();
        transmitter.expect_transmit().never();

        let mut service = MonitorService::new(
            AppConfig::default(),
            Box::new(cpu_source()),
            Box::new(transmitter),
        );
        assert!(!service.toggle_transmission());
        let report = service.poll_cycle();
        assert_eq!(report.link, LinkStatus::Paused);
        assert_eq!(report.buffer.to_line().split(' ').count(), AppConfig::default().slots.len());
    }

    #[test]
    fn test_sensor_failure_still_transmits() {
        let mut source = MockSensorSource::new();
        source
            .expect_list_devices()
            .return_const(vec![Device::new(0, "CPU")]);
        source
            .expect_refresh()
            .returning(|id: DeviceId| Err(SensorError::UnknownDevice(id.0)));

        let mut transmitter = MockTransmitter::new();
        transmitter
            .expect_transmit()
            .withf(|_, line| line == b"0 0")
            .times(1)
            .returning(|_, _| Ok(()));

        let config = config_with_slots(&["CPU Package Temperature", "CPU Total Load"]);
        let mut service = MonitorService::new(config, Box::new(source), Box::new(transmitter));
        let report = service.poll_cycle();
        assert!(report.table.get("#Time").is_some());
        assert_eq!(report.link, LinkStatus::Connected);
    }

    #[test]
    fn test_slot_edits_apply_next_cycle() {
        let mut transmitter = MockTransmitter::new();
        transmitter.expect_transmit().returning(|_, _| Ok(()));

        let config = config_with_slots(&["CPU Package Temperature"]);
        let mut service = MonitorService::new(config, Box::new(cpu_source()), Box::new(transmitter));
        assert_eq!(service.poll_cycle().buffer.to_line(), "55");

        service.config_mut().slots.add().unwrap();
        service.config_mut().slots.assign(1, "CPU Core #2 Load").unwrap();
        assert_eq!(service.poll_cycle().buffer.to_line(), "55 34");
    }

    #[test]
    fn test_daemon_stops_on_signal_flag() {
        let mut transmitter = MockTransmitter::new();
        transmitter.expect_transmit().returning(|_, _| Ok(()));
        let mut service = MonitorService::new(
            AppConfig::default(),
            Box::new(cpu_source()),
            Box::new(transmitter),
        );
        service.get_stop_signal().store(true, Ordering::SeqCst);
        assert!(service.run_daemon().is_ok());
        assert!(service.last_report().is_none());
    }
}
