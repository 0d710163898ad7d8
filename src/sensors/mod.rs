//! Sensor backend abstraction.
//!
//! A backend exposes a tree of hardware devices. Each device must be refreshed
//! before its sensors are read; readings are plain values with no history.

use crate::error::SensorError;
use std::fmt;

pub mod hwmon;
#[cfg(feature = "nvidia")]
pub mod nvidia;
pub mod system;

pub use system::SysinfoSource;

/// Kind of quantity a sensor measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorType {
    Voltage,
    Clock,
    Temperature,
    Load,
    Fan,
    Flow,
    Control,
    Level,
    Factor,
    Power,
    Data,
    SmallData,
}

impl SensorType {
    /// Every type, indexed by its type code
    pub const ALL: [SensorType; 12] = [
        SensorType::Voltage,
        SensorType::Clock,
        SensorType::Temperature,
        SensorType::Load,
        SensorType::Fan,
        SensorType::Flow,
        SensorType::Control,
        SensorType::Level,
        SensorType::Factor,
        SensorType::Power,
        SensorType::Data,
        SensorType::SmallData,
    ];

    /// Map a type code (0..=11) to a sensor type
    pub fn from_code(code: u8) -> Result<Self, SensorError> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(SensorError::UnknownType(code))
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            SensorType::Voltage => "Voltage",
            SensorType::Clock => "Clock",
            SensorType::Temperature => "Temperature",
            SensorType::Load => "Load",
            SensorType::Fan => "Fan",
            SensorType::Flow => "Flow",
            SensorType::Control => "Control",
            SensorType::Level => "Level",
            SensorType::Factor => "Factor",
            SensorType::Power => "Power",
            SensorType::Data => "Data",
            SensorType::SmallData => "SmallData",
        }
    }

    /// Display suffix appended to formatted values
    pub fn unit(self) -> &'static str {
        match self {
            SensorType::Voltage => " V",
            SensorType::Clock => "MHz",
            SensorType::Temperature => "°C",
            SensorType::Load => "%",
            SensorType::Fan => " RPM",
            SensorType::Flow => " L/h",
            SensorType::Control => "%",
            SensorType::Level => "%",
            SensorType::Factor => "",
            SensorType::Power => "W",
            SensorType::Data => "",
            SensorType::SmallData => "",
        }
    }

    /// Types whose display key is the bare sensor name
    pub fn uses_bare_name(self) -> bool {
        matches!(
            self,
            SensorType::Data | SensorType::SmallData | SensorType::Factor
        )
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single reading taken during one poll cycle
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub name: String,
    pub sensor_type: SensorType,
    pub value: Option<f32>,
}

impl SensorReading {
    pub fn new(name: impl Into<String>, sensor_type: SensorType, value: Option<f32>) -> Self {
        Self {
            name: name.into(),
            sensor_type,
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub usize);

/// A hardware device and its sub-devices
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub children: Vec<Device>,
}

impl Device {
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id: DeviceId(id),
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Device) -> Self {
        self.children.push(child);
        self
    }
}

/// Capability interface over a hardware-monitoring backend
#[cfg_attr(test, mockall::automock)]
pub trait SensorSource {
    /// Top-level devices in enumeration order
    fn list_devices(&self) -> Vec<Device>;

    /// Update the device's cached values
    fn refresh(&mut self, device: DeviceId) -> Result<(), SensorError>;

    /// Current readings of the device's own sensors (not its children)
    fn read_sensors(&self, device: DeviceId) -> Result<Vec<SensorReading>, SensorError>;
}

/// Refresh and read every device depth-first, parent before children.
///
/// A device that fails to refresh or read contributes no readings; its
/// children are still visited.
pub fn collect_readings(source: &mut dyn SensorSource) -> Vec<SensorReading> {
    let mut readings = Vec::new();
    for device in source.list_devices() {
        visit(source, &device, &mut readings);
    }
    readings
}

/// Keep only readings of `sensor_type`; `None` keeps everything
pub fn filter_by_type(readings: Vec<SensorReading>, sensor_type: Option<SensorType>) -> Vec<SensorReading> {
    match sensor_type {
        Some(wanted) => readings.into_iter().filter(|r| r.sensor_type == wanted).collect(),
        None => readings,
    }
}

fn visit(source: &mut dyn SensorSource, device: &Device, readings: &mut Vec<SensorReading>) {
    let result = match source.refresh(device.id) {
        Ok(()) => source.read_sensors(device.id),
        Err(e) => Err(e),
    };
    match result {
        Ok(mut found) => {
            tracing::trace!(device = %device.name, count = found.len(), "read sensors");
            readings.append(&mut found);
        }
        Err(e) => {
            tracing::warn!(device = %device.name, "skipping device: {}", e);
        }
    }

    for child in &device.children {
        visit(source, child, readings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_type_codes() {
        assert_eq!(SensorType::from_code(0).unwrap(), SensorType::Voltage);
        assert_eq!(SensorType::from_code(2).unwrap(), SensorType::Temperature);
        assert_eq!(SensorType::from_code(11).unwrap(), SensorType::SmallData);
        assert!(matches!(
            SensorType::from_code(12),
            Err(SensorError::UnknownType(12))
        ));
        for code in 0..=11u8 {
            assert_eq!(SensorType::from_code(code).unwrap().code(), code);
        }
    }

    #[test]
    fn test_filter_by_type() {
        let readings = vec![
            SensorReading::new("CPU Package", SensorType::Temperature, Some(48.0)),
            SensorReading::new("CPU Total", SensorType::Load, Some(12.0)),
            SensorReading::new("GPU Core", SensorType::Temperature, Some(55.0)),
        ];

        let temps = filter_by_type(readings.clone(), Some(SensorType::from_code(2).unwrap()));
        assert_eq!(temps.len(), 2);
        assert!(temps.iter().all(|r| r.sensor_type == SensorType::Temperature));
        assert_eq!(filter_by_type(readings.clone(), None), readings);
        assert!(filter_by_type(readings, Some(SensorType::Fan)).is_empty());
    }

    #[test]
    fn test_units() {
        assert_eq!(SensorType::Temperature.unit(), "°C");
        assert_eq!(SensorType::Load.unit(), "%");
        assert_eq!(SensorType::Factor.unit(), "");
        assert_eq!(SensorType::Data.unit(), "");
    }

    #[test]
    fn test_collect_walks_children_after_parent() {
        let mut source = MockSensorSource::new();
        source.expect_list_devices().return_const(vec![
            Device::new(0, "Mainboard").with_child(Device::new(1, "SuperIO")),
            Device::new(2, "CPU"),
        ]);
        source.expect_refresh().times(3).returning(|_| Ok(()));
        source
            .expect_read_sensors()
            .with(eq(DeviceId(0)))
            .returning(|_| Ok(vec![SensorReading::new("Board", SensorType::Temperature, Some(30.0))]));
        source
            .expect_read_sensors()
            .with(eq(DeviceId(1)))
            .returning(|_| Ok(vec![SensorReading::new("Fan #1", SensorType::Fan, Some(900.0))]));
        source
            .expect_read_sensors()
            .with(eq(DeviceId(2)))
            .returning(|_| Ok(vec![SensorReading::new("CPU Total", SensorType::Load, Some(5.0))]));

        let names: Vec<String> = collect_readings(&mut source)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Board", "Fan #1", "CPU Total"]);
    }

    #[test]
    fn test_failed_refresh_skips_device_only() {
        let mut source = MockSensorSource::new();
        source
            .expect_list_devices()
            .return_const(vec![Device::new(0, "GPU"), Device::new(1, "CPU")]);
        source
            .expect_refresh()
            .with(eq(DeviceId(0)))
            .returning(|_| Err(SensorError::RefreshError("driver gone".into())));
        source
            .expect_refresh()
            .with(eq(DeviceId(1)))
            .returning(|_| Ok(()));
        source
            .expect_read_sensors()
            .with(eq(DeviceId(1)))
            .times(1)
            .returning(|_| Ok(vec![SensorReading::new("CPU Total", SensorType::Load, Some(5.0))]));

        let readings = collect_readings(&mut source);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].name, "CPU Total");
    }
}
