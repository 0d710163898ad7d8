//! sysinfo-backed sensor source.
//!
//! Top-level devices, in enumeration order: the CPU (per-core clock and load,
//! total load, package and core temperatures), memory, NVIDIA GPUs when the
//! `nvidia` feature is on, storage, and the motherboard. The motherboard's
//! sub-devices are `Thermal Zones` (every remaining temperature component)
//! followed by one device per hwmon chip.

#[cfg(feature = "nvidia")]
use super::nvidia::NvidiaGpus;
use super::hwmon::{HwmonChip, HWMON_ROOT};
use super::{Device, DeviceId, SensorReading, SensorSource, SensorType};
use crate::error::SensorError;
use std::path::Path;
use sysinfo::{Components, Disks, System};

const CPU: DeviceId = DeviceId(0);
const MEMORY: DeviceId = DeviceId(1);
const MOTHERBOARD: DeviceId = DeviceId(2);
const THERMAL_ZONES: DeviceId = DeviceId(3);
const STORAGE: DeviceId = DeviceId(4);
const GPU_BASE: usize = 10;
const HWMON_BASE: usize = 100;

const BYTES_PER_GIB: f32 = 1024.0 * 1024.0 * 1024.0;

/// How a temperature component label maps onto CPU sensor names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentRole {
    /// Whole-package sensor (`Package id 0`, `Tctl`, ...)
    CpuPackage,
    /// Per-core sensor, 1-based core number
    CpuCore(usize),
    /// Anything else, reported under its own label
    Other,
}

/// Classify a sysinfo component label.
///
/// Linux coretemp numbers cores from 0 (`Core 0`); the sensor names produced
/// here are 1-based (`CPU Core #1`) to line up with per-core clock and load.
pub fn classify_component(label: &str) -> ComponentRole {
    let lower = label.to_lowercase();
    if lower.contains("package") || lower.contains("tctl") || lower.contains("tdie") {
        return ComponentRole::CpuPackage;
    }
    if let Some(pos) = lower.find("core ") {
        let digits: String = lower[pos + 5..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(index) = digits.parse::<usize>() {
            return ComponentRole::CpuCore(index + 1);
        }
    }
    ComponentRole::Other
}

/// Sensor source reading the local machine through sysinfo, hwmon and NVML
pub struct SysinfoSource {
    system: System,
    components: Components,
    disks: Disks,
    chips: Vec<HwmonChip>,
    #[cfg(feature = "nvidia")]
    gpus: Option<NvidiaGpus>,
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self::with_hwmon_root(Path::new(HWMON_ROOT))
    }

    /// Source whose hwmon chips are discovered under `root`
    pub fn with_hwmon_root(root: &Path) -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        system.refresh_memory();
        Self {
            system,
            components: Components::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
            chips: HwmonChip::discover(root),
            #[cfg(feature = "nvidia")]
            gpus: NvidiaGpus::init(),
        }
    }

    fn cpu_readings(&self) -> Vec<SensorReading> {
        let mut readings = Vec::new();
        for (i, cpu) in self.system.cpus().iter().enumerate() {
            let name = format!("CPU Core #{}", i + 1);
            readings.push(SensorReading::new(
                name.clone(),
                SensorType::Clock,
                Some(cpu.frequency() as f32),
            ));
            readings.push(SensorReading::new(
                name,
                SensorType::Load,
                Some(cpu.cpu_usage()),
            ));
        }
        readings.push(SensorReading::new(
            "CPU Total",
            SensorType::Load,
            Some(self.system.global_cpu_usage()),
        ));

        for component in self.components.list() {
            let name = match classify_component(component.label()) {
                ComponentRole::CpuPackage => "CPU Package".to_string(),
                ComponentRole::CpuCore(n) => format!("CPU Core #{}", n),
                ComponentRole::Other => continue,
            };
            readings.push(SensorReading::new(
                name,
                SensorType::Temperature,
                component.temperature(),
            ));
        }
        readings
    }

    fn memory_readings(&self) -> Result<Vec<SensorReading>, SensorError> {
        let total = self.system.total_memory();
        if total == 0 {
            return Err(SensorError::ReadError("memory totals unavailable".to_string()));
        }
        let used = self.system.used_memory();
        let available = self.system.available_memory();
        let load = used as f32 / total as f32 * 100.0;

        Ok(vec![
            SensorReading::new(
                "Used Memory",
                SensorType::Data,
                Some(used as f32 / BYTES_PER_GIB),
            ),
            SensorReading::new(
                "Available Memory",
                SensorType::Data,
                Some(available as f32 / BYTES_PER_GIB),
            ),
            SensorReading::new("RAM", SensorType::Load, Some(load)),
        ])
    }

    fn thermal_readings(&self) -> Vec<SensorReading> {
        self.components
            .list()
            .iter()
            .filter(|c| classify_component(c.label()) == ComponentRole::Other)
            .map(|c| SensorReading::new(c.label(), SensorType::Temperature, c.temperature()))
            .collect()
    }

    fn storage_readings(&self) -> Vec<SensorReading> {
        let mut readings = Vec::new();
        for disk in self.disks.list() {
            let total = disk.total_space();
            if total == 0 {
                continue;
            }
            let label = disk.mount_point().display().to_string();
            let used = total.saturating_sub(disk.available_space());
            readings.push(SensorReading::new(
                format!("{} Used Space", label),
                SensorType::Load,
                Some(used as f32 / total as f32 * 100.0),
            ));
            readings.push(SensorReading::new(
                format!("{} Free Space", label),
                SensorType::Data,
                Some(disk.available_space() as f32 / BYTES_PER_GIB),
            ));
        }
        readings
    }

    fn chip_mut(&mut self, id: usize) -> Result<&mut HwmonChip, SensorError> {
        id.checked_sub(HWMON_BASE)
            .and_then(|i| self.chips.get_mut(i))
            .ok_or(SensorError::UnknownDevice(id))
    }

    fn chip(&self, id: usize) -> Result<&HwmonChip, SensorError> {
        id.checked_sub(HWMON_BASE)
            .and_then(|i| self.chips.get(i))
            .ok_or(SensorError::UnknownDevice(id))
    }

    #[cfg(feature = "nvidia")]
    fn gpu_devices(&self) -> Vec<Device> {
        self.gpus
            .iter()
            .flat_map(|gpus| gpus.names().iter().enumerate())
            .map(|(i, name)| Device::new(GPU_BASE + i, name.clone()))
            .collect()
    }

    #[cfg(not(feature = "nvidia"))]
    fn gpu_devices(&self) -> Vec<Device> {
        Vec::new()
    }

    #[cfg(feature = "nvidia")]
    fn refresh_gpu(&mut self, id: usize) -> Result<(), SensorError> {
        match self.gpus.as_mut() {
            Some(gpus) => gpus.refresh(id - GPU_BASE),
            None => Err(SensorError::UnknownDevice(id)),
        }
    }

    #[cfg(not(feature = "nvidia"))]
    fn refresh_gpu(&mut self, id: usize) -> Result<(), SensorError> {
        Err(SensorError::UnknownDevice(id))
    }

    #[cfg(feature = "nvidia")]
    fn gpu_readings(&self, id: usize) -> Result<Vec<SensorReading>, SensorError> {
        match self.gpus.as_ref() {
            Some(gpus) => gpus.readings(id - GPU_BASE),
            None => Err(SensorError::UnknownDevice(id)),
        }
    }

    #[cfg(not(feature = "nvidia"))]
    fn gpu_readings(&self, id: usize) -> Result<Vec<SensorReading>, SensorError> {
        Err(SensorError::UnknownDevice(id))
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for SysinfoSource {
    fn list_devices(&self) -> Vec<Device> {
        let mut devices = vec![Device::new(CPU.0, "CPU"), Device::new(MEMORY.0, "Memory")];
        devices.extend(self.gpu_devices());
        devices.push(Device::new(STORAGE.0, "Storage"));

        let mut motherboard = Device::new(MOTHERBOARD.0, "Motherboard")
            .with_child(Device::new(THERMAL_ZONES.0, "Thermal Zones"));
        for (i, chip) in self.chips.iter().enumerate() {
            motherboard = motherboard.with_child(Device::new(HWMON_BASE + i, chip.name()));
        }
        devices.push(motherboard);
        devices
    }

    fn refresh(&mut self, device: DeviceId) -> Result<(), SensorError> {
        match device {
            CPU => {
                self.system.refresh_cpu_all();
                // Also serves Thermal Zones, which is visited later in the same cycle
                self.components.refresh(true);
                if self.system.cpus().is_empty() {
                    return Err(SensorError::RefreshError("no CPUs reported".to_string()));
                }
            }
            MEMORY => self.system.refresh_memory(),
            STORAGE => self.disks.refresh(true),
            MOTHERBOARD | THERMAL_ZONES => {}
            DeviceId(id) if id >= HWMON_BASE => self.chip_mut(id)?.refresh()?,
            DeviceId(id) if id >= GPU_BASE => self.refresh_gpu(id)?,
            DeviceId(other) => return Err(SensorError::UnknownDevice(other)),
        }
        Ok(())
    }

    fn read_sensors(&self, device: DeviceId) -> Result<Vec<SensorReading>, SensorError> {
        match device {
            CPU => Ok(self.cpu_readings()),
            MEMORY => self.memory_readings(),
            STORAGE => Ok(self.storage_readings()),
            MOTHERBOARD => Ok(Vec::new()),
            THERMAL_ZONES => Ok(self.thermal_readings()),
            DeviceId(id) if id >= HWMON_BASE => Ok(self.chip(id)?.readings()),
            DeviceId(id) if id >= GPU_BASE => self.gpu_readings(id),
            DeviceId(other) => Err(SensorError::UnknownDevice(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_component() {
        assert_eq!(classify_component("coretemp Package id 0"), ComponentRole::CpuPackage);
        assert_eq!(classify_component("k10temp Tctl"), ComponentRole::CpuPackage);
        assert_eq!(classify_component("coretemp Core 0"), ComponentRole::CpuCore(1));
        assert_eq!(classify_component("coretemp Core 11"), ComponentRole::CpuCore(12));
        assert_eq!(classify_component("acpitz temp1"), ComponentRole::Other);
        assert_eq!(classify_component("nvme Composite"), ComponentRole::Other);
    }

    fn source_with_fan_chip() -> (tempfile::TempDir, SysinfoSource) {
        let root = tempfile::tempdir().unwrap();
        let chip = root.path().join("hwmon1");
        std::fs::create_dir_all(&chip).unwrap();
        std::fs::write(chip.join("name"), "it8688\n").unwrap();
        std::fs::write(chip.join("fan2_input"), "950\n").unwrap();
        let source = SysinfoSource::with_hwmon_root(root.path());
        (root, source)
    }

    #[test]
    fn test_device_tree() {
        let (_root, source) = source_with_fan_chip();
        let devices = source.list_devices();
        assert_eq!(devices[0].name, "CPU");
        assert_eq!(devices[1].name, "Memory");
        assert!(devices.iter().any(|d| d.id == STORAGE));

        let motherboard = devices.last().unwrap();
        assert_eq!(motherboard.id, MOTHERBOARD);
        let children: Vec<&str> = motherboard.children.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(children, vec!["Thermal Zones", "it8688"]);
    }

    #[test]
    fn test_thermal_zones_need_no_refresh_of_their_own() {
        let (_root, mut source) = source_with_fan_chip();
        source.refresh(CPU).unwrap();
        let after_cpu = source.read_sensors(THERMAL_ZONES).unwrap();

        source.refresh(MOTHERBOARD).unwrap();
        source.refresh(THERMAL_ZONES).unwrap();
        let names = |readings: &[SensorReading]| -> Vec<String> {
            readings.iter().map(|r| r.name.clone()).collect()
        };
        assert_eq!(names(&source.read_sensors(THERMAL_ZONES).unwrap()), names(&after_cpu));
    }

    #[test]
    fn test_hwmon_chip_readings() {
        let (_root, mut source) = source_with_fan_chip();
        let chip = DeviceId(HWMON_BASE);
        source.refresh(chip).unwrap();
        assert_eq!(
            source.read_sensors(chip).unwrap(),
            vec![SensorReading::new("it8688 Fan #2", SensorType::Fan, Some(950.0))]
        );
        assert!(source.refresh(DeviceId(HWMON_BASE + 1)).is_err());
    }

    #[test]
    fn test_unknown_device() {
        let mut source = SysinfoSource::new();
        assert!(source.refresh(DeviceId(7)).is_err());
        assert!(source.read_sensors(DeviceId(7)).is_err());
        assert!(source.read_sensors(DeviceId(GPU_BASE + 50)).is_err());
    }

    #[test]
    fn test_memory_sensors_present() {
        let mut source = SysinfoSource::new();
        source.refresh(MEMORY).unwrap();
        let names: Vec<String> = source
            .read_sensors(MEMORY)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Used Memory", "Available Memory", "RAM"]);
    }
}
