//! NVIDIA GPUs through NVML.
//!
//! The NVML library is loaded at runtime; machines without the driver simply
//! report no GPUs.

use super::{SensorReading, SensorType};
use crate::error::SensorError;
use nvml_wrapper::enum_wrappers::device::{Clock, TemperatureSensor};
use nvml_wrapper::Nvml;

const BYTES_PER_MIB: f32 = 1024.0 * 1024.0;

/// Every GPU NVML reports, with the readings from its last refresh
pub struct NvidiaGpus {
    nvml: Nvml,
    names: Vec<String>,
    cache: Vec<Vec<SensorReading>>,
}

impl NvidiaGpus {
    /// `None` when NVML cannot be loaded or reports no devices
    pub fn init() -> Option<Self> {
        let nvml = match Nvml::init() {
            Ok(nvml) => nvml,
            Err(e) => {
                tracing::debug!("NVML unavailable: {}", e);
                return None;
            }
        };

        let count = nvml.device_count().unwrap_or(0);
        let names: Vec<String> = (0..count)
            .map(|i| {
                nvml.device_by_index(i)
                    .and_then(|d| d.name())
                    .unwrap_or_else(|_| format!("NVIDIA GPU {}", i))
            })
            .collect();
        if names.is_empty() {
            return None;
        }

        tracing::info!("Found {} NVIDIA GPU(s): {}", names.len(), names.join(", "));
        let cache = vec![Vec::new(); names.len()];
        Some(Self { nvml, names, cache })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn refresh(&mut self, index: usize) -> Result<(), SensorError> {
        let slot = self
            .cache
            .get_mut(index)
            .ok_or(SensorError::UnknownDevice(index))?;
        let device = self
            .nvml
            .device_by_index(index as u32)
            .map_err(|e| SensorError::RefreshError(e.to_string()))?;

        let utilization = device.utilization_rates().ok();
        let memory = device.memory_info().ok();
        let memory_load = memory
            .as_ref()
            .filter(|m| m.total > 0)
            .map(|m| m.used as f32 / m.total as f32 * 100.0);

        *slot = vec![
            SensorReading::new(
                "GPU Core",
                SensorType::Temperature,
                device.temperature(TemperatureSensor::Gpu).ok().map(|t| t as f32),
            ),
            SensorReading::new(
                "GPU Core",
                SensorType::Clock,
                device.clock_info(Clock::Graphics).ok().map(|c| c as f32),
            ),
            SensorReading::new(
                "GPU Memory",
                SensorType::Clock,
                device.clock_info(Clock::Memory).ok().map(|c| c as f32),
            ),
            SensorReading::new(
                "GPU Core",
                SensorType::Load,
                utilization.as_ref().map(|u| u.gpu as f32),
            ),
            SensorReading::new(
                "GPU Memory Controller",
                SensorType::Load,
                utilization.as_ref().map(|u| u.memory as f32),
            ),
            SensorReading::new("GPU Memory", SensorType::Load, memory_load),
            SensorReading::new(
                "GPU Fan",
                SensorType::Control,
                device.fan_speed(0).ok().map(|f| f as f32),
            ),
            // milliwatts
            SensorReading::new(
                "GPU Power",
                SensorType::Power,
                device.power_usage().ok().map(|p| p as f32 / 1000.0),
            ),
            SensorReading::new(
                "GPU Memory Used",
                SensorType::SmallData,
                memory.as_ref().map(|m| m.used as f32 / BYTES_PER_MIB),
            ),
            SensorReading::new(
                "GPU Memory Total",
                SensorType::SmallData,
                memory.as_ref().map(|m| m.total as f32 / BYTES_PER_MIB),
            ),
        ];
        Ok(())
    }

    pub fn readings(&self, index: usize) -> Result<Vec<SensorReading>, SensorError> {
        self.cache
            .get(index)
            .cloned()
            .ok_or(SensorError::UnknownDevice(index))
    }
}
