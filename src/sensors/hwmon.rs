//! Linux hwmon chips under `/sys/class/hwmon`.
//!
//! Only fans, voltages, power, PWM outputs and humidity are picked up here.
//! Temperatures come through sysinfo components instead.

use super::{SensorReading, SensorType};
use crate::error::SensorError;
use std::fs;
use std::path::{Path, PathBuf};

pub const HWMON_ROOT: &str = "/sys/class/hwmon";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    /// `fanN_input`, RPM
    Fan,
    /// `inN_input`, millivolts
    Voltage,
    /// `powerN_input` / `powerN_average`, microwatts
    Power,
    /// `pwmN`, 0..=255
    Pwm,
    /// `humidityN_input`, milli-percent
    Humidity,
}

impl InputKind {
    /// Kind and channel (`fan1`, `in0`, ...) for a hwmon attribute file
    fn parse(file_name: &str) -> Option<(Self, &str)> {
        const SUFFIXED: [(&str, &str, InputKind); 5] = [
            ("fan", "_input", InputKind::Fan),
            ("in", "_input", InputKind::Voltage),
            ("power", "_input", InputKind::Power),
            ("power", "_average", InputKind::Power),
            ("humidity", "_input", InputKind::Humidity),
        ];

        for (prefix, suffix, kind) in SUFFIXED {
            if let Some(channel) = file_name.strip_suffix(suffix) {
                if is_channel(channel, prefix) {
                    return Some((kind, channel));
                }
            }
        }
        if is_channel(file_name, "pwm") {
            return Some((InputKind::Pwm, file_name));
        }
        None
    }

    fn sensor_type(self) -> SensorType {
        match self {
            InputKind::Fan => SensorType::Fan,
            InputKind::Voltage => SensorType::Voltage,
            InputKind::Power => SensorType::Power,
            InputKind::Pwm => SensorType::Control,
            InputKind::Humidity => SensorType::Level,
        }
    }

    fn scale(self, raw: f64) -> f32 {
        let value = match self {
            InputKind::Fan => raw,
            InputKind::Voltage | InputKind::Humidity => raw / 1000.0,
            InputKind::Power => raw / 1_000_000.0,
            InputKind::Pwm => raw * 100.0 / 255.0,
        };
        value as f32
    }

    fn label(self) -> &'static str {
        match self {
            InputKind::Fan => "Fan",
            InputKind::Voltage => "Voltage",
            InputKind::Power => "Power",
            InputKind::Pwm => "Fan Control",
            InputKind::Humidity => "Humidity",
        }
    }
}

/// `fan12` for prefix `fan`: the prefix followed by digits only
fn is_channel(channel: &str, prefix: &str) -> bool {
    channel
        .strip_prefix(prefix)
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

#[derive(Debug, Clone)]
struct HwmonInput {
    path: PathBuf,
    name: String,
    kind: InputKind,
    value: Option<f32>,
}

/// One hwmon chip with the inputs found at discovery time
#[derive(Debug, Clone)]
pub struct HwmonChip {
    name: String,
    inputs: Vec<HwmonInput>,
}

impl HwmonChip {
    /// Every chip under `root` with at least one supported input, in directory order
    pub fn discover(root: &Path) -> Vec<HwmonChip> {
        let mut dirs: Vec<PathBuf> = match fs::read_dir(root) {
            Ok(entries) => entries.flatten().map(|e| e.path()).collect(),
            Err(e) => {
                tracing::debug!("No hwmon chips at {}: {}", root.display(), e);
                return Vec::new();
            }
        };
        dirs.sort();

        let chips: Vec<HwmonChip> = dirs.iter().filter_map(|dir| Self::open(dir)).collect();
        tracing::debug!("Discovered {} hwmon chips", chips.len());
        chips
    }

    fn open(dir: &Path) -> Option<HwmonChip> {
        let chip_name = read_trimmed(&dir.join("name"))
            .or_else(|| dir.file_name().map(|n| n.to_string_lossy().into_owned()))?;

        let mut files: Vec<String> = fs::read_dir(dir)
            .ok()?
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();

        let inputs: Vec<HwmonInput> = files
            .iter()
            .filter_map(|file| {
                let (kind, channel) = InputKind::parse(file)?;
                let number = channel.trim_start_matches(|c: char| c.is_ascii_alphabetic());
                let name = read_trimmed(&dir.join(format!("{}_label", channel)))
                    .unwrap_or_else(|| format!("{} {} #{}", chip_name, kind.label(), number));
                Some(HwmonInput {
                    path: dir.join(file),
                    name,
                    kind,
                    value: None,
                })
            })
            .collect();

        if inputs.is_empty() {
            return None;
        }
        Some(HwmonChip {
            name: chip_name,
            inputs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Re-read every input. Fails only when none of them could be read.
    pub fn refresh(&mut self) -> Result<(), SensorError> {
        for input in &mut self.inputs {
            input.value = read_trimmed(&input.path)
                .and_then(|raw| raw.parse::<f64>().ok())
                .map(|raw| input.kind.scale(raw));
        }
        if self.inputs.iter().all(|i| i.value.is_none()) {
            return Err(SensorError::RefreshError(format!(
                "no readable inputs on {}",
                self.name
            )));
        }
        Ok(())
    }

    pub fn readings(&self) -> Vec<SensorReading> {
        self.inputs
            .iter()
            .map(|i| SensorReading::new(i.name.clone(), i.kind.sensor_type(), i.value))
            .collect()
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
