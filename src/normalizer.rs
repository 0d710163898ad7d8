//! Sensor value normalization.
//!
//! Turns raw readings into a [`SensorTable`]: one entry per display key with a
//! formatted value and unit. A table is built from scratch every poll cycle
//! and never mutated afterwards.

use crate::sensors::{SensorReading, SensorType};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;

/// Value used for unavailable readings and for slots whose key is absent
pub const PLACEHOLDER: &str = "0";

/// Display key holding the local wall-clock time
pub const TIME_KEY: &str = "#Time";

pub const CORE_CLOCKS_KEY: &str = "#Core Clocks";
pub const CORE_LOADS_KEY: &str = "#Core Loads";
pub const CORE_TEMPERATURES_KEY: &str = "#Core Temperatures";

/// Where a table entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Sensor,
    Time,
    Aggregate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub value: String,
    pub unit: String,
    pub kind: EntryKind,
}

impl TableEntry {
    /// Text shown on screen; time and aggregate entries never carry a unit
    pub fn display(&self) -> String {
        match self.kind {
            EntryKind::Sensor => format!("{}{}", self.value, self.unit),
            EntryKind::Time | EntryKind::Aggregate => self.value.clone(),
        }
    }
}

/// Immutable snapshot of every normalized reading from one poll cycle.
///
/// Keys iterate in lexicographic ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorTable {
    entries: BTreeMap<String, TableEntry>,
}

impl SensorTable {
    pub fn get(&self, key: &str) -> Option<&TableEntry> {
        self.entries.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, TableEntry)> for SensorTable {
    fn from_iter<I: IntoIterator<Item = (String, TableEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Display key for a reading: bare name for Data/SmallData/Factor,
/// `"<name> <TypeName>"` otherwise.
pub fn display_key(name: &str, sensor_type: SensorType) -> String {
    if sensor_type.uses_bare_name() {
        name.to_string()
    } else {
        format!("{} {}", name, sensor_type.name())
    }
}

/// Decimal places used when formatting a reading
pub fn precision(name: &str, sensor_type: SensorType) -> usize {
    if name.contains("Memory") {
        3
    } else if sensor_type == SensorType::Voltage {
        1
    } else {
        0
    }
}

/// Format a raw value, `None` when the reading is unavailable
pub fn format_value(name: &str, sensor_type: SensorType, raw: Option<f32>) -> Option<String> {
    let value = raw.filter(|v| v.is_finite())?;
    let text = format!("{:.*}", precision(name, sensor_type), value);
    // Small negatives round to "-0" or "-0.000"
    match text.strip_prefix('-') {
        Some(magnitude) if magnitude.chars().all(|c| c == '0' || c == '.') => {
            Some(magnitude.to_string())
        }
        _ => Some(text),
    }
}

/// 1-based core number for names like `CPU Core #3` or `CPU Core 3`
pub fn core_index(name: &str) -> Option<usize> {
    let rest = name.strip_prefix("CPU Core")?.trim_start();
    let digits = rest.strip_prefix('#').unwrap_or(rest);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Accumulates one cycle's readings into a [`SensorTable`]
#[derive(Debug, Default)]
pub struct TableBuilder {
    entries: BTreeMap<String, TableEntry>,
    core_clocks: Vec<String>,
    core_loads: Vec<String>,
    core_temperatures: Vec<String>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reading. Later readings with the same key replace earlier ones.
    pub fn push(&mut self, reading: &SensorReading) {
        let key = display_key(&reading.name, reading.sensor_type);
        let formatted = format_value(&reading.name, reading.sensor_type, reading.value);
        let unit = if formatted.is_some() {
            reading.sensor_type.unit().to_string()
        } else {
            String::new()
        };
        let value = formatted.unwrap_or_else(|| PLACEHOLDER.to_string());

        if core_index(&reading.name).is_some() {
            let aggregate = match reading.sensor_type {
                SensorType::Clock => Some(&mut self.core_clocks),
                SensorType::Load => Some(&mut self.core_loads),
                SensorType::Temperature => Some(&mut self.core_temperatures),
                _ => None,
            };
            if let Some(parts) = aggregate {
                parts.push(value.clone());
            }
        }

        self.entries.insert(
            key,
            TableEntry {
                value,
                unit,
                kind: EntryKind::Sensor,
            },
        );
    }

    /// Finish the table, stamping `#Time` with `now`
    pub fn finish(mut self, now: DateTime<Local>) -> SensorTable {
        for (key, parts) in [
            (CORE_CLOCKS_KEY, &self.core_clocks),
            (CORE_LOADS_KEY, &self.core_loads),
            (CORE_TEMPERATURES_KEY, &self.core_temperatures),
        ] {
            if !parts.is_empty() {
                self.entries.insert(
                    key.to_string(),
                    TableEntry {
                        value: parts.join(":"),
                        unit: String::new(),
                        kind: EntryKind::Aggregate,
                    },
                );
            }
        }

        self.entries.insert(
            TIME_KEY.to_string(),
            TableEntry {
                value: now.format("%H:%M:%S").to_string(),
                unit: String::new(),
                kind: EntryKind::Time,
            },
        );

        SensorTable {
            entries: self.entries,
        }
    }
}

/// Build a complete table from one cycle's readings
pub fn normalize(readings: &[SensorReading], now: DateTime<Local>) -> SensorTable {
    let mut builder = TableBuilder::new();
    for reading in readings {
        builder.push(reading);
    }
    builder.finish(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ten_oclock() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_display_key_by_type() {
        for t in [
            SensorType::Voltage,
            SensorType::Clock,
            SensorType::Temperature,
            SensorType::Load,
            SensorType::Fan,
            SensorType::Flow,
            SensorType::Control,
            SensorType::Level,
            SensorType::Power,
        ] {
            assert_eq!(display_key("Core", t), format!("Core {}", t.name()));
        }
        for t in [SensorType::Data, SensorType::SmallData, SensorType::Factor] {
            assert_eq!(display_key("Used Memory", t), "Used Memory");
        }
    }

    #[test]
    fn test_format_precision() {
        assert_eq!(
            format_value("VCore", SensorType::Voltage, Some(3.3)).as_deref(),
            Some("3.3")
        );
        assert_eq!(
            format_value("CPU Total", SensorType::Load, Some(42.7)).as_deref(),
            Some("43")
        );
        assert_eq!(
            format_value("Used Memory", SensorType::Data, Some(1.23456)).as_deref(),
            Some("1.235")
        );
        assert_eq!(format_value("Fan #1", SensorType::Fan, None), None);
        assert_eq!(format_value("Fan #1", SensorType::Fan, Some(f32::NAN)), None);
    }

    #[test]
    fn test_negative_zero_normalized() {
        assert_eq!(format_value("CPU Fan", SensorType::Load, Some(-0.3)).as_deref(), Some("0"));
        assert_eq!(format_value("CPU Fan", SensorType::Load, Some(-0.0)).as_deref(), Some("0"));
        assert_eq!(
            format_value("Used Memory", SensorType::Data, Some(-0.0001)).as_deref(),
            Some("0.000")
        );
        assert_eq!(format_value("Vcore", SensorType::Voltage, Some(-0.04)).as_deref(), Some("0.0"));
        assert_eq!(format_value("Offset", SensorType::Load, Some(-0.6)).as_deref(), Some("-1"));
    }

    #[test]
    fn test_core_index() {
        assert_eq!(core_index("CPU Core #1"), Some(1));
        assert_eq!(core_index("CPU Core 12"), Some(12));
        assert_eq!(core_index("CPU Core"), None);
        assert_eq!(core_index("CPU Core #1 Extra"), None);
        assert_eq!(core_index("CPU Package"), None);
    }

    #[test]
    fn test_core_aggregates_follow_enumeration_order() {
        let readings = vec![
            SensorReading::new("CPU Core #1", SensorType::Load, Some(12.0)),
            SensorReading::new("CPU Core #2", SensorType::Load, Some(34.0)),
            SensorReading::new("CPU Core #1", SensorType::Clock, Some(3600.0)),
            SensorReading::new("CPU Core #2", SensorType::Clock, None),
        ];
        let table = normalize(&readings, ten_oclock());

        assert_eq!(table.value(CORE_LOADS_KEY), Some("12:34"));
        assert_eq!(table.value(CORE_CLOCKS_KEY), Some("3600:0"));
        assert_eq!(table.value(CORE_TEMPERATURES_KEY), None);
        assert_eq!(table.value("CPU Core #1 Load"), Some("12"));
    }

    #[test]
    fn test_unavailable_reading_uses_placeholder_without_unit() {
        let table = normalize(
            &[SensorReading::new("GPU Core", SensorType::Temperature, None)],
            ten_oclock(),
        );
        let entry = table.get("GPU Core Temperature").unwrap();
        assert_eq!(entry.value, PLACEHOLDER);
        assert_eq!(entry.unit, "");
    }

    #[test]
    fn test_time_key_and_sorted_keys() {
        let readings = vec![
            SensorReading::new("GPU Core", SensorType::Clock, Some(1500.0)),
            SensorReading::new("CPU Package", SensorType::Temperature, Some(55.2)),
        ];
        let table = normalize(&readings, ten_oclock());

        assert_eq!(table.value(TIME_KEY), Some("10:00:00"));
        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(
            keys,
            vec!["#Time", "CPU Package Temperature", "GPU Core Clock"]
        );
        assert_eq!(
            table.get("CPU Package Temperature").unwrap().display(),
            "55°C"
        );
        assert_eq!(table.get(TIME_KEY).unwrap().display(), "10:00:00");
    }
}
