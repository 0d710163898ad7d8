//! Slot selection and the transfer buffer.
//!
//! A slot list is the user's ordered choice of display keys. Every cycle it is
//! resolved against the current [`SensorTable`] into a [`TransferBuffer`] with
//! exactly one value per slot.

use crate::error::SlotError;
use crate::normalizer::{PLACEHOLDER, SensorTable, TIME_KEY};
use serde::{Deserialize, Serialize};

pub const MIN_SLOTS: usize = 1;
pub const MAX_SLOTS: usize = 20;

/// Ordered, user-editable list of display keys. Empty strings are unselected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SlotList {
    keys: Vec<String>,
}

impl SlotList {
    pub fn new(keys: Vec<String>) -> Result<Self, SlotError> {
        if !(MIN_SLOTS..=MAX_SLOTS).contains(&keys.len()) {
            return Err(SlotError::InvalidLength {
                len: keys.len(),
                min: MIN_SLOTS,
                max: MAX_SLOTS,
            });
        }
        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.as_str())
    }

    /// Point a slot at a display key (empty string clears it)
    pub fn assign(&mut self, index: usize, key: impl Into<String>) -> Result<(), SlotError> {
        let slot = self
            .keys
            .get_mut(index)
            .ok_or(SlotError::OutOfRange(index))?;
        *slot = key.into();
        Ok(())
    }

    /// Append an empty slot
    pub fn add(&mut self) -> Result<usize, SlotError> {
        if self.keys.len() >= MAX_SLOTS {
            return Err(SlotError::Full(MAX_SLOTS));
        }
        self.keys.push(String::new());
        Ok(self.keys.len() - 1)
    }

    /// Remove a slot. Slot 0 always stays, and so does the last remaining slot.
    pub fn remove(&mut self, index: usize) -> Result<String, SlotError> {
        if index >= self.keys.len() {
            return Err(SlotError::OutOfRange(index));
        }
        if index == 0 || self.keys.len() <= MIN_SLOTS {
            return Err(SlotError::Protected(index));
        }
        Ok(self.keys.remove(index))
    }
}

impl Default for SlotList {
    fn default() -> Self {
        Self {
            keys: vec![
                TIME_KEY.to_string(),
                "CPU Package Temperature".to_string(),
                "CPU Total Load".to_string(),
                String::new(),
                "GPU Core Clock".to_string(),
                String::new(),
            ],
        }
    }
}

impl TryFrom<Vec<String>> for SlotList {
    type Error = SlotError;

    fn try_from(keys: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(keys)
    }
}

impl From<SlotList> for Vec<String> {
    fn from(slots: SlotList) -> Self {
        slots.keys
    }
}

/// One value per slot, in slot order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferBuffer {
    values: Vec<String>,
}

impl TransferBuffer {
    /// Resolve every slot against the table; absent or empty keys get the placeholder
    pub fn build(table: &SensorTable, slots: &SlotList) -> Self {
        let values = slots
            .iter()
            .map(|key| {
                table
                    .value(key)
                    .filter(|_| !key.is_empty())
                    .unwrap_or(PLACEHOLDER)
                    .to_string()
            })
            .collect();
        Self { values }
    }

    /// Space-joined line sent to the device
    pub fn to_line(&self) -> String {
        self.values.join(" ")
    }

    /// The line as ASCII bytes; anything outside ASCII becomes `?`
    pub fn to_ascii(&self) -> Vec<u8> {
        self.to_line()
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .collect()
    }
}

/// On-screen text for each slot: value plus unit for sensors, bare otherwise
pub fn display_values(table: &SensorTable, slots: &SlotList) -> Vec<String> {
    slots
        .iter()
        .map(|key| match table.get(key) {
            Some(entry) if !key.is_empty() => entry.display(),
            _ => PLACEHOLDER.to_string(),
        })
        .collect()
}
