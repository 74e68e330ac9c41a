//! Per-model command byte assignments.
//!
//! The thermostat family shares one wire protocol but every hardware SKU
//! assigns its own command identifiers to the semantic fields, scales
//! temperatures differently and ships a different weekly-schedule layout.
//! All of that variation lives in a `CommandByteMap` value chosen at
//! construction time; the processing code is written once against the map.

/// Command identifier assignments and device geometry for one thermostat model.
///
/// A field of `None` means the model does not support that command. Within a
/// model, every assigned identifier is unique (including the entries of
/// `consumed_commands`).
#[derive(Debug, Clone)]
pub struct CommandByteMap {
    pub device_on: Option<u8>,
    pub temperature_actual: Option<u8>,
    pub temperature_target: Option<u8>,
    pub temperature_floor: Option<u8>,
    pub locked: Option<u8>,
    pub schedules_mode: Option<u8>,
    pub schedules: Option<u8>,
    pub status_mode: Option<u8>,
    pub sensor_selection: Option<u8>,
    /// Device units per degree, e.g. 10.0 when the MCU reports tenths
    pub temperature_factor: f32,
    /// Programmable periods per day group
    pub slots_per_day: u8,
    /// Day groups covered by the weekly schedule
    pub days_covered: u8,
    /// Commands the MCU reports but the driver intentionally discards.
    /// They must still be acknowledged as known so the protocol engine does
    /// not misclassify them as errors.
    pub consumed_commands: &'static [u8],
}

impl CommandByteMap {
    /// HY316WW floor-heating thermostat.
    ///
    /// Reports temperatures in tenths of a degree and adds a read-only
    /// heating-status field plus a writable sensor-selection field. The
    /// consumed identifiers are the A1..AC installer menu reports
    /// (calibration offsets, limit thresholds, power-on memory, weekly
    /// programming selection).
    pub fn hy316ww() -> Self {
        Self {
            device_on: Some(0x01),
            temperature_target: Some(0x02),
            temperature_actual: Some(0x03),
            temperature_floor: None,
            schedules_mode: Some(0x04),
            locked: Some(0x06),
            schedules: Some(0x77),
            status_mode: Some(0x66),
            sensor_selection: Some(0x74),
            temperature_factor: 10.0,
            slots_per_day: 2,
            days_covered: 4,
            consumed_commands: &[
                0x6A, 0x6B, 0x6D, 0x6E, 0x6F, 0x70, 0x71, 0x72, 0x73, 0x75, 0x76,
            ],
        }
    }

    /// BHT-002 wall thermostat, the baseline model of the family.
    ///
    /// Half-degree temperature units, external floor sensor readout, no
    /// extended status or sensor-selection fields. Schedule covers six
    /// periods for workdays, saturday and sunday.
    pub fn bht_002() -> Self {
        Self {
            device_on: Some(0x01),
            temperature_target: Some(0x02),
            temperature_actual: Some(0x03),
            temperature_floor: Some(0x66),
            schedules_mode: Some(0x04),
            locked: Some(0x06),
            schedules: Some(0x65),
            status_mode: None,
            sensor_selection: None,
            temperature_factor: 2.0,
            slots_per_day: 6,
            days_covered: 3,
            consumed_commands: &[],
        }
    }

    /// Whether a command is known-but-discarded for this model
    pub fn is_consumed(&self, command: u8) -> bool {
        self.consumed_commands.contains(&command)
    }

    /// Number of (hour, minute, temperature) entries in the weekly schedule
    pub fn schedule_entries(&self) -> usize {
        self.slots_per_day as usize * self.days_covered as usize
    }
}
