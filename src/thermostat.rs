use log::{debug, error};

use crate::command_map::CommandByteMap;
use crate::property::{Property, Visibility};
use crate::schedule::{ScheduleStore, SCHEDULES_DATA_LENGTH};
use crate::transport::McuTransport;
use crate::types::{
    bytes_to_hex, ThermostatError, SCHEDULES_MODE_AUTO, SCHEDULES_MODE_HOLD, SCHEDULES_MODE_OFF,
    SENSOR_SELECTION_BOTH, SENSOR_SELECTION_FLOOR, SENSOR_SELECTION_INTERNAL, STATE_HEATING,
    STATE_OFF,
};

/// Outcome of one inbound status command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandStatus {
    /// The command identifier (and declared length) matched a field of this model
    pub recognized: bool,
    /// A property value actually changed
    pub changed: bool,
}

impl CommandStatus {
    fn recognized(changed: bool) -> Self {
        Self {
            recognized: true,
            changed,
        }
    }
}

pub struct Thermostat<T: McuTransport> {
    transport: T,
    map: CommandByteMap,
    device_on: Property,
    temperature: Property,
    target_temperature: Property,
    floor_temperature: Option<Property>,
    locked: Property,
    schedules_mode: Property,
    status_mode: Option<Property>,
    sensor_selection: Option<Property>,
    schedules: ScheduleStore,
    /// Set while an MCU report is being applied; suppresses command echo
    receiving_from_mcu: bool,
    state_listener: Option<Box<dyn FnMut()>>,
    schedules_listener: Option<Box<dyn FnMut()>>,
}

impl<T: McuTransport> Thermostat<T> {
    // Wire constants shared by every model of the family
    const SYNC1: u8 = 0x55;
    const SYNC2: u8 = 0xAA;
    /// First payload byte, relative to frame start
    const VALUE_POS: usize = 10;
    /// Declared length of boolean and enum reports
    const BOOL_ENUM_LENGTH: u8 = 0x05;
    /// Declared length of 32-bit value reports
    const VALUE_LENGTH: u8 = 0x08;

    /// Create a driver instance for one physical device
    pub fn new(transport: T, map: CommandByteMap) -> Self {
        let mut schedules_mode = Property::enumerated("schedulesMode");
        schedules_mode.add_enum_string(SCHEDULES_MODE_OFF);
        schedules_mode.add_enum_string(SCHEDULES_MODE_AUTO);
        schedules_mode.add_enum_string(SCHEDULES_MODE_HOLD);

        let floor_temperature = map
            .temperature_floor
            .map(|_| Property::number("floorTemperature"));

        let status_mode = map.status_mode.map(|_| {
            let mut p = Property::enumerated("statusMode");
            p.add_enum_string(STATE_OFF);
            p.add_enum_string(STATE_HEATING);
            p.set_read_only(true);
            p.set_visibility(Visibility::Mqtt);
            p
        });

        let sensor_selection = map.sensor_selection.map(|_| {
            let mut p = Property::enumerated("sensorSelection");
            p.add_enum_string(SENSOR_SELECTION_INTERNAL);
            p.add_enum_string(SENSOR_SELECTION_FLOOR);
            p.add_enum_string(SENSOR_SELECTION_BOTH);
            p.set_visibility(Visibility::Mqtt);
            p
        });

        let schedules = ScheduleStore::new(map.schedule_entries());

        Self {
            transport,
            map,
            device_on: Property::boolean("deviceOn"),
            temperature: Property::number("temperature"),
            target_temperature: Property::number("targetTemperature"),
            floor_temperature,
            locked: Property::boolean("locked"),
            schedules_mode,
            status_mode,
            sensor_selection,
            schedules,
            receiving_from_mcu: false,
            state_listener: None,
            schedules_listener: None,
        }
    }

    /// Register a listener fired once per inbound frame that changed state
    pub fn on_state_change<F: FnMut() + 'static>(&mut self, listener: F) {
        self.state_listener = Some(Box::new(listener));
    }

    /// Register a listener fired when the weekly schedule changes
    pub fn on_schedules_change<F: FnMut() + 'static>(&mut self, listener: F) {
        self.schedules_listener = Some(Box::new(listener));
    }

    /// Apply one status command reported by the MCU.
    ///
    /// `command` is the identifier the protocol engine extracted from the
    /// frame, `length` its declared payload length, and `frame` the complete
    /// received frame (payload bytes start at offset 10). Commands this model
    /// does not understand are left alone and reported as not recognized;
    /// the same serial line carries unrelated vendor commands that other
    /// handlers may claim. A length mismatch on a known identifier counts as
    /// not recognized for the same reason.
    pub fn process_status_command(&mut self, command: u8, length: u8, frame: &[u8]) -> CommandStatus {
        self.receiving_from_mcu = true;
        let mut status = self.process_base_command(command, length, frame);
        if !status.recognized {
            status = self.process_model_command(command, length, frame);
        }
        if status.changed {
            self.notify_state();
        }
        self.receiving_from_mcu = false;
        status
    }

    /// Fields every model of the family reports
    fn process_base_command(&mut self, command: u8, length: u8, frame: &[u8]) -> CommandStatus {
        if self.map.device_on == Some(command) {
            if let Some(on) = Self::bool_payload(length, frame) {
                return CommandStatus::recognized(self.device_on.set_bool(on));
            }
        } else if self.map.temperature_actual == Some(command) {
            if let Some(value) = Self::scaled_payload(length, frame, self.map.temperature_factor) {
                return CommandStatus::recognized(self.temperature.set_number(value));
            }
        } else if self.map.temperature_target == Some(command) {
            if let Some(value) = Self::scaled_payload(length, frame, self.map.temperature_factor) {
                return CommandStatus::recognized(self.target_temperature.set_number(value));
            }
        } else if self.map.temperature_floor == Some(command) {
            if let Some(value) = Self::scaled_payload(length, frame, self.map.temperature_factor) {
                if let Some(floor) = self.floor_temperature.as_mut() {
                    return CommandStatus::recognized(floor.set_number(value));
                }
            }
        } else if self.map.locked == Some(command) {
            if let Some(locked) = Self::bool_payload(length, frame) {
                return CommandStatus::recognized(self.locked.set_bool(locked));
            }
        } else if self.map.schedules_mode == Some(command) {
            if let Some(changed) = Self::enum_payload(&mut self.schedules_mode, length, frame) {
                return CommandStatus::recognized(changed);
            }
        } else if self.map.schedules == Some(command) {
            return self.process_status_schedules(length, frame);
        }
        CommandStatus::default()
    }

    /// Fields only some models report, then the known-but-discarded set
    fn process_model_command(&mut self, command: u8, length: u8, frame: &[u8]) -> CommandStatus {
        if self.map.status_mode == Some(command) {
            if let Some(property) = self.status_mode.as_mut() {
                if let Some(changed) = Self::enum_payload(property, length, frame) {
                    return CommandStatus::recognized(changed);
                }
            }
        } else if self.map.sensor_selection == Some(command) {
            if let Some(value) = Self::enum_payload_string(self.sensor_selection.as_ref(), length, frame)
            {
                return CommandStatus::recognized(self.apply_sensor_selection(value));
            }
        } else if self.map.is_consumed(command) {
            // acknowledged as known, payload intentionally discarded
            return CommandStatus::recognized(false);
        }
        CommandStatus::default()
    }

    /// Schedule report: declared length is fixed, payload carries the data
    /// region with placeholders
    fn process_status_schedules(&mut self, length: u8, frame: &[u8]) -> CommandStatus {
        let region_end = Self::VALUE_POS + self.schedules.region_len();
        if length != SCHEDULES_DATA_LENGTH || frame.len() < region_end {
            return CommandStatus::default();
        }
        if self.schedules.decode(&frame[Self::VALUE_POS..region_end]) {
            self.notify_schedules();
        }
        // schedule changes notify on their own channel, not the state channel
        CommandStatus::recognized(false)
    }

    fn bool_payload(length: u8, frame: &[u8]) -> Option<bool> {
        if length != Self::BOOL_ENUM_LENGTH || frame.len() <= Self::VALUE_POS {
            return None;
        }
        Some(frame[Self::VALUE_POS] != 0x00)
    }

    fn scaled_payload(length: u8, frame: &[u8], factor: f32) -> Option<f32> {
        if length != Self::VALUE_LENGTH || frame.len() < Self::VALUE_POS + 4 {
            return None;
        }
        let raw = i32::from_be_bytes([frame[10], frame[11], frame[12], frame[13]]);
        Some(raw as f32 / factor)
    }

    /// Map an enum report through the property's table. An out-of-range byte
    /// means "not this field": the frame is left alone and nothing changes.
    fn enum_payload(property: &mut Property, length: u8, frame: &[u8]) -> Option<bool> {
        if length != Self::BOOL_ENUM_LENGTH || frame.len() <= Self::VALUE_POS {
            return None;
        }
        let value = property.enum_string(frame[Self::VALUE_POS])?;
        Some(property.set_string(value))
    }

    fn enum_payload_string(
        property: Option<&Property>,
        length: u8,
        frame: &[u8],
    ) -> Option<&'static str> {
        if length != Self::BOOL_ENUM_LENGTH || frame.len() <= Self::VALUE_POS {
            return None;
        }
        property?.enum_string(frame[Self::VALUE_POS])
    }

    /// Write the weekly schedule locally and push it to the MCU.
    /// `data` holds (hour, minute, raw temperature) triplets, placeholder
    /// bytes excluded, and must match the model's schedule length exactly.
    pub fn set_schedules(&mut self, data: &[u8]) -> Result<(), ThermostatError> {
        if data.len() != self.schedules.len() {
            return Err(ThermostatError::InvalidParameter(format!(
                "schedule data must be {} bytes, got {}",
                self.schedules.len(),
                data.len()
            )));
        }
        self.schedules.copy_from(data);
        self.schedules_to_mcu();
        Ok(())
    }

    /// Select which sensor drives the control loop ("internal", "floor" or
    /// "both") and push the selection to the MCU
    pub fn set_sensor_selection(&mut self, value: &str) -> Result<bool, ThermostatError> {
        let property = self.sensor_selection.as_ref().ok_or_else(|| {
            ThermostatError::InvalidParameter(
                "sensor selection is not supported by this model".into(),
            )
        })?;
        let Some(value) = property
            .enum_index_of(value)
            .and_then(|index| property.enum_string(index))
        else {
            return Err(ThermostatError::InvalidParameter(format!(
                "unknown sensor selection: {value}"
            )));
        };
        Ok(self.apply_sensor_selection(value))
    }

    /// Single entry for sensor-selection changes of either origin: local
    /// writes push to the MCU, MCU-originated ones are suppressed by the
    /// reentrancy guard inside `sensor_selection_to_mcu`
    fn apply_sensor_selection(&mut self, value: &'static str) -> bool {
        let changed = match self.sensor_selection.as_mut() {
            Some(property) => property.set_string(value),
            None => false,
        };
        if changed {
            self.sensor_selection_to_mcu();
        }
        changed
    }

    fn sensor_selection_to_mcu(&mut self) {
        if self.receiving_from_mcu {
            return;
        }
        let (Some(command), Some(property)) =
            (self.map.sensor_selection, self.sensor_selection.as_ref())
        else {
            return;
        };
        let Some(index) = property.enum_index() else {
            return;
        };
        let frame = [
            Self::SYNC1,
            Self::SYNC2,
            0x00,
            0x06,
            0x00,
            0x05,
            command,
            0x05,
            0x00,
            0x01,
            index,
        ];
        self.transmit(&frame);
    }

    fn schedules_to_mcu(&mut self) {
        if self.receiving_from_mcu {
            return;
        }
        let Some(command) = self.map.schedules else {
            return;
        };
        let frame = self.schedules.encode(command);
        self.transmit(&frame);
        // a confirmed local write, not an observed report: notify always
        self.notify_schedules();
    }

    /// Hand a frame to the transport. Fire-and-forget: checksumming and
    /// retries belong to the surrounding protocol engine.
    fn transmit(&mut self, frame: &[u8]) {
        debug!("Sending command: {}", bytes_to_hex(frame));
        if let Err(e) = self.transport.write(frame) {
            error!("Write error: {:?}", e);
        }
    }

    fn notify_state(&mut self) {
        if let Some(listener) = self.state_listener.as_mut() {
            listener();
        }
    }

    fn notify_schedules(&mut self) {
        if let Some(listener) = self.schedules_listener.as_mut() {
            listener();
        }
    }

    pub fn command_map(&self) -> &CommandByteMap {
        &self.map
    }

    /// Whether an MCU report is currently being applied
    pub fn is_receiving_from_mcu(&self) -> bool {
        self.receiving_from_mcu
    }

    pub fn device_on(&self) -> Option<bool> {
        self.device_on.as_bool()
    }

    /// Measured room temperature in degrees
    pub fn temperature(&self) -> Option<f32> {
        self.temperature.as_number()
    }

    pub fn target_temperature(&self) -> Option<f32> {
        self.target_temperature.as_number()
    }

    pub fn floor_temperature(&self) -> Option<f32> {
        self.floor_temperature.as_ref().and_then(Property::as_number)
    }

    pub fn locked(&self) -> Option<bool> {
        self.locked.as_bool()
    }

    pub fn schedules_mode(&self) -> Option<&str> {
        self.schedules_mode.as_str()
    }

    pub fn status_mode(&self) -> Option<&str> {
        self.status_mode.as_ref().and_then(Property::as_str)
    }

    pub fn sensor_selection(&self) -> Option<&str> {
        self.sensor_selection.as_ref().and_then(Property::as_str)
    }

    /// The weekly schedule as stored, placeholders excluded
    pub fn schedules(&self) -> &[u8] {
        self.schedules.as_bytes()
    }
}
