//! Types for thermostat operations

use std::fmt;

/// Status mode reported by the MCU while the relay is driving the load
pub const STATE_OFF: &str = "off";
pub const STATE_HEATING: &str = "heating";

/// Weekly schedule operating modes
pub const SCHEDULES_MODE_OFF: &str = "off";
pub const SCHEDULES_MODE_AUTO: &str = "auto";
pub const SCHEDULES_MODE_HOLD: &str = "hold";

/// Which temperature sensor drives the control loop
pub const SENSOR_SELECTION_INTERNAL: &str = "internal";
pub const SENSOR_SELECTION_FLOOR: &str = "floor";
pub const SENSOR_SELECTION_BOTH: &str = "both";

/// Errors that can occur during thermostat operations
///
/// Status frames reported by the MCU never produce an error: anything the
/// driver does not understand is reported back as "not recognized" so the
/// surrounding protocol engine can try other handlers.
#[derive(Debug)]
pub enum ThermostatError {
    /// Transport layer error (UART, serial, etc.)
    Transport(String),
    /// Invalid parameter passed to a function
    InvalidParameter(String),
}

impl fmt::Display for ThermostatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThermostatError::Transport(msg) => write!(f, "transport error: {msg}"),
            ThermostatError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
        }
    }
}

impl std::error::Error for ThermostatError {}

/// Convert bytes to uppercase hex string
pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}
