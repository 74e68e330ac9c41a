//! Driver for Tuya MCU based wall thermostats with support for multiple
//! transport backends.
//!
//! The thermostat's control MCU speaks a compact, position-addressed serial
//! protocol (`55 AA` framed). This crate translates the status commands the
//! MCU reports into domain properties (power, temperatures, operating mode,
//! lock state, sensor selection, weekly schedule) and turns local property
//! writes back into outbound command frames. Sync-marker hunting,
//! checksumming and retries on the serial line belong to the surrounding
//! protocol engine; the driver stays silent on command bytes it does not
//! understand so the many unrelated vendor commands sharing the line pass
//! through untouched.
//!
//! # Features
//!
//! - `uart-esp32` - UART transport for ESP32 using esp-idf-svc
//! - `serial` - Serial port transport for desktop using serialport crate
//!
//! # Example
//!
//! ```ignore
//! use tuya_thermostat::{CommandByteMap, SerialTransport, Thermostat};
//!
//! let transport = SerialTransport::new("/dev/ttyUSB0")?;
//! let mut thermostat = Thermostat::new(transport, CommandByteMap::hy316ww());
//!
//! // a status frame handed over by the surrounding protocol engine
//! let frame = [0x55, 0xAA, 0x03, 0x07, 0x00, 0x05, 0x74, 0x04, 0x00, 0x01, 0x01];
//! thermostat.process_status_command(frame[6], frame[5], &frame);
//! assert_eq!(thermostat.sensor_selection(), Some("floor"));
//! ```

mod command_map;
mod property;
mod schedule;
mod thermostat;
mod transport;
mod types;

#[cfg(feature = "uart-esp32")]
mod uart;

#[cfg(feature = "serial")]
mod serial;

// Re-exports
pub use command_map::CommandByteMap;
pub use property::{Property, Visibility};
pub use schedule::ScheduleStore;
pub use thermostat::{CommandStatus, Thermostat};
pub use transport::McuTransport;
pub use types::{
    ThermostatError, SCHEDULES_MODE_AUTO, SCHEDULES_MODE_HOLD, SCHEDULES_MODE_OFF,
    SENSOR_SELECTION_BOTH, SENSOR_SELECTION_FLOOR, SENSOR_SELECTION_INTERNAL, STATE_HEATING,
    STATE_OFF,
};

#[cfg(feature = "uart-esp32")]
pub use uart::UartTransport;

#[cfg(feature = "serial")]
pub use serial::SerialTransport;

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Transport that records every transmitted frame
    struct RecordingTransport {
        sent: Rc<RefCell<Vec<Vec<u8>>>>,
    }

    impl RecordingTransport {
        fn new() -> (Self, Rc<RefCell<Vec<Vec<u8>>>>) {
            let sent = Rc::new(RefCell::new(Vec::new()));
            (Self { sent: Rc::clone(&sent) }, sent)
        }
    }

    impl McuTransport for RecordingTransport {
        type Error = std::io::Error;

        fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
            self.sent.borrow_mut().push(data.to_vec());
            Ok(data.len())
        }
    }

    fn hy316ww() -> (Thermostat<RecordingTransport>, Rc<RefCell<Vec<Vec<u8>>>>) {
        let (transport, sent) = RecordingTransport::new();
        (Thermostat::new(transport, CommandByteMap::hy316ww()), sent)
    }

    fn bht_002() -> (Thermostat<RecordingTransport>, Rc<RefCell<Vec<Vec<u8>>>>) {
        let (transport, sent) = RecordingTransport::new();
        (Thermostat::new(transport, CommandByteMap::bht_002()), sent)
    }

    fn counter(
        thermostat: &mut Thermostat<RecordingTransport>,
        schedules: bool,
    ) -> Rc<RefCell<u32>> {
        let count = Rc::new(RefCell::new(0u32));
        let hook = Rc::clone(&count);
        if schedules {
            thermostat.on_schedules_change(move || *hook.borrow_mut() += 1);
        } else {
            thermostat.on_state_change(move || *hook.borrow_mut() += 1);
        }
        count
    }

    fn bool_frame(command: u8, value: u8) -> [u8; 11] {
        [0x55, 0xAA, 0x03, 0x07, 0x00, 0x05, command, 0x01, 0x00, 0x01, value]
    }

    fn enum_frame(command: u8, value: u8) -> [u8; 11] {
        [0x55, 0xAA, 0x03, 0x07, 0x00, 0x05, command, 0x04, 0x00, 0x01, value]
    }

    fn value_frame(command: u8, raw: i32) -> [u8; 14] {
        let b = raw.to_be_bytes();
        [
            0x55, 0xAA, 0x03, 0x07, 0x00, 0x08, command, 0x02, 0x00, 0x04, b[0], b[1], b[2], b[3],
        ]
    }

    fn schedule_frame(command: u8, region: &[u8]) -> Vec<u8> {
        let mut frame = vec![0x55, 0xAA, 0x03, 0x07, 0x00, 0x0D, command, 0x00, 0x00, 0x09];
        frame.extend_from_slice(region);
        frame
    }

    // ===================
    // base field reports
    // ===================

    #[test]
    fn test_device_on_report() {
        let (mut thermostat, _) = hy316ww();

        let frame = bool_frame(0x01, 0x01);
        let status = thermostat.process_status_command(0x01, 0x05, &frame);
        assert!(status.recognized);
        assert!(status.changed);
        assert_eq!(thermostat.device_on(), Some(true));

        // unchanged on repeat
        let status = thermostat.process_status_command(0x01, 0x05, &frame);
        assert!(status.recognized);
        assert!(!status.changed);
    }

    #[test]
    fn test_actual_temperature_report() {
        let (mut thermostat, _) = hy316ww();

        // HY316WW reports tenths of a degree
        let frame = value_frame(0x03, 215);
        let status = thermostat.process_status_command(0x03, 0x08, &frame);
        assert!(status.recognized);
        assert_eq!(thermostat.temperature(), Some(21.5));
    }

    #[test]
    fn test_target_temperature_report() {
        let (mut thermostat, _) = hy316ww();

        let frame = value_frame(0x02, 230);
        thermostat.process_status_command(0x02, 0x08, &frame);
        assert_eq!(thermostat.target_temperature(), Some(23.0));
    }

    #[test]
    fn test_negative_temperature_report() {
        let (mut thermostat, _) = hy316ww();

        let frame = value_frame(0x03, -55);
        thermostat.process_status_command(0x03, 0x08, &frame);
        assert_eq!(thermostat.temperature(), Some(-5.5));
    }

    #[test]
    fn test_temperature_length_gate() {
        let (mut thermostat, _) = hy316ww();

        let frame = bool_frame(0x03, 0x01);
        let status = thermostat.process_status_command(0x03, 0x05, &frame);
        assert!(!status.recognized);
        assert_eq!(thermostat.temperature(), None);
    }

    #[test]
    fn test_locked_report() {
        let (mut thermostat, _) = hy316ww();

        thermostat.process_status_command(0x06, 0x05, &bool_frame(0x06, 0x01));
        assert_eq!(thermostat.locked(), Some(true));
        thermostat.process_status_command(0x06, 0x05, &bool_frame(0x06, 0x00));
        assert_eq!(thermostat.locked(), Some(false));
    }

    #[test]
    fn test_schedules_mode_report() {
        let (mut thermostat, _) = hy316ww();

        let status = thermostat.process_status_command(0x04, 0x05, &enum_frame(0x04, 0x02));
        assert!(status.recognized);
        assert_eq!(thermostat.schedules_mode(), Some("hold"));
    }

    #[test]
    fn test_floor_temperature_on_bht_002() {
        let (mut thermostat, _) = bht_002();

        // BHT-002 uses 0x66 for the floor sensor, in half degrees
        let frame = value_frame(0x66, 43);
        let status = thermostat.process_status_command(0x66, 0x08, &frame);
        assert!(status.recognized);
        assert_eq!(thermostat.floor_temperature(), Some(21.5));
        assert_eq!(thermostat.status_mode(), None);
    }

    #[test]
    fn test_floor_temperature_unsupported_on_hy316ww() {
        let (thermostat, _) = hy316ww();
        assert_eq!(thermostat.floor_temperature(), None);
    }

    // ===================
    // model field reports
    // ===================

    #[test]
    fn test_status_mode_report() {
        let (mut thermostat, _) = hy316ww();

        let status = thermostat.process_status_command(0x66, 0x05, &enum_frame(0x66, 0x01));
        assert!(status.recognized);
        assert!(status.changed);
        assert_eq!(thermostat.status_mode(), Some("heating"));

        let status = thermostat.process_status_command(0x66, 0x05, &enum_frame(0x66, 0x00));
        assert!(status.changed);
        assert_eq!(thermostat.status_mode(), Some("off"));
    }

    #[test]
    fn test_status_mode_out_of_range_value() {
        let (mut thermostat, _) = hy316ww();

        let status = thermostat.process_status_command(0x66, 0x05, &enum_frame(0x66, 0x05));
        assert!(!status.recognized);
        assert!(!status.changed);
        assert_eq!(thermostat.status_mode(), None);
    }

    #[test]
    fn test_status_mode_length_gate() {
        let (mut thermostat, _) = hy316ww();

        let frame = value_frame(0x66, 0x01);
        let status = thermostat.process_status_command(0x66, 0x08, &frame);
        assert!(!status.recognized);
        assert_eq!(thermostat.status_mode(), None);
    }

    #[test]
    fn test_sensor_selection_report() {
        let (mut thermostat, sent) = hy316ww();
        let notifications = counter(&mut thermostat, false);

        let status = thermostat.process_status_command(0x74, 0x05, &enum_frame(0x74, 0x01));
        assert!(status.recognized);
        assert!(status.changed);
        assert_eq!(thermostat.sensor_selection(), Some("floor"));
        assert_eq!(*notifications.borrow(), 1);
        // the change came from the MCU: it must not be echoed back
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn test_sensor_selection_report_idempotent() {
        let (mut thermostat, _) = hy316ww();
        let notifications = counter(&mut thermostat, false);

        let frame = enum_frame(0x74, 0x02);
        let status = thermostat.process_status_command(0x74, 0x05, &frame);
        assert!(status.changed);
        let status = thermostat.process_status_command(0x74, 0x05, &frame);
        assert!(status.recognized);
        assert!(!status.changed);
        assert_eq!(*notifications.borrow(), 1);
    }

    #[test]
    fn test_consumed_commands_acknowledged_without_effect() {
        let consumed = CommandByteMap::hy316ww().consumed_commands;
        for &command in consumed {
            let (mut thermostat, sent) = hy316ww();
            let notifications = counter(&mut thermostat, false);

            let frame = value_frame(command, 0x1234);
            let status = thermostat.process_status_command(command, 0x08, &frame);
            assert!(status.recognized, "command 0x{command:02X} not acknowledged");
            assert!(!status.changed);

            assert_eq!(thermostat.device_on(), None);
            assert_eq!(thermostat.temperature(), None);
            assert_eq!(thermostat.status_mode(), None);
            assert_eq!(thermostat.sensor_selection(), None);
            assert_eq!(*notifications.borrow(), 0);
            assert!(sent.borrow().is_empty());
        }
    }

    #[test]
    fn test_unknown_command() {
        let (mut thermostat, _) = hy316ww();

        let status = thermostat.process_status_command(0x42, 0x05, &enum_frame(0x42, 0x01));
        assert!(!status.recognized);
        assert!(!status.changed);
    }

    #[test]
    fn test_sensor_selection_unknown_on_bht_002() {
        let (mut thermostat, _) = bht_002();

        let status = thermostat.process_status_command(0x74, 0x05, &enum_frame(0x74, 0x01));
        assert!(!status.recognized);
        assert_eq!(thermostat.sensor_selection(), None);
    }

    #[test]
    fn test_guard_cleared_after_processing() {
        let (mut thermostat, _) = hy316ww();
        assert!(!thermostat.is_receiving_from_mcu());
        thermostat.process_status_command(0x74, 0x05, &enum_frame(0x74, 0x01));
        assert!(!thermostat.is_receiving_from_mcu());
    }

    // ===================
    // schedule reports
    // ===================

    #[test]
    fn test_schedule_report() {
        let (mut thermostat, sent) = hy316ww();
        let state_notifications = counter(&mut thermostat, false);
        let schedule_notifications = counter(&mut thermostat, true);

        let region: Vec<u8> = (0..32).collect();
        let frame = schedule_frame(0x77, &region);
        let status = thermostat.process_status_command(0x77, 0x0D, &frame);
        assert!(status.recognized);
        // schedule changes report on their own channel
        assert!(!status.changed);
        assert_eq!(*state_notifications.borrow(), 0);
        assert_eq!(*schedule_notifications.borrow(), 1);
        assert!(sent.borrow().is_empty());

        // placeholders at 2, 6, .., 30 are dropped, the rest packed in order
        let expected: Vec<u8> = (0..32u8).filter(|i| i % 4 != 2).collect();
        assert_eq!(thermostat.schedules(), &expected[..]);
    }

    #[test]
    fn test_schedule_report_idempotent() {
        let (mut thermostat, _) = hy316ww();
        let schedule_notifications = counter(&mut thermostat, true);

        let frame = schedule_frame(0x77, &[0x21; 32]);
        thermostat.process_status_command(0x77, 0x0D, &frame);
        thermostat.process_status_command(0x77, 0x0D, &frame);
        assert_eq!(*schedule_notifications.borrow(), 1);
    }

    #[test]
    fn test_schedule_report_length_gate() {
        let (mut thermostat, _) = hy316ww();

        let frame = schedule_frame(0x77, &[0x21; 32]);
        let status = thermostat.process_status_command(0x77, 0x0C, &frame);
        assert!(!status.recognized);
        assert_eq!(thermostat.schedules(), &[0u8; 24][..]);
    }

    #[test]
    fn test_schedule_report_truncated_frame() {
        let (mut thermostat, _) = hy316ww();

        let frame = schedule_frame(0x77, &[0x21; 16]);
        let status = thermostat.process_status_command(0x77, 0x0D, &frame);
        assert!(!status.recognized);
    }

    // ===================
    // local writes
    // ===================

    #[test]
    fn test_set_sensor_selection_frame() {
        let (mut thermostat, sent) = hy316ww();

        let changed = thermostat.set_sensor_selection("both").unwrap();
        assert!(changed);
        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            vec![0x55, 0xAA, 0x00, 0x06, 0x00, 0x05, 0x74, 0x05, 0x00, 0x01, 0x02]
        );
    }

    #[test]
    fn test_set_sensor_selection_unchanged_sends_once() {
        let (mut thermostat, sent) = hy316ww();

        assert!(thermostat.set_sensor_selection("internal").unwrap());
        assert!(!thermostat.set_sensor_selection("internal").unwrap());
        assert_eq!(sent.borrow().len(), 1);
    }

    #[test]
    fn test_set_sensor_selection_invalid_value() {
        let (mut thermostat, sent) = hy316ww();

        let result = thermostat.set_sensor_selection("outdoor");
        assert!(matches!(result, Err(ThermostatError::InvalidParameter(_))));
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn test_set_sensor_selection_unsupported_model() {
        let (mut thermostat, sent) = bht_002();

        let result = thermostat.set_sensor_selection("floor");
        assert!(matches!(result, Err(ThermostatError::InvalidParameter(_))));
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn test_set_schedules_frame_layout() {
        let (mut thermostat, sent) = hy316ww();

        let data: Vec<u8> = (1..=24).collect();
        thermostat.set_schedules(&data).unwrap();

        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        #[rustfmt::skip]
        let expected = vec![
            0x55, 0xAA, 0x03, 0x07, 0x00, 0x0D, 0x77, 0x00, 0x00, 0x09,
            1, 2, 0, 3,
            4, 5, 0, 6,
            7, 8, 0, 9,
            10, 11, 0, 12,
            13, 14, 0, 15,
            16, 17, 0, 18,
            19, 20, 0, 21,
            22, 23, 0, 24,
        ];
        assert_eq!(sent[0], expected);
    }

    #[test]
    fn test_set_schedules_notifies_unconditionally() {
        let (mut thermostat, sent) = hy316ww();
        let schedule_notifications = counter(&mut thermostat, true);

        let data = [0x17; 24];
        thermostat.set_schedules(&data).unwrap();
        thermostat.set_schedules(&data).unwrap();
        // a local write is a confirmed change even when no byte differs
        assert_eq!(*schedule_notifications.borrow(), 2);
        assert_eq!(sent.borrow().len(), 2);
    }

    #[test]
    fn test_set_schedules_wrong_length() {
        let (mut thermostat, sent) = hy316ww();

        let result = thermostat.set_schedules(&[0x00; 23]);
        assert!(matches!(result, Err(ThermostatError::InvalidParameter(_))));
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn test_schedule_write_round_trips_through_report() {
        let (mut sender, sent) = hy316ww();
        let (mut receiver, _) = hy316ww();

        let data: Vec<u8> = (0..24).map(|i| 0x40 | i).collect();
        sender.set_schedules(&data).unwrap();

        let frame = sent.borrow()[0].clone();
        let status = receiver.process_status_command(frame[6], frame[5], &frame);
        assert!(status.recognized);
        assert_eq!(receiver.schedules(), &data[..]);
    }
}
