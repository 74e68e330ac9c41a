//! Serial port transport for desktop using serialport crate

use crate::transport::McuTransport;
use std::time::Duration;

/// The MCU's native line speed
const DEFAULT_BAUD_RATE: u32 = 9600;

pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    /// Open a serial port at the thermostat MCU's native 9600 baud
    pub fn new(port_name: &str) -> Result<Self, serialport::Error> {
        Self::with_baud_rate(port_name, DEFAULT_BAUD_RATE)
    }

    pub fn with_baud_rate(port_name: &str, baud_rate: u32) -> Result<Self, serialport::Error> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_secs(1))
            .open()?;
        port.clear(serialport::ClearBuffer::Input)?;

        Ok(Self { port })
    }
}

impl McuTransport for SerialTransport {
    type Error = std::io::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.port, data)
    }
}
