/// Trait for thermostat MCU communication backends.
/// Implement this trait for different transports (UART, serial port, etc.)
///
/// The driver only ever writes: command frames are fire-and-forget, and
/// reading the serial line belongs to the protocol engine that frames and
/// dispatches incoming bytes.
pub trait McuTransport {
    /// Error type for transport operations
    type Error: std::fmt::Debug;

    /// Write a complete command frame to the MCU serial line
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;
}
