//! Weekly schedule codec.
//!
//! The MCU transmits the weekly schedule as a flat data region in which the
//! real schedule bytes are interleaved with fixed placeholder bytes: offset 2
//! is a placeholder, and past it every offset where `(offset + 2) % 4 == 0`.
//! The store keeps only the real bytes, packed in transmission order as
//! (hour, minute, raw temperature) triplets. Both codec directions must apply
//! the identical pattern or schedules corrupt silently.

/// Declared payload length of a schedule report frame
pub(crate) const SCHEDULES_DATA_LENGTH: u8 = 0x0D;

/// Fixed function-length byte of an outbound schedule write
const FUNCTION_LENGTH: u8 = 0x09;

/// Placeholder positions within the schedule data region
fn is_placeholder(offset: usize) -> bool {
    offset == 2 || (offset > 2 && (offset + 2) % 4 == 0)
}

/// The week's schedule with device placeholder bytes removed
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    data: Vec<u8>,
}

impl ScheduleStore {
    /// Create an empty store for `entries` (hour, minute, temperature) slots
    pub fn new(entries: usize) -> Self {
        Self {
            data: vec![0; entries * 3],
        }
    }

    /// Store length in bytes, placeholders excluded
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// On-wire data region length: one placeholder byte per entry
    pub fn region_len(&self) -> usize {
        self.data.len() / 3 * 4
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Replace the whole store. `data` must be exactly `len()` bytes.
    pub(crate) fn copy_from(&mut self, data: &[u8]) {
        self.data.copy_from_slice(data);
    }

    /// Unpack a received data region into the store, skipping placeholders.
    /// Returns whether any stored byte changed. `region` must be at least
    /// `region_len()` bytes.
    pub fn decode(&mut self, region: &[u8]) -> bool {
        let mut changed = false;
        let mut ii = 0;
        for (offset, &new_byte) in region.iter().enumerate().take(self.region_len()) {
            if is_placeholder(offset) {
                continue;
            }
            changed = changed || new_byte != self.data[ii];
            self.data[ii] = new_byte;
            ii += 1;
        }
        changed
    }

    /// Build a complete outbound schedule write frame, re-inserting a zero
    /// byte at every placeholder position
    pub fn encode(&self, command: u8) -> Vec<u8> {
        let region = self.region_len();
        let mut frame = Vec::with_capacity(region + 10);
        frame.extend_from_slice(&[
            0x55,
            0xAA,
            0x03,
            0x07,
            0x00,
            SCHEDULES_DATA_LENGTH,
            command,
            0x00,
            0x00,
            FUNCTION_LENGTH,
        ]);
        let mut ii = 0;
        for offset in 0..region {
            if is_placeholder(offset) {
                frame.push(0x00);
            } else {
                frame.push(self.data[ii]);
                ii += 1;
            }
        }
        frame
    }
}
