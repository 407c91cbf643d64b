use crate::error::{DmxError, Result};

pub const MIN_UNIVERSE_SIZE: usize = 24;
pub const MAX_UNIVERSE_SIZE: usize = 512;

/// Slot values of one DMX universe, addressed by channel number 1..=size.
///
/// The size is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBuffer {
    slots: Vec<u8>,
}

impl ChannelBuffer {
    pub fn new(size: usize) -> Result<Self> {
        if !(MIN_UNIVERSE_SIZE..=MAX_UNIVERSE_SIZE).contains(&size) {
            return Err(DmxError::InvalidSize(size));
        }
        Ok(ChannelBuffer {
            slots: vec![0; size],
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; a universe holds at least 24 slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn set_channel(&mut self, channel: usize, value: u8) -> Result<()> {
        let idx = self.index(channel)?;
        self.slots[idx] = value;
        Ok(())
    }

    pub fn get_channel(&self, channel: usize) -> Result<u8> {
        let idx = self.index(channel)?;
        Ok(self.slots[idx])
    }

    pub fn set_all(&mut self, value: u8) {
        self.slots.fill(value);
    }

    pub fn clear(&mut self) {
        self.set_all(0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.slots
    }

    /// Copy another buffer's values into this one; sizes must match.
    pub(crate) fn copy_from(&mut self, other: &ChannelBuffer) {
        self.slots.copy_from_slice(&other.slots);
    }

    fn index(&self, channel: usize) -> Result<usize> {
        if channel == 0 || channel > self.slots.len() {
            return Err(DmxError::OutOfRange {
                channel,
                size: self.slots.len(),
            });
        }
        Ok(channel - 1)
    }
}

impl AsRef<[u8]> for ChannelBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.slots
    }
}
