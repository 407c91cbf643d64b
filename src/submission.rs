//! Differential submission.
//!
//! A DMX packet always carries a contiguous run of slots starting at
//! channel 1, so only trailing unchanged slots can be left out. The minimal
//! submission ends at the last slot that differs from what the widget was
//! last sent.

use crate::buffer::ChannelBuffer;
use crate::error::Result;

/// Shortest packet sent in differential mode.
pub const MIN_SUBMISSION_SLOTS: usize = 24;

/// Prefix of `current` up to and including its last slot that differs from
/// `last_submitted`. Empty when both are equal.
pub fn minimal_submission<'a>(current: &'a [u8], last_submitted: &[u8]) -> &'a [u8] {
    match current
        .iter()
        .zip(last_submitted)
        .rposition(|(now, before)| now != before)
    {
        Some(last_diff) => &current[..=last_diff],
        None => &[],
    }
}

/// Slots to send for `current`, or `None` when nothing needs sending.
///
/// Without differential mode the full buffer is always sent. With it, an
/// unchanged buffer is skipped and short slices are widened to the first
/// `MIN_SUBMISSION_SLOTS` slots.
pub fn plan_submission<'a>(
    current: &'a [u8],
    last_submitted: &[u8],
    differential: bool,
) -> Option<&'a [u8]> {
    if !differential {
        return Some(current);
    }

    let minimal = minimal_submission(current, last_submitted);
    if minimal.is_empty() {
        None
    } else if minimal.len() <= MIN_SUBMISSION_SLOTS {
        Some(&current[..MIN_SUBMISSION_SLOTS.min(current.len())])
    } else {
        Some(minimal)
    }
}

/// Caller-visible channel state plus the snapshot last written to the widget.
#[derive(Debug, Clone)]
pub struct Universe {
    current: ChannelBuffer,
    last_submitted: ChannelBuffer,
}

impl Universe {
    pub fn new(size: usize) -> Result<Self> {
        let current = ChannelBuffer::new(size)?;
        Ok(Universe {
            last_submitted: current.clone(),
            current,
        })
    }

    pub fn channels(&self) -> &ChannelBuffer {
        &self.current
    }

    pub fn channels_mut(&mut self) -> &mut ChannelBuffer {
        &mut self.current
    }

    pub fn last_submitted(&self) -> &ChannelBuffer {
        &self.last_submitted
    }

    pub fn pending(&self, differential: bool) -> Option<&[u8]> {
        plan_submission(
            self.current.as_slice(),
            self.last_submitted.as_slice(),
            differential,
        )
    }

    /// Record the whole current buffer as sent, not only the sent slice.
    pub fn mark_submitted(&mut self) {
        self.last_submitted.copy_from(&self.current);
    }
}
