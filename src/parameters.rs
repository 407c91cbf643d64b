use serde::{Deserialize, Serialize};

use crate::error::{DmxError, Result};

pub const BREAK_TIME_RANGE: std::ops::RangeInclusive<u8> = 9..=127;
pub const MAB_TIME_RANGE: std::ops::RangeInclusive<u8> = 1..=127;
pub const OUTPUT_RATE_RANGE: std::ops::RangeInclusive<u8> = 0..=40;
pub const MAX_USER_DEFINED_BYTES: usize = 512;

/// Output timing sent with a set-widget-parameters request.
///
/// Break and mark-after-break are in units of 10.67 µs, the rate is in
/// packets per second (0 = as fast as possible). Nothing is stored on the
/// controller side; each request is fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimingParameters {
    #[serde(default = "default_break_time")]
    pub break_time: u8,
    #[serde(default = "default_mab_time")]
    pub mab_time: u8,
    #[serde(default = "default_output_rate")]
    pub output_rate: u8,
    #[serde(default)]
    pub user_defined_bytes: Vec<u8>,
}

fn default_break_time() -> u8 {
    9
}

fn default_mab_time() -> u8 {
    1
}

fn default_output_rate() -> u8 {
    40
}

impl Default for TimingParameters {
    fn default() -> Self {
        TimingParameters {
            break_time: default_break_time(),
            mab_time: default_mab_time(),
            output_rate: default_output_rate(),
            user_defined_bytes: Vec::new(),
        }
    }
}

impl TimingParameters {
    pub fn new(break_time: u8, mab_time: u8, output_rate: u8) -> Self {
        TimingParameters {
            break_time,
            mab_time,
            output_rate,
            user_defined_bytes: Vec::new(),
        }
    }

    pub fn with_user_defined_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.user_defined_bytes = bytes;
        self
    }

    /// Check every field, reporting the first one out of range.
    pub fn validate(&self) -> Result<()> {
        check_range("break_time", self.break_time, &BREAK_TIME_RANGE)?;
        check_range("mab_time", self.mab_time, &MAB_TIME_RANGE)?;
        check_range("output_rate", self.output_rate, &OUTPUT_RATE_RANGE)?;
        if self.user_defined_bytes.len() > MAX_USER_DEFINED_BYTES {
            return Err(DmxError::invalid_parameter(
                "user_defined_bytes",
                format!(
                    "length {} is greater than {}",
                    self.user_defined_bytes.len(),
                    MAX_USER_DEFINED_BYTES
                ),
            ));
        }
        Ok(())
    }

    /// Request body: user-defined length (LE), break, MAB, rate, user bytes.
    pub fn to_body(&self) -> Result<Vec<u8>> {
        self.validate()?;
        let udb_len = self.user_defined_bytes.len() as u16;

        let mut body = Vec::with_capacity(5 + self.user_defined_bytes.len());
        body.extend_from_slice(&udb_len.to_le_bytes());
        body.push(self.break_time);
        body.push(self.mab_time);
        body.push(self.output_rate);
        body.extend_from_slice(&self.user_defined_bytes);
        Ok(body)
    }
}

fn check_range(field: &'static str, value: u8, range: &std::ops::RangeInclusive<u8>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(DmxError::invalid_parameter(
            field,
            format!(
                "{} is not between {} and {}",
                value,
                range.start(),
                range.end()
            ),
        ))
    }
}
