//! Error types for the widget driver.

use thiserror::Error;

/// Errors raised by the controllers, the frame codec and port discovery.
#[derive(Debug, Error)]
pub enum DmxError {
    /// Universe size outside 24..=512.
    #[error("size of DMX channel frame must be between 24 and 512, got {0}")]
    InvalidSize(usize),

    /// Channel number outside 1..=size.
    #[error("channel {channel} out of range 1..={size}")]
    OutOfRange { channel: usize, size: usize },

    /// A request field outside its documented range.
    #[error("invalid parameter {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    /// Write/flush/close failure from the transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Open or configuration failure from the serial port layer.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Port discovery found no matching device.
    #[error("no serial device found with {0}")]
    NotFound(String),

    /// The controller was already closed.
    #[error("connection closed")]
    ClosedConnection,
}

impl DmxError {
    pub(crate) fn invalid_parameter(field: &'static str, reason: impl Into<String>) -> Self {
        DmxError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// True for failures reported by the transport rather than by validation.
    pub fn is_transport(&self) -> bool {
        matches!(self, DmxError::Io(_) | DmxError::Serial(_))
    }
}

/// Result type alias using DmxError.
pub type Result<T> = std::result::Result<T, DmxError>;
