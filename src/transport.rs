use std::io::Write;
use std::thread;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serialport::SerialPort;

use crate::error::{DmxError, Result};

/// Byte sink the controllers write frames to.
pub trait Transport {
    /// Write the whole frame, blocking until done or failed.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Release the underlying device. Called at most once by the controllers.
    fn close(&mut self) -> Result<()>;
}

/// Serial line settings used when opening the widget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SerialSettings {
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_baud_rate() -> u32 {
    57600
}

fn default_timeout_ms() -> u64 {
    1000
}

impl Default for SerialSettings {
    fn default() -> Self {
        SerialSettings {
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Widget connection over a serial port
pub struct SerialTransport {
    name: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open the serial port at `path` (8N1, no flow control).
    pub fn open(path: &str, settings: &SerialSettings) -> Result<Self> {
        let mut port = serialport::new(path, settings.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(settings.timeout_ms))
            .open()?;

        if let Err(e) = port.write_data_terminal_ready(true) {
            warn!("Failed to set DTR on {}: {}", path, e);
        }

        // Allow the widget to settle after the line changes
        thread::sleep(Duration::from_millis(100));

        info!("Opened {} @ {} baud", path, settings.baud_rate);

        Ok(SerialTransport {
            name: path.to_string(),
            port: Some(port),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self
            .port
            .as_mut()
            .ok_or(DmxError::ClosedConnection)?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        match self.port.take() {
            Some(mut port) => {
                let flushed = port.flush();
                drop(port);
                info!("Closed {}", self.name);
                flushed?;
                Ok(())
            }
            None => Err(DmxError::ClosedConnection),
        }
    }
}
