//! Driver for DMX USB Pro style widgets.
//!
//! Channel state is kept per universe and written to the widget as framed
//! requests over a serial line. In differential mode only the changed
//! prefix of the universe is sent.
//!
//! ```rust,no_run
//! use dmx_widget::{Controller, ControllerConfig, SerialSettings, TimingParameters};
//!
//! # fn main() -> dmx_widget::Result<()> {
//! let config = ControllerConfig {
//!     differential: true,
//!     ..ControllerConfig::default()
//! };
//! let mut dmx = Controller::open("/dev/ttyUSB0", &SerialSettings::default(), config)?;
//! dmx.set_dmx_parameters(&TimingParameters::default())?;
//! dmx.set_channel(1, 255, None)?;
//! dmx.set_channel(2, 128, Some(true))?;
//! dmx.close()?;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod controller;
pub mod error;
pub mod mk2;
pub mod parameters;
pub mod ports;
pub mod protocol;
pub mod submission;
pub mod transport;

pub use buffer::ChannelBuffer;
pub use config::Config;
pub use controller::{Controller, ControllerConfig};
pub use error::{DmxError, Result};
pub use mk2::Mk2Controller;
pub use parameters::TimingParameters;
pub use protocol::{Operation, Port};
pub use transport::{SerialSettings, SerialTransport, Transport};
