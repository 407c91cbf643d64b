//! Controller for the two-port DMX USB Pro Mk2.
//!
//! Each port keeps its own universe and submitted snapshot, so changing or
//! submitting one port never sends or marks data on the other.

use log::{info, trace};

use crate::buffer::ChannelBuffer;
use crate::controller::{Connection, ControllerConfig};
use crate::error::Result;
use crate::parameters::TimingParameters;
use crate::protocol::{build_parameters_frame, build_send_dmx_frame, Operation, Port};
use crate::submission::Universe;
use crate::transport::{SerialSettings, SerialTransport, Transport};

pub struct Mk2Controller<T: Transport = SerialTransport> {
    config: ControllerConfig,
    universes: [Universe; 2],
    connection: Connection<T>,
}

impl Mk2Controller<SerialTransport> {
    pub fn open(path: &str, serial: &SerialSettings, config: ControllerConfig) -> Result<Self> {
        let universes = Self::universes(&config)?;
        let transport = SerialTransport::open(path, serial)?;
        info!(
            "DMX Mk2 controller on {} ({} channels per port, auto submit {}, differential {})",
            path, config.dmx_size, config.auto_submit, config.differential
        );
        Ok(Mk2Controller {
            config,
            universes,
            connection: Connection::new(transport),
        })
    }
}

impl<T: Transport> Mk2Controller<T> {
    pub fn with_transport(transport: T, config: ControllerConfig) -> Result<Self> {
        let connection = Connection::new(transport);
        let universes = Self::universes(&config)?;
        Ok(Mk2Controller {
            config,
            universes,
            connection,
        })
    }

    fn universes(config: &ControllerConfig) -> Result<[Universe; 2]> {
        Ok([Universe::new(config.dmx_size)?, Universe::new(config.dmx_size)?])
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn dmx_size(&self) -> usize {
        self.config.dmx_size
    }

    pub fn set_auto_submit(&mut self, auto_submit: bool) {
        self.config.auto_submit = auto_submit;
    }

    pub fn set_differential(&mut self, differential: bool) {
        self.config.differential = differential;
    }

    pub fn channels(&self, port: Port) -> &[u8] {
        self.universes[port.index()].channels().as_slice()
    }

    pub fn last_submitted(&self, port: Port) -> &[u8] {
        self.universes[port.index()].last_submitted().as_slice()
    }

    pub fn set_channel(
        &mut self,
        port: Port,
        channel: usize,
        value: u8,
        submit_after: Option<bool>,
    ) -> Result<()> {
        self.apply_and_maybe_submit(port, submit_after, |buffer| buffer.set_channel(channel, value))
    }

    pub fn set_all_channels(&mut self, port: Port, value: u8, submit_after: Option<bool>) -> Result<()> {
        self.apply_and_maybe_submit(port, submit_after, |buffer| {
            buffer.set_all(value);
            Ok(())
        })
    }

    pub fn all_channels_on(&mut self, port: Port, submit_after: Option<bool>) -> Result<()> {
        self.set_all_channels(port, 255, submit_after)
    }

    pub fn clear_channels(&mut self, port: Port, submit_after: Option<bool>) -> Result<()> {
        self.apply_and_maybe_submit(port, submit_after, |buffer| {
            buffer.clear();
            Ok(())
        })
    }

    pub fn get_channel(&self, port: Port, channel: usize) -> Result<u8> {
        self.connection.ensure_open()?;
        self.universes[port.index()].channels().get_channel(channel)
    }

    /// Send one port's channel state, with the same differential rules as
    /// the single-port controller.
    pub fn submit(&mut self, port: Port) -> Result<()> {
        self.connection.ensure_open()?;

        let universe = &mut self.universes[port.index()];
        let frame = match universe.pending(self.config.differential) {
            Some(slots) => build_send_dmx_frame(Operation::SendDmx.port_label(port), slots)?,
            None => {
                trace!("Universe on {} unchanged, nothing to submit", port);
                return Ok(());
            }
        };

        self.connection.send(&frame)?;
        universe.mark_submitted();
        Ok(())
    }

    /// Submit both ports, port 1 first. Stops at the first failure.
    pub fn submit_all(&mut self) -> Result<()> {
        for port in Port::ALL {
            self.submit(port)?;
        }
        Ok(())
    }

    /// Send a set-port-widget-parameters request for `port`.
    pub fn set_port_widget_parameters(&mut self, port: Port, params: &TimingParameters) -> Result<()> {
        self.connection.ensure_open()?;
        let frame = build_parameters_frame(Operation::SetParameters.port_label(port), params)?;
        self.connection.send(&frame)
    }

    pub fn close(&mut self) -> Result<()> {
        self.connection.close()
    }

    pub fn is_closed(&self) -> bool {
        self.connection.is_closed()
    }

    fn apply_and_maybe_submit<F>(&mut self, port: Port, submit_after: Option<bool>, mutation: F) -> Result<()>
    where
        F: FnOnce(&mut ChannelBuffer) -> Result<()>,
    {
        self.connection.ensure_open()?;
        mutation(self.universes[port.index()].channels_mut())?;
        if self.config.should_submit(submit_after) {
            self.submit(port)?;
        }
        Ok(())
    }
}
