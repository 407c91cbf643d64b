use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::buffer::{ChannelBuffer, MAX_UNIVERSE_SIZE};
use crate::error::{DmxError, Result};
use crate::parameters::TimingParameters;
use crate::protocol::frame::hex;
use crate::protocol::{build_parameters_frame, build_send_dmx_frame, Operation};
use crate::submission::Universe;
use crate::transport::{SerialSettings, SerialTransport, Transport};

/// Behaviour of a controller, independent of the device it talks to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ControllerConfig {
    /// Number of slots in the universe (24..=512).
    #[serde(default = "default_dmx_size")]
    pub dmx_size: usize,
    /// Submit after every channel change unless the call says otherwise.
    #[serde(default)]
    pub auto_submit: bool,
    /// Send only the changed prefix of the universe.
    #[serde(default)]
    pub differential: bool,
}

fn default_dmx_size() -> usize {
    MAX_UNIVERSE_SIZE
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            dmx_size: default_dmx_size(),
            auto_submit: false,
            differential: false,
        }
    }
}

impl ControllerConfig {
    /// Whether a mutation should be followed by a submit. An explicit
    /// per-call choice wins over the configured default.
    pub(crate) fn should_submit(&self, submit_after: Option<bool>) -> bool {
        submit_after.unwrap_or(self.auto_submit)
    }
}

/// Exclusive handle on the transport; released exactly once.
pub(crate) struct Connection<T: Transport> {
    transport: Option<T>,
}

impl<T: Transport> Connection<T> {
    pub(crate) fn new(transport: T) -> Self {
        Connection {
            transport: Some(transport),
        }
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        match self.transport {
            Some(_) => Ok(()),
            None => Err(DmxError::ClosedConnection),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    pub(crate) fn send(&mut self, frame: &[u8]) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(DmxError::ClosedConnection)?;

        debug!("Sending frame: label {} ({} bytes)", frame[1], frame.len());
        trace!("Complete serial frame: {}", hex(frame));

        transport.write_all(frame)
    }

    pub(crate) fn close(&mut self) -> Result<()> {
        let mut transport = self.transport.take().ok_or(DmxError::ClosedConnection)?;
        transport.close()
    }
}

impl<T: Transport> Drop for Connection<T> {
    fn drop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close() {
                warn!("Failed to close transport: {}", e);
            }
        }
    }
}

/// Controller for a single-port DMX USB Pro widget.
pub struct Controller<T: Transport = SerialTransport> {
    config: ControllerConfig,
    universe: Universe,
    connection: Connection<T>,
}

impl Controller<SerialTransport> {
    /// Open the widget on `path`. The configuration is validated first so a
    /// bad size never opens the port.
    pub fn open(path: &str, serial: &SerialSettings, config: ControllerConfig) -> Result<Self> {
        let universe = Universe::new(config.dmx_size)?;
        let transport = SerialTransport::open(path, serial)?;
        info!(
            "DMX controller on {} ({} channels, auto submit {}, differential {})",
            path, config.dmx_size, config.auto_submit, config.differential
        );
        Ok(Controller {
            config,
            universe,
            connection: Connection::new(transport),
        })
    }
}

impl<T: Transport> Controller<T> {
    /// Build a controller over an already opened transport. On an invalid
    /// configuration the transport is closed before the error is returned.
    pub fn with_transport(transport: T, config: ControllerConfig) -> Result<Self> {
        let connection = Connection::new(transport);
        let universe = Universe::new(config.dmx_size)?;
        Ok(Controller {
            config,
            universe,
            connection,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn dmx_size(&self) -> usize {
        self.universe.channels().len()
    }

    pub fn set_auto_submit(&mut self, auto_submit: bool) {
        self.config.auto_submit = auto_submit;
    }

    pub fn set_differential(&mut self, differential: bool) {
        self.config.differential = differential;
    }

    /// Current slot values, channel 1 first.
    pub fn channels(&self) -> &[u8] {
        self.universe.channels().as_slice()
    }

    /// Slot values as of the last successful submit.
    pub fn last_submitted(&self) -> &[u8] {
        self.universe.last_submitted().as_slice()
    }

    pub fn set_channel(&mut self, channel: usize, value: u8, submit_after: Option<bool>) -> Result<()> {
        self.apply_and_maybe_submit(submit_after, |buffer| buffer.set_channel(channel, value))
    }

    pub fn set_all_channels(&mut self, value: u8, submit_after: Option<bool>) -> Result<()> {
        self.apply_and_maybe_submit(submit_after, |buffer| {
            buffer.set_all(value);
            Ok(())
        })
    }

    pub fn all_channels_on(&mut self, submit_after: Option<bool>) -> Result<()> {
        self.set_all_channels(255, submit_after)
    }

    pub fn clear_channels(&mut self, submit_after: Option<bool>) -> Result<()> {
        self.apply_and_maybe_submit(submit_after, |buffer| {
            buffer.clear();
            Ok(())
        })
    }

    pub fn get_channel(&self, channel: usize) -> Result<u8> {
        self.connection.ensure_open()?;
        self.universe.channels().get_channel(channel)
    }

    /// Send the channel state to the widget.
    ///
    /// In differential mode an unchanged universe writes nothing. The
    /// submitted snapshot only moves forward once the write succeeded.
    pub fn submit(&mut self) -> Result<()> {
        self.connection.ensure_open()?;

        let frame = match self.universe.pending(self.config.differential) {
            Some(slots) => build_send_dmx_frame(Operation::SendDmx.label(), slots)?,
            None => {
                trace!("Universe unchanged, nothing to submit");
                return Ok(());
            }
        };

        self.connection.send(&frame)?;
        self.universe.mark_submitted();
        Ok(())
    }

    /// Send output timing to the widget. Channel state is untouched.
    pub fn set_dmx_parameters(&mut self, params: &TimingParameters) -> Result<()> {
        self.connection.ensure_open()?;
        let frame = build_parameters_frame(Operation::SetParameters.label(), params)?;
        self.connection.send(&frame)
    }

    /// Release the transport. Every later call fails with `ClosedConnection`.
    pub fn close(&mut self) -> Result<()> {
        self.connection.close()
    }

    pub fn is_closed(&self) -> bool {
        self.connection.is_closed()
    }

    fn apply_and_maybe_submit<F>(&mut self, submit_after: Option<bool>, mutation: F) -> Result<()>
    where
        F: FnOnce(&mut ChannelBuffer) -> Result<()>,
    {
        self.connection.ensure_open()?;
        mutation(self.universe.channels_mut())?;
        if self.config.should_submit(submit_after) {
            self.submit()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::{Log, MemoryTransport};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn controller(config: ControllerConfig) -> (Controller<MemoryTransport>, Rc<RefCell<Log>>) {
        let (transport, log) = MemoryTransport::new();
        (Controller::with_transport(transport, config).unwrap(), log)
    }

    fn differential() -> ControllerConfig {
        ControllerConfig {
            differential: true,
            ..ControllerConfig::default()
        }
    }

    #[test]
    fn test_invalid_size_releases_transport() {
        for size in [23, 513] {
            let (transport, log) = MemoryTransport::new();
            let config = ControllerConfig {
                dmx_size: size,
                ..ControllerConfig::default()
            };
            let result = Controller::with_transport(transport, config);
            assert!(matches!(result, Err(DmxError::InvalidSize(s)) if s == size));
            assert_eq!(log.borrow().closes, 1);
            assert!(log.borrow().frames.is_empty());
        }
    }

    #[test]
    fn test_size_is_preserved() {
        for size in [24, 100, 512] {
            let (ctrl, _) = controller(ControllerConfig {
                dmx_size: size,
                ..ControllerConfig::default()
            });
            assert_eq!(ctrl.dmx_size(), size);
            assert_eq!(ctrl.channels().len(), size);
        }
    }

    #[test]
    fn test_set_get_without_auto_submit() {
        let (mut ctrl, log) = controller(ControllerConfig::default());
        ctrl.set_channel(1, 255, None).unwrap();
        ctrl.set_channel(512, 17, None).unwrap();

        assert_eq!(ctrl.get_channel(1).unwrap(), 255);
        assert_eq!(ctrl.get_channel(512).unwrap(), 17);
        assert!(matches!(
            ctrl.get_channel(513),
            Err(DmxError::OutOfRange { channel: 513, size: 512 })
        ));
        assert!(matches!(ctrl.set_channel(0, 1, Some(true)), Err(DmxError::OutOfRange { .. })));
        assert!(log.borrow().frames.is_empty());
    }

    #[test]
    fn test_all_on_and_clear() {
        let (mut ctrl, _) = controller(ControllerConfig::default());
        ctrl.all_channels_on(None).unwrap();
        assert!((1..=512).all(|c| ctrl.get_channel(c).unwrap() == 255));
        ctrl.clear_channels(None).unwrap();
        assert!((1..=512).all(|c| ctrl.get_channel(c).unwrap() == 0));
        ctrl.set_all_channels(42, None).unwrap();
        assert!(ctrl.channels().iter().all(|&v| v == 42));
    }

    #[test]
    fn test_full_submit_frame() {
        let (mut ctrl, log) = controller(ControllerConfig {
            dmx_size: 24,
            ..ControllerConfig::default()
        });
        ctrl.set_channel(3, 0x80, None).unwrap();
        ctrl.submit().unwrap();

        let log = log.borrow();
        let frame = &log.frames[0];
        assert_eq!(&frame[..5], &[0x7E, 6, 25, 0, 0]);
        assert_eq!(frame[5 + 2], 0x80);
        assert_eq!(frame.len(), 24 + 6);
        assert_eq!(*frame.last().unwrap(), 0xE7);
    }

    #[test]
    fn test_non_differential_resends_everything() {
        let (mut ctrl, log) = controller(ControllerConfig::default());
        ctrl.submit().unwrap();
        ctrl.submit().unwrap();
        let log = log.borrow();
        assert_eq!(log.frames.len(), 2);
        assert!(log.frames.iter().all(|f| f.len() == 512 + 6));
    }

    #[test]
    fn test_auto_submit_default_and_override() {
        let (mut ctrl, log) = controller(ControllerConfig {
            auto_submit: true,
            ..ControllerConfig::default()
        });
        ctrl.set_channel(1, 1, None).unwrap();
        assert_eq!(log.borrow().frames.len(), 1);
        ctrl.set_channel(1, 2, Some(false)).unwrap();
        assert_eq!(log.borrow().frames.len(), 1);

        ctrl.set_auto_submit(false);
        ctrl.clear_channels(None).unwrap();
        assert_eq!(log.borrow().frames.len(), 1);
        ctrl.all_channels_on(Some(true)).unwrap();
        assert_eq!(log.borrow().frames.len(), 2);
    }

    #[test]
    fn test_differential_skips_unchanged_universe() {
        let (mut ctrl, log) = controller(differential());
        ctrl.submit().unwrap();
        assert!(log.borrow().frames.is_empty());

        ctrl.set_channel(100, 9, Some(true)).unwrap();
        ctrl.submit().unwrap();

        let log = log.borrow();
        assert_eq!(log.frames.len(), 1);
        assert_eq!(&log.frames[0][..4], &[0x7E, 6, 101, 0]);
        assert_eq!(log.frames[0].len(), 100 + 6);
    }

    #[test]
    fn test_differential_promotes_short_changes() {
        let (mut ctrl, log) = controller(differential());
        ctrl.set_channel(2, 5, Some(true)).unwrap();

        let log = log.borrow();
        assert_eq!(&log.frames[0][..4], &[0x7E, 6, 25, 0]);
        assert_eq!(log.frames[0][6], 5);
        assert_eq!(log.frames[0].len(), 24 + 6);
    }

    #[test]
    fn test_differential_last_slot_sends_full_universe() {
        let (mut ctrl, log) = controller(differential());
        ctrl.set_channel(512, 1, Some(true)).unwrap();
        assert_eq!(log.borrow().frames[0].len(), 512 + 6);
    }

    #[test]
    fn test_snapshot_is_whole_buffer() {
        let (mut ctrl, log) = controller(differential());
        ctrl.set_channel(3, 3, None).unwrap();
        ctrl.set_channel(40, 4, None).unwrap();
        ctrl.submit().unwrap();
        assert_eq!(ctrl.last_submitted(), ctrl.channels());

        // Lowering channel 40 back to 0 still has to reach the widget.
        ctrl.set_channel(40, 0, Some(true)).unwrap();
        let log = log.borrow();
        assert_eq!(log.frames.len(), 2);
        assert_eq!(log.frames[1].len(), 40 + 6);
    }

    #[test]
    fn test_failed_write_keeps_snapshot() {
        let (mut ctrl, log) = controller(differential());
        ctrl.set_channel(30, 1, None).unwrap();

        log.borrow_mut().fail_writes = true;
        let err = ctrl.submit().unwrap_err();
        assert!(err.is_transport());
        assert_eq!(ctrl.get_channel(30).unwrap(), 1);
        assert_eq!(ctrl.last_submitted()[29], 0);

        log.borrow_mut().fail_writes = false;
        ctrl.submit().unwrap();
        assert_eq!(log.borrow().frames.len(), 1);
        assert_eq!(ctrl.last_submitted()[29], 1);
    }

    #[test]
    fn test_set_dmx_parameters() {
        let (mut ctrl, log) = controller(differential());
        ctrl.set_channel(1, 10, None).unwrap();
        ctrl.set_dmx_parameters(&TimingParameters::new(9, 1, 40)).unwrap();
        ctrl.set_dmx_parameters(&TimingParameters::new(127, 127, 0)).unwrap();

        {
            let log = log.borrow();
            assert_eq!(log.frames[0], vec![0x7E, 4, 5, 0, 0, 0, 9, 1, 40, 0xE7]);
            assert_eq!(log.frames[1], vec![0x7E, 4, 5, 0, 0, 0, 127, 127, 0, 0xE7]);
        }
        assert_eq!(ctrl.last_submitted()[0], 0);
        assert_eq!(ctrl.get_channel(1).unwrap(), 10);
    }

    #[test]
    fn test_invalid_parameters_write_nothing() {
        let (mut ctrl, log) = controller(ControllerConfig::default());
        for params in [TimingParameters::new(8, 1, 40), TimingParameters::new(128, 1, 40)] {
            assert!(matches!(
                ctrl.set_dmx_parameters(&params),
                Err(DmxError::InvalidParameter { field: "break_time", .. })
            ));
        }
        assert!(log.borrow().frames.is_empty());
    }

    #[test]
    fn test_close_once() {
        let (mut ctrl, log) = controller(ControllerConfig::default());
        ctrl.close().unwrap();
        assert!(ctrl.is_closed());
        assert!(matches!(ctrl.close(), Err(DmxError::ClosedConnection)));
        assert!(matches!(ctrl.submit(), Err(DmxError::ClosedConnection)));
        assert!(matches!(ctrl.set_channel(1, 1, None), Err(DmxError::ClosedConnection)));
        assert!(matches!(ctrl.get_channel(1), Err(DmxError::ClosedConnection)));
        drop(ctrl);
        assert_eq!(log.borrow().closes, 1);
    }

    #[test]
    fn test_drop_closes_transport() {
        let (ctrl, log) = controller(ControllerConfig::default());
        drop(ctrl);
        assert_eq!(log.borrow().closes, 1);
    }

    #[test]
    fn test_config_from_json() {
        let config: ControllerConfig = serde_json::from_str(r#"{"differential": true}"#).unwrap();
        assert_eq!(config.dmx_size, 512);
        assert!(!config.auto_submit);
        assert!(config.differential);
    }
}
