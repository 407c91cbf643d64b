use serde::{Deserialize, Serialize};

use crate::controller::ControllerConfig;
use crate::error::{DmxError, Result};
use crate::parameters::TimingParameters;
use crate::ports;
use crate::protocol::Port;
use crate::transport::SerialSettings;

/// Configuration file of the `dmx_widget` tool.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub device: DeviceConfig,
    #[serde(default)]
    pub serial: SerialSettings,
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Output timing sent once after opening
    pub parameters: Option<TimingParameters>,
    /// Target port of a Mk2 widget; the single-port API is used when absent
    pub mk2_port: Option<Port>,
    /// Scene applied after opening
    #[serde(default)]
    pub channels: Vec<ChannelValue>,
}

/// How to find the widget. The first field set wins, in declaration order.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceConfig {
    pub port: Option<String>,
    pub serial_number: Option<String>,
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelValue {
    pub channel: usize,
    pub value: u8,
}

impl Config {
    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}

impl DeviceConfig {
    /// Resolve to a device path, querying the OS when needed.
    pub fn resolve(&self) -> Result<String> {
        self.resolve_with(ports::list_ports)
    }

    pub(crate) fn resolve_with<F>(&self, list: F) -> Result<String>
    where
        F: FnOnce() -> Result<Vec<ports::PortDescriptor>>,
    {
        if let Some(port) = &self.port {
            return Ok(port.clone());
        }

        match (&self.serial_number, self.vendor_id, self.product_id) {
            (Some(serial), _, _) => ports::select_by_serial_number(&list()?, serial),
            (None, Some(vid), Some(pid)) => ports::select_by_vendor_product_id(&list()?, vid, pid),
            (None, None, Some(pid)) => ports::select_by_product_id(&list()?, pid),
            _ => Err(DmxError::invalid_parameter(
                "device",
                "set one of port, serial_number or product_id",
            )),
        }
    }
}
