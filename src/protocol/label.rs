//! Message labels understood by the DMX USB Pro family.
//!
//! Only the send-DMX and set-parameters requests are produced by this crate.
//! The other labels name the rest of the widget API (receive side, RDM,
//! show storage, MIDI) so frames seen on the wire can be identified.

/// Labels of the single-port widget (API v1).
pub mod pro {
    pub const REPROGRAM_FIRMWARE_REQUEST: u8 = 1;
    pub const PROGRAM_FLASH_PAGE_REQUEST: u8 = 2;
    pub const GET_WIDGET_PARAMETERS_REQUEST: u8 = 3;
    pub const SET_WIDGET_PARAMETERS_REQUEST: u8 = 4;
    pub const RECEIVED_DMX_PACKET: u8 = 5;
    pub const OUTPUT_ONLY_SEND_DMX_PACKET_REQUEST: u8 = 6;
    pub const SEND_RDM_PACKET_REQUEST: u8 = 7;
    pub const RECEIVE_DMX_ON_CHANGE: u8 = 8;
    pub const RECEIVED_DMX_CHANGE_OF_STATE_PACKET: u8 = 9;
    pub const GET_WIDGET_SERIAL_NUMBER_REQUEST: u8 = 10;
    pub const SEND_RDM_DISCOVERY_REQUEST: u8 = 11;
    pub const RDM_CONTROLLER_RECEIVE_TIMEOUT: u8 = 12;
}

/// Labels of the two-port Mk2 widget. Values above 12 belong to API v2.
pub mod mk2 {
    pub const GET_PORT_WIDGET_PARAMETERS_REQUEST_PORT1: u8 = 3;
    pub const GET_PORT_WIDGET_PARAMETERS_REQUEST_PORT2: u8 = 196;
    pub const SET_PORT_WIDGET_PARAMETERS_REQUEST_PORT1: u8 = 4;
    pub const SET_PORT_WIDGET_PARAMETERS_REQUEST_PORT2: u8 = 156;
    pub const RECEIVED_DMX_PACKET_PORT1: u8 = 5;
    pub const RECEIVED_DMX_PACKET_PORT2: u8 = 210;
    pub const OUTPUT_ONLY_SEND_DMX_PACKET_REQUEST_PORT1: u8 = 6;
    pub const OUTPUT_ONLY_SEND_DMX_PACKET_REQUEST_PORT2: u8 = 132;
    pub const SEND_RDM_PACKET_REQUEST_PORT1: u8 = 7;
    pub const SEND_RDM_PACKET_REQUEST_PORT2: u8 = 226;
    pub const RECEIVE_DMX_ON_CHANGE_PORT1: u8 = 8;
    pub const RECEIVE_DMX_ON_CHANGE_PORT2: u8 = 128;
    pub const RECEIVED_DMX_CHANGE_OF_STATE_PACKET_PORT1: u8 = 9;
    pub const RECEIVED_DMX_CHANGE_OF_STATE_PACKET_PORT2: u8 = 22;
    pub const GET_WIDGET_SERIAL_NUMBER_REQUEST: u8 = 10;
    pub const SEND_RDM_DISCOVERY_REQUEST_PORT1: u8 = 11;
    pub const SEND_RDM_DISCOVERY_REQUEST_PORT2: u8 = 208;
    pub const RDM_CONTROLLER_RECEIVE_TIMEOUT_PORT1: u8 = 12;
    pub const RDM_CONTROLLER_RECEIVE_TIMEOUT_PORT2: u8 = 209;
    pub const SET_API_KEY_REQUEST: u8 = 13;
    pub const QUERY_HARDWARE_VERSION_REQUEST: u8 = 14;
    pub const GET_PORT_ASSIGNMENT_REQUEST: u8 = 220;
    pub const SET_PORT_ASSIGNMENT_REQUEST: u8 = 201;
    pub const RECEIVED_MIDI: u8 = 225;
    pub const SEND_MIDI_REQUEST: u8 = 191;
    pub const SHOW_QUERY_REQUEST: u8 = 139;
    pub const SHOW_READ_REQUEST: u8 = 203;
    /// Shared by every show command; the first four body bytes select it.
    pub const SHOW_COMMAND_REQUEST: u8 = 129;

    /// Sub-command keywords carried by `SHOW_COMMAND_REQUEST`.
    pub mod show {
        pub const BLOCK_ERASE: &[u8; 4] = b"ERAS";
        pub const SECTOR_ERASE: &[u8; 4] = b"ERSE";
        pub const WRITE: &[u8; 4] = b"WRIT";
        pub const START: &[u8; 4] = b"STAR";
        pub const STOP: &[u8; 4] = b"STOP";
    }
}

/// Output port of a multi-port widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Port {
    #[serde(alias = "1", alias = "port1")]
    Port1,
    #[serde(alias = "2", alias = "port2")]
    Port2,
}

impl Port {
    pub const ALL: [Port; 2] = [Port::Port1, Port::Port2];

    pub(crate) fn index(self) -> usize {
        match self {
            Port::Port1 => 0,
            Port::Port2 => 1,
        }
    }
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Port::Port1 => write!(f, "port 1"),
            Port::Port2 => write!(f, "port 2"),
        }
    }
}

/// Requests this crate actually builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SendDmx,
    SetParameters,
}

impl Operation {
    /// Label for the single-port widget.
    pub fn label(self) -> u8 {
        match self {
            Operation::SendDmx => pro::OUTPUT_ONLY_SEND_DMX_PACKET_REQUEST,
            Operation::SetParameters => pro::SET_WIDGET_PARAMETERS_REQUEST,
        }
    }

    /// Label for the given port of a Mk2 widget.
    pub fn port_label(self, port: Port) -> u8 {
        match (self, port) {
            (Operation::SendDmx, Port::Port1) => mk2::OUTPUT_ONLY_SEND_DMX_PACKET_REQUEST_PORT1,
            (Operation::SendDmx, Port::Port2) => mk2::OUTPUT_ONLY_SEND_DMX_PACKET_REQUEST_PORT2,
            (Operation::SetParameters, Port::Port1) => mk2::SET_PORT_WIDGET_PARAMETERS_REQUEST_PORT1,
            (Operation::SetParameters, Port::Port2) => mk2::SET_PORT_WIDGET_PARAMETERS_REQUEST_PORT2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_port_labels() {
        assert_eq!(Operation::SendDmx.label(), 6);
        assert_eq!(Operation::SetParameters.label(), 4);
    }

    #[test]
    fn test_port_label_table() {
        assert_eq!(Operation::SendDmx.port_label(Port::Port1), 6);
        assert_eq!(Operation::SendDmx.port_label(Port::Port2), 132);
        assert_eq!(Operation::SetParameters.port_label(Port::Port1), 4);
        assert_eq!(Operation::SetParameters.port_label(Port::Port2), 156);
    }

    #[test]
    fn test_port_deserializes_from_number_string() {
        let port: Port = serde_json::from_str("\"2\"").unwrap();
        assert_eq!(port, Port::Port2);
        let port: Port = serde_json::from_str("\"Port1\"").unwrap();
        assert_eq!(port, Port::Port1);
    }
}
