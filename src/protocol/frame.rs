use crate::error::{DmxError, Result};
use crate::parameters::TimingParameters;

pub const START_OF_MESSAGE: u8 = 0x7E;
pub const END_OF_MESSAGE: u8 = 0xE7;
pub const MAX_BODY_LEN: usize = 0xFFFF;

/// Start code carried in front of the slot data of every DMX packet.
pub const DMX_START_CODE: u8 = 0x00;

/// Build a widget frame: start, label, body length (LE), body, end
pub fn encode_frame(label: u8, body: &[u8]) -> Result<Vec<u8>> {
    if body.len() > MAX_BODY_LEN {
        return Err(DmxError::invalid_parameter(
            "body",
            format!("length {} exceeds {}", body.len(), MAX_BODY_LEN),
        ));
    }
    let length = body.len() as u16;

    let mut frame = Vec::with_capacity(5 + body.len());

    // Header
    frame.push(START_OF_MESSAGE);
    frame.push(label);
    frame.extend_from_slice(&length.to_le_bytes());

    frame.extend_from_slice(body);

    frame.push(END_OF_MESSAGE);

    Ok(frame)
}

/// Build a send-DMX-packet frame. The length field counts the start code.
pub fn build_send_dmx_frame(label: u8, slots: &[u8]) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(slots.len() + 1);
    body.push(DMX_START_CODE);
    body.extend_from_slice(slots);
    encode_frame(label, &body)
}

/// Build a set-(port-)widget-parameters frame.
///
/// The outer frame length is `user bytes + 5`; the body repeats the
/// user-defined length on its own.
pub fn build_parameters_frame(label: u8, params: &TimingParameters) -> Result<Vec<u8>> {
    let body = params.to_body()?;
    encode_frame(label, &body)
}

/// Hex dump used by frame tracing
pub(crate) fn hex(frame: &[u8]) -> String {
    frame
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_layout() {
        let body: Vec<u8> = (1..=25).collect();
        let frame = encode_frame(6, &body).unwrap();

        assert_eq!(&frame[..4], &[0x7E, 6, 25, 0]);
        assert_eq!(&frame[4..29], &body[..]);
        assert_eq!(frame[29], 0xE7);
        assert_eq!(frame.len(), 30);
    }

    #[test]
    fn test_encode_frame_length_is_little_endian() {
        let body = vec![0u8; 513];
        let frame = encode_frame(6, &body).unwrap();
        assert_eq!(&frame[2..4], &[0x01, 0x02]);
    }

    #[test]
    fn test_encode_empty_body() {
        assert_eq!(encode_frame(10, &[]).unwrap(), vec![0x7E, 10, 0, 0, 0xE7]);
    }

    #[test]
    fn test_encode_rejects_oversized_body() {
        let body = vec![0u8; MAX_BODY_LEN + 1];
        assert!(matches!(
            encode_frame(6, &body),
            Err(DmxError::InvalidParameter { field: "body", .. })
        ));
    }

    #[test]
    fn test_send_dmx_frame_counts_start_code() {
        let slots = vec![0xFFu8; 24];
        let frame = build_send_dmx_frame(6, &slots).unwrap();

        assert_eq!(&frame[..5], &[0x7E, 6, 25, 0, 0]);
        assert_eq!(&frame[5..29], &slots[..]);
        assert_eq!(*frame.last().unwrap(), 0xE7);
    }

    #[test]
    fn test_full_universe_frame_length() {
        let frame = build_send_dmx_frame(6, &[0u8; 512]).unwrap();
        // 513 = 0x0201
        assert_eq!(&frame[..4], &[0x7E, 6, 0x01, 0x02]);
        assert_eq!(frame.len(), 512 + 6);
    }

    #[test]
    fn test_port_parameters_frame_carries_both_lengths() {
        let params = TimingParameters::new(9, 1, 40).with_user_defined_bytes(vec![1, 2, 3]);
        let frame = build_parameters_frame(156, &params).unwrap();

        assert_eq!(
            frame,
            vec![0x7E, 156, 8, 0, 3, 0, 9, 1, 40, 1, 2, 3, 0xE7]
        );
    }

    #[test]
    fn test_parameters_frame_rejects_before_encoding() {
        let params = TimingParameters::new(8, 1, 40);
        assert!(build_parameters_frame(4, &params).is_err());
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[0x7E, 0x06, 0xE7]), "7e 06 e7");
    }
}
