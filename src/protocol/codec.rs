// Wire codec for the teleop protocol
//
// Frame format (both directions):
// [type:1][len_lo:1][len_hi:1][payload:len]
// The length is an unsigned 16-bit little-endian count of payload bytes.

use crate::messages::MessageType;

/// Header size: type (1) + length (2)
pub const HEADER_SIZE: usize = 3;

/// Largest payload the 16-bit length field can describe
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Error types for frame encoding/decoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Frame too short: {len} bytes, header needs 3")]
    TooShort { len: usize },

    #[error("Payload length mismatch: header declares {declared}, got {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("Payload too large: {size} bytes (max 65535)")]
    PayloadTooLarge { size: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// A decoded frame borrowing its payload from the received buffer
///
/// The type byte is kept raw: tags outside the protocol still decode here and
/// are rejected later by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub type_id: u8,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_u8(self.type_id)
    }
}

/// Build a complete frame for `ty` carrying `payload`
pub fn encode(ty: MessageType, payload: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    encode_into(ty, payload, &mut buf)?;
    Ok(buf)
}

/// Append a frame to `dst`, leaving `dst` untouched on error
pub fn encode_into(ty: MessageType, payload: &[u8], dst: &mut Vec<u8>) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
        });
    }

    let len = payload.len() as u16;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.push(ty as u8);
    dst.extend_from_slice(&len.to_le_bytes());
    dst.extend_from_slice(payload);
    Ok(())
}

/// Decode one complete frame
///
/// A transport message carries exactly one frame, so the declared length must
/// account for every trailing byte.
pub fn decode(bytes: &[u8]) -> Result<Frame<'_>> {
    if bytes.len() < HEADER_SIZE {
        return Err(FrameError::TooShort { len: bytes.len() });
    }

    let declared = u16::from_le_bytes([bytes[1], bytes[2]]) as usize;
    let payload = &bytes[HEADER_SIZE..];

    if payload.len() != declared {
        return Err(FrameError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }

    Ok(Frame {
        type_id: bytes[0],
        payload,
    })
}
