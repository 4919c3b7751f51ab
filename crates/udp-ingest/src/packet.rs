//! # Telemetry Packet
//!
//! The binary envelope carried in every inbound datagram: a fixed-offset
//! header holding a 48-bit device identifier, followed by an opaque
//! payload. The id sits left-shifted by 16 bits inside a signed 64-bit
//! big-endian field at byte offset 12; the payload starts at offset 18 and
//! runs to the end of the buffer, overlapping the low 16 bits of that
//! field.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Byte offset of the 64-bit header field carrying the device id.
const MAC_FIELD_OFFSET: usize = 12;
/// Byte offset of the first payload byte.
const PAYLOAD_OFFSET: usize = 18;

/// An immutable decoded telemetry packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// The 48-bit device identifier used as the routing key.
    pub mac: i64,
    /// The opaque measurement payload.
    pub data: Vec<u8>,
}

impl Packet {
    /// Decodes a packet from a raw datagram.
    ///
    /// Returns `None` for a malformed buffer: anything of 18 bytes or
    /// fewer, or too short for the full header field read.
    pub fn from_binary(buffer: &[u8]) -> Option<Packet> {
        if buffer.len() <= PAYLOAD_OFFSET {
            return None;
        }
        let field = buffer.get(MAC_FIELD_OFFSET..MAC_FIELD_OFFSET + 8)?;
        let field = i64::from_be_bytes(field.try_into().ok()?);

        Some(Packet {
            // Arithmetic shift: the field is signed on the wire.
            mac: field >> 16,
            data: buffer[PAYLOAD_OFFSET..].to_vec(),
        })
    }

    /// Encodes the packet back into its wire form.
    ///
    /// The header field is written first, then the payload over its low
    /// two bytes; a payload shorter than two bytes leaves the buffer
    /// padded to the header field's extent.
    pub fn to_binary(&self) -> Vec<u8> {
        let len = (MAC_FIELD_OFFSET + 8).max(PAYLOAD_OFFSET + self.data.len());
        let mut buffer = vec![0u8; len];
        buffer[MAC_FIELD_OFFSET..MAC_FIELD_OFFSET + 8]
            .copy_from_slice(&(self.mac << 16).to_be_bytes());
        buffer[PAYLOAD_OFFSET..PAYLOAD_OFFSET + self.data.len()].copy_from_slice(&self.data);
        buffer
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PACKET[header={{mac={:012X}}} data=", self.mac)?;
        for byte in &self.data {
            write!(f, "{byte:02X}")?;
        }
        write!(f, "]")
    }
}
