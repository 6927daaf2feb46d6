//! Header accessors over raw 188-byte transport packets.

use bytes::Bytes;

use crate::constants::TS_PACKET_SIZE;

/// 13-bit packet identifier.
pub fn pid(raw: &[u8]) -> u16 {
    (((raw[1] & 0x1F) as u16) << 8) | (raw[2] as u16)
}

pub fn payload_unit_start(raw: &[u8]) -> bool {
    raw[1] & 0x40 != 0
}

pub fn adaptation_field_control(raw: &[u8]) -> u8 {
    (raw[3] & 0x30) >> 4
}

pub fn continuity_counter(raw: &[u8]) -> u8 {
    raw[3] & 0x0F
}

/// Payload bytes after the header and any adaptation field.
pub fn payload(raw: &[u8]) -> Option<&[u8]> {
    let mut offset = 4usize;
    match adaptation_field_control(raw) {
        0 | 2 => return None, // reserved / adaptation only
        3 => offset += 1 + raw[4] as usize,
        _ => {}
    }
    if offset >= raw.len() {
        return None;
    }
    Some(&raw[offset..])
}

/// One fixed-size transport packet as read from a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    bytes: Bytes,
}

impl Packet {
    pub(crate) fn from_slice(raw: &[u8]) -> Self {
        debug_assert_eq!(raw.len(), TS_PACKET_SIZE);
        Self { bytes: Bytes::copy_from_slice(raw) }
    }

    pub fn pid(&self) -> u16 {
        pid(&self.bytes)
    }

    pub fn payload_unit_start(&self) -> bool {
        payload_unit_start(&self.bytes)
    }

    pub fn continuity_counter(&self) -> u8 {
        continuity_counter(&self.bytes)
    }

    pub fn payload(&self) -> Option<&[u8]> {
        payload(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap shared handle to the raw bytes.
    pub fn raw(&self) -> Bytes {
        self.bytes.clone()
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
