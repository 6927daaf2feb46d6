//! Synthesizes the single-program PAT written by the splitter.

use bytes::{BufMut, Bytes, BytesMut};

use crate::capture::packet::payload_unit_start;
use crate::checksum::crc32;
use crate::constants::{
    PAT_BODY_LEN, PAT_PREFIX_LEN, PAT_SENTINEL_OFFSET, PAT_SENTINEL_VALUE, PAT_TEMPLATE_LEN,
    STUFFING_BYTE, TS_PACKET_SIZE,
};
use crate::error::{Error, Result};

/// Builds the payload body that follows the 5-byte packet prefix:
/// the first 16 section bytes with the sentinel applied, their CRC, then stuffing.
pub fn rewrite_pat_section(section: &[u8]) -> Result<Bytes> {
    let template = section.get(..PAT_TEMPLATE_LEN).ok_or_else(|| {
        Error::malformed(format!(
            "PAT section has {} bytes, rewrite template needs {PAT_TEMPLATE_LEN}",
            section.len()
        ))
    })?;

    let mut body = BytesMut::with_capacity(PAT_BODY_LEN);
    body.put_slice(template);
    body[PAT_SENTINEL_OFFSET] = PAT_SENTINEL_VALUE;
    let crc = crc32(&body);
    body.put_u32(crc);
    body.put_bytes(STUFFING_BYTE, PAT_BODY_LEN - body.len());
    Ok(body.freeze())
}

/// Rewrites a whole PAT packet: header bytes of the original, a zero
/// pointer field, then the synthesized body.
pub fn replace_pat(packet: &[u8]) -> Result<Bytes> {
    if packet.len() < PAT_PREFIX_LEN {
        return Err(Error::malformed(format!("PAT packet has only {} bytes", packet.len())));
    }
    let section_start = PAT_PREFIX_LEN + packet[PAT_PREFIX_LEN - 1] as usize;
    let section = packet.get(section_start..).unwrap_or_default();
    let body = rewrite_pat_section(section)?;
    Ok(splice(packet, &body))
}

/// Prefixes `body` with the first five bytes of `packet`. When the packet
/// starts a section the fifth byte is its pointer field and is forced to 0;
/// otherwise it is payload and is copied as is.
pub fn splice(packet: &[u8], body: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(TS_PACKET_SIZE);
    out.put_slice(&packet[..PAT_PREFIX_LEN - 1]);
    if payload_unit_start(packet) {
        out.put_u8(0x00);
    } else {
        out.put_u8(packet[PAT_PREFIX_LEN - 1]);
    }
    out.put_slice(body);
    out.freeze()
}
