//! Reassembles sections that span several transport packets.

use std::collections::HashMap;

use bytes::Bytes;
use tracing::debug;

use crate::capture::Packet;

/// A complete section and the packet in which it started.
#[derive(Debug, Clone)]
pub struct RawSection {
    pub pid: u16,
    pub packet: Bytes,
    pub data: Vec<u8>,
}

#[derive(Default)]
struct PidState {
    buf: Vec<u8>,
    start: Option<Bytes>,
    last_cc: Option<u8>,
}

impl PidState {
    fn reset(&mut self) {
        self.buf.clear();
        self.start = None;
    }

    /// Moves every complete section out of the buffer.
    fn drain_complete(&mut self, pid: u16, out: &mut Vec<RawSection>) {
        while self.buf.len() >= 3 {
            if self.buf[0] == 0xFF {
                // stuffing until the end of the packet
                self.reset();
                return;
            }
            let total = 3 + ((((self.buf[1] & 0x0F) as usize) << 8) | self.buf[2] as usize);
            if self.buf.len() < total {
                return;
            }
            let data: Vec<u8> = self.buf.drain(..total).collect();
            let packet = self.start.clone().unwrap_or_default();
            out.push(RawSection { pid, packet, data });
        }
    }
}

/// Per-PID section collector.
#[derive(Default)]
pub struct SectionAssembler {
    pids: HashMap<u16, PidState>,
}

impl SectionAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one packet; returns the sections it completed, in order.
    pub fn push(&mut self, packet: &Packet) -> Vec<RawSection> {
        let mut out = Vec::new();
        let Some(payload) = packet.payload() else { return out };
        let pid = packet.pid();
        let state = self.pids.entry(pid).or_default();

        let cc = packet.continuity_counter();
        if let Some(last) = state.last_cc {
            if cc == last {
                return out; // duplicate packet
            }
            if cc != (last + 1) & 0x0F && !state.buf.is_empty() {
                debug!(pid, "continuity break, dropping partial section");
                state.reset();
            }
        }
        state.last_cc = Some(cc);

        if packet.payload_unit_start() {
            if payload.is_empty() {
                return out;
            }
            let pointer = payload[0] as usize;
            let rest = &payload[1..];
            if pointer > rest.len() {
                state.reset();
                return out;
            }
            if !state.buf.is_empty() {
                state.buf.extend_from_slice(&rest[..pointer]);
                state.drain_complete(pid, &mut out);
            }
            state.reset();
            state.start = Some(packet.raw());
            state.buf.extend_from_slice(&rest[pointer..]);
            state.drain_complete(pid, &mut out);
        } else if !state.buf.is_empty() {
            state.buf.extend_from_slice(payload);
            state.drain_complete(pid, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TS_PACKET_SIZE;

    fn packet(pid: u16, pusi: bool, cc: u8, payload: &[u8]) -> Packet {
        let mut p = vec![0xFFu8; TS_PACKET_SIZE];
        p[0] = 0x47;
        p[1] = ((pid >> 8) as u8 & 0x1F) | if pusi { 0x40 } else { 0 };
        p[2] = pid as u8;
        p[3] = 0x10 | (cc & 0x0F);
        p[4..4 + payload.len()].copy_from_slice(payload);
        Packet::from_slice(&p)
    }

    fn section(table_id: u8, body_len: usize) -> Vec<u8> {
        let len = body_len + 9;
        let mut s = vec![table_id, 0xB0 | (len >> 8) as u8, len as u8];
        s.extend(std::iter::repeat(0xAB).take(len));
        s
    }

    #[test]
    fn single_packet_section() {
        let sec = section(0x00, 4);
        let mut payload = vec![0x00];
        payload.extend(&sec);

        let mut asm = SectionAssembler::new();
        let out = asm.push(&packet(0, true, 0, &payload));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].data, sec);
        assert_eq!(out[0].packet.len(), TS_PACKET_SIZE);
    }

    #[test]
    fn section_spanning_packets() {
        let sec = section(0x4E, 300);
        let mut first = vec![0x00];
        first.extend(&sec[..183]);
        let second = &sec[183..];

        let mut asm = SectionAssembler::new();
        assert!(asm.push(&packet(0x12, true, 0, &first)).is_empty());
        let out = asm.push(&packet(0x12, false, 1, second));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].data, sec);
    }

    #[test]
    fn continuity_break_discards_partial() {
        let sec = section(0x4E, 300);
        let mut first = vec![0x00];
        first.extend(&sec[..183]);

        let mut asm = SectionAssembler::new();
        asm.push(&packet(0x12, true, 0, &first));
        assert!(asm.push(&packet(0x12, false, 5, &sec[183..])).is_empty());
    }

    #[test]
    fn pointer_field_finishes_previous_section() {
        let a = section(0x4E, 200);
        let b = section(0x4F, 10);
        let mut first = vec![0x00];
        first.extend(&a[..183]);
        let tail = &a[183..];
        let mut second = vec![tail.len() as u8];
        second.extend(tail);
        second.extend(&b);

        let mut asm = SectionAssembler::new();
        asm.push(&packet(0x12, true, 3, &first));
        let out = asm.push(&packet(0x12, true, 4, &second));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].data, a);
        assert_eq!(out[1].data, b);
    }
}
