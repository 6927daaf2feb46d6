//! Synthetic transport stream builder shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;

use crc::{Crc, CRC_32_MPEG_2};

pub const TS: usize = 188;
const CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Long-form section with a valid CRC.
pub fn section(table_id: u8, ext: u16, section_number: u8, body: &[u8]) -> Vec<u8> {
    let len = 5 + body.len() + 4;
    let mut s = vec![
        table_id,
        0xB0 | ((len >> 8) as u8 & 0x0F),
        len as u8,
        (ext >> 8) as u8,
        ext as u8,
        0xC1, // version 0, current
        section_number,
        section_number,
    ];
    s.extend_from_slice(body);
    let crc = CRC.checksum(&s);
    s.extend_from_slice(&crc.to_be_bytes());
    s
}

pub fn pat(tsid: u16, programs: &[(u16, u16)]) -> Vec<u8> {
    let mut body = Vec::new();
    for &(number, pid) in programs {
        body.extend_from_slice(&number.to_be_bytes());
        body.extend_from_slice(&(0xE000 | pid).to_be_bytes());
    }
    section(0x00, tsid, 0, &body)
}

pub fn pmt(program: u16, pcr_pid: u16, streams: &[(u8, u16)]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&(0xE000 | pcr_pid).to_be_bytes());
    body.extend_from_slice(&[0xF0, 0x00]);
    for &(stream_type, pid) in streams {
        body.push(stream_type);
        body.extend_from_slice(&(0xE000 | pid).to_be_bytes());
        body.extend_from_slice(&[0xF0, 0x00]);
    }
    section(0x02, program, 0, &body)
}

/// Event loop entry; `start` is MJD + BCD, `duration` BCD.
#[derive(Clone, Copy)]
pub struct EventSpec<'a> {
    pub start: [u8; 5],
    pub duration: [u8; 3],
    /// ARIB-encoded title
    pub title: &'a [u8],
    pub genre: Option<u8>,
}

pub fn eit(service: u16, section_number: u8, events: &[EventSpec<'_>]) -> Vec<u8> {
    let mut body = vec![0x7F, 0xE0, 0x00, 0x04, 0x01, 0x4E];
    for (i, ev) in events.iter().enumerate() {
        let mut desc = Vec::new();
        desc.push(0x4D);
        desc.push((5 + ev.title.len()) as u8);
        desc.extend_from_slice(b"jpn");
        desc.push(ev.title.len() as u8);
        desc.extend_from_slice(ev.title);
        desc.push(0);
        if let Some(g) = ev.genre {
            desc.extend_from_slice(&[0x54, 2, g, 0xFF]);
        }
        body.extend_from_slice(&(i as u16 + 1).to_be_bytes());
        body.extend_from_slice(&ev.start);
        body.extend_from_slice(&ev.duration);
        body.extend_from_slice(&(0x8000 | desc.len() as u16).to_be_bytes());
        body.extend_from_slice(&desc);
    }
    section(0x4E, service, section_number, &body)
}

/// Accumulates packets, keeping a continuity counter per PID.
#[derive(Default)]
pub struct Capture {
    pub bytes: Vec<u8>,
    cc: HashMap<u16, u8>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_cc(&mut self, pid: u16) -> u8 {
        let cc = self.cc.entry(pid).or_insert(0x0F);
        *cc = (*cc + 1) & 0x0F;
        *cc
    }

    fn header(&mut self, pid: u16, pusi: bool) -> Vec<u8> {
        let cc = self.next_cc(pid);
        vec![
            0x47,
            ((pid >> 8) as u8 & 0x1F) | if pusi { 0x40 } else { 0 },
            pid as u8,
            0x10 | cc,
        ]
    }

    /// Splits a section into packets starting with pointer field 0.
    pub fn section(&mut self, pid: u16, section: &[u8]) -> &mut Self {
        let mut payload = vec![0x00];
        payload.extend_from_slice(section);
        for (i, chunk) in payload.chunks(TS - 4).enumerate() {
            let mut p = self.header(pid, i == 0);
            p.extend_from_slice(chunk);
            p.resize(TS, 0xFF);
            self.bytes.extend_from_slice(&p);
        }
        self
    }

    /// Places a short section at the very end of a single packet.
    pub fn section_at_end(&mut self, pid: u16, section: &[u8]) -> &mut Self {
        let mut p = self.header(pid, true);
        let pointer = TS - 5 - section.len();
        p.push(pointer as u8);
        p.resize(5 + pointer, 0xFF);
        p.extend_from_slice(section);
        self.bytes.extend_from_slice(&p);
        self
    }

    /// Payload-only packet filled with `fill`.
    pub fn es(&mut self, pid: u16, fill: u8) -> &mut Self {
        let mut p = self.header(pid, false);
        p.resize(TS, fill);
        self.bytes.extend_from_slice(&p);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

pub fn pid(packet: &[u8]) -> u16 {
    (((packet[1] & 0x1F) as u16) << 8) | packet[2] as u16
}

pub fn packets(bytes: &[u8]) -> Vec<&[u8]> {
    bytes.chunks(TS).collect()
}
