// psi/eit.rs
//! EIT (table_ids 0x4E..=0x6F): present/following and schedule sections.

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::constants::{EIT_PIDS, EIT_TABLE_IDS};
use crate::error::{Error, Result};
use crate::psi::assembler::RawSection;
use crate::psi::section::SectionReader;
use crate::psi::PsiTable;

const EIT_HEADER_LEN: usize = 6;
const EVENT_HEADER_LEN: usize = 12;

#[derive(Debug, Clone)]
pub struct EitSection {
    pub service_id:          u16,
    /// 0 = present event, 1 = following, >=2 = further schedule
    pub section_number:      u8,
    pub events:              Vec<EitEvent>,
}

/// One raw entry of the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EitEvent {
    pub event_id:       u16,
    /// MJD (16 bits) followed by BCD hh mm ss
    pub start_time:     [u8; 5],
    /// BCD hh mm ss
    pub duration:       [u8; 3],
    pub descriptors:    Vec<u8>,
}

impl EitEvent {
    /// Iterates `(tag, payload)` pairs of the descriptor loop.
    pub fn descriptors(&self) -> impl Iterator<Item = (u8, &[u8])> {
        let mut rest = &self.descriptors[..];
        std::iter::from_fn(move || {
            if rest.len() < 2 {
                return None;
            }
            let tag = rest[0];
            let len = rest[1] as usize;
            let data = rest.get(2..2 + len)?;
            rest = &rest[2 + len..];
            Some((tag, data))
        })
    }
}

fn parse_event(head: &[u8]) -> std::io::Result<(EitEvent, usize)> {
    let mut br = BitReader::endian(head, BigEndian);
    let event_id = br.read::<16, u16>()?;
    let mut start_time = [0u8; 5];
    br.read_bytes(&mut start_time)?;
    let mut duration = [0u8; 3];
    br.read_bytes(&mut duration)?;
    br.skip(4)?; // running_status, free_CA_mode
    let loop_len = br.read::<12, u16>()? as usize;
    Ok((
        EitEvent { event_id, start_time, duration, descriptors: Vec::new() },
        loop_len,
    ))
}

pub fn parse_eit(sec: &SectionReader<'_>) -> Result<EitSection> {
    if !EIT_TABLE_IDS.contains(&sec.table_id) {
        return Err(Error::malformed("not EIT"));
    }
    let b = sec.body;
    if b.len() < EIT_HEADER_LEN { return Err(Error::malformed("EIT body too short")) }

    let mut events = Vec::new();
    let mut idx = EIT_HEADER_LEN;
    while idx + EVENT_HEADER_LEN <= b.len() {
        let (mut event, loop_len) = parse_event(&b[idx..idx + EVENT_HEADER_LEN])?;
        idx += EVENT_HEADER_LEN;
        let desc = b.get(idx..idx + loop_len)
            .ok_or_else(|| Error::malformed("EIT descriptors_loop_length overruns section"))?;
        event.descriptors = desc.to_vec();
        idx += loop_len;
        events.push(event);
    }

    Ok(EitSection {
        service_id:          sec.table_id_extension,
        section_number:      sec.section_number,
        events,
    })
}

impl PsiTable for EitSection {
    const NAME: &'static str = "EIT";
    const STRICT: bool = false;

    fn default_pids() -> &'static [u16] { EIT_PIDS }
    fn accepts(table_id: u8) -> bool { EIT_TABLE_IDS.contains(&table_id) }
    fn parse(sec: &SectionReader<'_>, _raw: &RawSection) -> Result<Self> { parse_eit(sec) }
}
