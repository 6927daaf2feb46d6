use bytes::Bytes;

use crate::constants::{PAT_PID, PAT_TABLE_ID};
use crate::error::{Error, Result};
use crate::psi::assembler::RawSection;
use crate::psi::section::SectionReader;
use crate::psi::PsiTable;

/// ─────────── PAT ───────────
#[derive(Debug, Clone)]
pub struct PatSection {
    pub transport_stream_id: u16,
    pub version:             u8,
    pub programs:            Vec<PatEntry>,
    /// Packet the section started in; the splitter rewrites this one.
    pub packet:              Bytes,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatEntry {
    pub program_number: u16,
    pub pmt_pid:        u16,
}

impl PatSection {
    /// PMT PIDs in transmission order; program 0 (NIT) is not a program.
    pub fn pmt_pids(&self) -> impl Iterator<Item = u16> + '_ {
        self.programs.iter().filter(|e| e.program_number != 0).map(|e| e.pmt_pid)
    }
}

pub fn parse_pat(sec: &SectionReader<'_>, raw: &RawSection) -> Result<PatSection> {
    if sec.table_id != PAT_TABLE_ID { return Err(Error::malformed("not PAT")) }
    if sec.body.len() % 4 != 0 {
        return Err(Error::malformed(format!("PAT body length {} is not a multiple of 4", sec.body.len())));
    }

    let programs = sec.body
        .chunks_exact(4)
        .map(|e| PatEntry {
            program_number: u16::from_be_bytes([e[0], e[1]]),
            pmt_pid:        (((e[2] & 0x1F) as u16) << 8) | (e[3] as u16),
        })
        .collect();
    Ok(PatSection{
        transport_stream_id: sec.table_id_extension,
        version:             sec.version,
        programs,
        packet:              raw.packet.clone(),
    })
}

impl PsiTable for PatSection {
    const NAME: &'static str = "PAT";
    const STRICT: bool = true;

    fn default_pids() -> &'static [u16] { &[PAT_PID] }
    fn accepts(table_id: u8) -> bool { table_id == PAT_TABLE_ID }
    fn parse(sec: &SectionReader<'_>, raw: &RawSection) -> Result<Self> { parse_pat(sec, raw) }
}
