use crate::constants::PMT_TABLE_ID;
use crate::error::{Error, Result};
use crate::psi::assembler::RawSection;
use crate::psi::section::SectionReader;
use crate::psi::PsiTable;

/// ─────────── PMT ───────────
#[derive(Debug, Clone)]
pub struct PmtSection {
    pub version:        u8,
    pub program_number: u16,
    pub pcr_pid:        u16,
    pub streams:        Vec<StreamInfo>,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub stream_type:   u8,
    pub elementary_pid:u16,
}

pub fn parse_pmt(sec: &SectionReader<'_>) -> Result<PmtSection> {
    if sec.table_id != PMT_TABLE_ID { return Err(Error::malformed("not PMT")) }
    let b = sec.body;
    if b.len() < 4 { return Err(Error::malformed("PMT body too short")) }

    /* ── fixed header inside the body ── */
    let pcr_pid       = (((b[0] & 0x1F) as u16) << 8) | (b[1] as u16);
    let prog_info_len = (((b[2] & 0x0F) as usize) << 8) | (b[3] as usize);
    let mut idx       = 4 + prog_info_len;          // skip program descriptors
    if idx > b.len() { return Err(Error::malformed("PMT program_info_length overruns section")) }

    /* ── ES loop ── */
    let mut streams = Vec::new();
    while idx + 5 <= b.len() {
        let stype = b[idx];
        let pid   = (((b[idx+1] & 0x1F) as u16) << 8) | (b[idx+2] as u16);
        let eslen = (((b[idx+3] & 0x0F) as usize) << 8) | (b[idx+4] as usize);
        idx += 5 + eslen;                          // skip ES descriptors
        if idx > b.len() { return Err(Error::malformed("PMT ES_info_length overruns section")) }
        streams.push(StreamInfo{ stream_type:stype, elementary_pid:pid });
    }

    Ok(PmtSection{ version:sec.version,
                   program_number:sec.table_id_extension,
                   pcr_pid,
                   streams })
}

impl PsiTable for PmtSection {
    const NAME: &'static str = "PMT";
    const STRICT: bool = true;

    /// PMT PIDs are only known from the PAT; callers pass them explicitly.
    fn default_pids() -> &'static [u16] { &[] }
    fn accepts(table_id: u8) -> bool { table_id == PMT_TABLE_ID }
    fn parse(sec: &SectionReader<'_>, _raw: &RawSection) -> Result<Self> { parse_pmt(sec) }
}
