//! PSI/SI section decoding: reassembly, CRC validation and typed tables.

pub mod assembler;
pub mod eit;
pub mod pat;
pub mod pmt;
pub mod section;

use std::collections::VecDeque;
use std::io::Read;
use std::marker::PhantomData;

use tracing::debug;

use crate::capture::PacketReader;
use crate::error::Result;
use assembler::{RawSection, SectionAssembler};
use section::SectionReader;

pub use eit::{parse_eit, EitEvent, EitSection};
pub use pat::{parse_pat, PatEntry, PatSection};
pub use pmt::{parse_pmt, PmtSection, StreamInfo};

/// A table type that can be decoded out of a section.
pub trait PsiTable: Sized {
    const NAME: &'static str;
    /// Broken bodies in CRC-valid sections abort instead of being skipped.
    const STRICT: bool;

    fn default_pids() -> &'static [u16];
    fn accepts(table_id: u8) -> bool;
    fn parse(sec: &SectionReader<'_>, raw: &RawSection) -> Result<Self>;
}

/// Which PIDs a section lookup listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PidFilter {
    /// The table type's well-known PIDs.
    Default,
    Only(Vec<u16>),
}

impl PidFilter {
    fn resolve<T: PsiTable>(self) -> Vec<u16> {
        match self {
            PidFilter::Default => T::default_pids().to_vec(),
            PidFilter::Only(pids) => pids,
        }
    }
}

/// Lazily yields decoded tables of type `T` from a packet stream.
pub struct Sections<R, T> {
    packets:   PacketReader<R>,
    pids:      Vec<u16>,
    assembler: SectionAssembler,
    pending:   VecDeque<RawSection>,
    _table:    PhantomData<T>,
}

pub fn sections<T: PsiTable, R: Read>(packets: PacketReader<R>, filter: PidFilter) -> Sections<R, T> {
    Sections {
        packets,
        pids: filter.resolve::<T>(),
        assembler: SectionAssembler::new(),
        pending: VecDeque::new(),
        _table: PhantomData,
    }
}

fn decode<T: PsiTable>(raw: &RawSection) -> Result<Option<T>> {
    let sec = match SectionReader::new(&raw.data) {
        Ok(sec) => sec,
        Err(e) => {
            debug!(pid = raw.pid, table = T::NAME, "dropping section: {e}");
            return Ok(None);
        }
    };
    if !T::accepts(sec.table_id) || !sec.current_next {
        return Ok(None);
    }
    match T::parse(&sec, raw) {
        Ok(table) => Ok(Some(table)),
        Err(e) if T::STRICT => Err(e),
        Err(e) => {
            debug!(pid = raw.pid, table = T::NAME, "skipping garbled section: {e}");
            Ok(None)
        }
    }
}

impl<R: Read, T: PsiTable> Iterator for Sections<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(raw) = self.pending.pop_front() {
                match decode::<T>(&raw) {
                    Ok(Some(table)) => return Some(Ok(table)),
                    Ok(None) => continue,
                    Err(e) => return Some(Err(e)),
                }
            }
            let packet = match self.packets.next()? {
                Ok(p) => p,
                Err(e) => return Some(Err(e)),
            };
            if !self.pids.contains(&packet.pid()) {
                continue;
            }
            self.pending.extend(self.assembler.push(&packet));
        }
    }
}
