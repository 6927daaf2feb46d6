//! Two-pass program splitter.
//!
//! Pass one reads the capture until it has the PAT and the selected
//! program's PMT. Pass two re-reads the capture from the start and copies
//! only packets of retained PIDs, replacing every PAT packet.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use bytes::Bytes;
use tracing::{debug, info};

use crate::capture::{CaptureSource, FileSource};
use crate::constants::{NULL_PID, PAT_PID, PAT_PREFIX_LEN, STREAM_TYPE_CAPTION};
use crate::error::{Error, Result, Table};
use crate::psi::{sections, PatEntry, PatSection, PidFilter, PmtSection};
use crate::rewrite::{replace_pat, splice};
use crate::types::{FilterStats, SplitOptions};

/// Picks the program to keep out of a PAT.
pub trait ProgramSelector {
    fn select(&self, pat: &PatSection) -> Option<PatEntry>;
}

/// The first program listed in the PAT (program 0 excluded).
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstProgram;

impl ProgramSelector for FirstProgram {
    fn select(&self, pat: &PatSection) -> Option<PatEntry> {
        pat.programs.iter().find(|e| e.program_number != 0).copied()
    }
}

/// PIDs that survive the copy pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedPids {
    pub pmt_pid: u16,
    streams: BTreeSet<u16>,
}

impl RetainedPids {
    /// `{PCR_PID} ∪ {non-caption elementary PIDs}`, plus the PMT PID itself.
    pub fn from_pmt(pmt_pid: u16, pmt: &PmtSection) -> Result<Self> {
        if pmt.pcr_pid == NULL_PID {
            return Err(Error::TableNotFound(Table::PcrPid));
        }
        let mut streams = BTreeSet::new();
        streams.insert(pmt.pcr_pid);
        streams.extend(
            pmt.streams
                .iter()
                .filter(|s| s.stream_type != STREAM_TYPE_CAPTION)
                .map(|s| s.elementary_pid),
        );
        Ok(Self { pmt_pid, streams })
    }

    /// PCR and elementary stream PIDs.
    pub fn stream_pids(&self) -> &BTreeSet<u16> {
        &self.streams
    }

    pub fn contains(&self, pid: u16) -> bool {
        pid == self.pmt_pid || self.streams.contains(&pid)
    }
}

/// Everything the copy pass needs, learned by the discovery pass.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub program: PatEntry,
    pub pat_pid: u16,
    /// Full replacement for the original PAT packet.
    pub new_pat: Bytes,
    pub retained: RetainedPids,
}

impl Discovery {
    /// Body following the 5-byte prefix of every output PAT packet.
    pub fn pat_body(&self) -> &[u8] {
        &self.new_pat[PAT_PREFIX_LEN..]
    }
}

/// Pass one: read-only scan for the PAT and the selected program's PMT.
pub fn discover<S: CaptureSource>(source: &S, selector: &dyn ProgramSelector) -> Result<Discovery> {
    let pat = sections::<PatSection, _>(source.packets()?, PidFilter::Default)
        .next()
        .transpose()?
        .ok_or(Error::TableNotFound(Table::Pat))?;
    let new_pat = replace_pat(&pat.packet)?;
    let program = selector.select(&pat).ok_or(Error::TableNotFound(Table::Pmt))?;
    debug!(
        program = program.program_number,
        pmt_pid = program.pmt_pid,
        pat_version = pat.version,
        "selected program"
    );

    let pmt = sections::<PmtSection, _>(source.packets()?, PidFilter::Only(vec![program.pmt_pid]))
        .find(|pmt| !matches!(pmt, Ok(p) if p.program_number != program.program_number))
        .transpose()?
        .ok_or(Error::TableNotFound(Table::Pmt))?;
    let retained = RetainedPids::from_pmt(program.pmt_pid, &pmt)?;
    info!(
        program = program.program_number,
        pmt_version = pmt.version,
        pcr_pid = pmt.pcr_pid,
        streams = ?retained.stream_pids(),
        "discovered program layout"
    );

    Ok(Discovery { program, pat_pid: PAT_PID, new_pat, retained })
}

/// Pass two: copy retained packets from a fresh read of `source` into `sink`.
pub fn copy_filtered<S: CaptureSource, W: Write>(
    source: &S,
    discovery: &Discovery,
    sink: &mut W,
) -> Result<FilterStats> {
    let mut stats = FilterStats::default();
    for packet in source.packets()? {
        let packet = packet?;
        let pid = packet.pid();
        if pid == discovery.pat_pid {
            sink.write_all(&splice(packet.as_bytes(), discovery.pat_body()))?;
            stats.pat_replaced += 1;
        } else if discovery.retained.contains(pid) {
            sink.write_all(packet.as_bytes())?;
            stats.kept += 1;
        } else {
            stats.dropped += 1;
        }
    }
    Ok(stats)
}

/// Splits `input` into `output`, keeping only the selected program.
///
/// The output file is created only after discovery succeeded, and is
/// flushed whether or not the copy pass completes.
pub fn filter(input: &Path, output: &Path, options: &SplitOptions) -> Result<FilterStats> {
    let source = FileSource::new(input);
    let discovery = discover(&source, options.selector.as_ref())?;

    let mut out = BufWriter::new(File::create(output)?);
    let copied = copy_filtered(&source, &discovery, &mut out);
    let flushed = out.flush();
    let stats = copied?;
    flushed?;

    info!(
        kept = stats.kept,
        dropped = stats.dropped,
        pat_replaced = stats.pat_replaced,
        "wrote {}",
        output.display()
    );
    Ok(stats)
}
