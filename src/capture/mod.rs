//! Capture sources and the packet reader.
//!
//! A capture must be readable more than once: the splitter scans it once to
//! learn the program layout and a second time to copy packets. Sources are
//! therefore re-openable factories rather than iterators.

pub mod packet;

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::PathBuf;

use bytes::Bytes;
use tracing::warn;

use crate::constants::{TS_PACKET_SIZE, TS_SYNC_BYTE};
use crate::error::Result;
pub use packet::Packet;

/// Something that can hand out independent forward-only reads of a capture.
pub trait CaptureSource {
    type Reader: Read;

    /// Opens a fresh read positioned at the start of the capture.
    fn open(&self) -> Result<Self::Reader>;

    fn packets(&self) -> Result<PacketReader<Self::Reader>> {
        Ok(PacketReader::new(self.open()?))
    }
}

/// Capture stored in a file; each `open` gets its own file handle.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CaptureSource for FileSource {
    type Reader = BufReader<File>;

    fn open(&self) -> Result<Self::Reader> {
        Ok(BufReader::new(File::open(&self.path)?))
    }
}

/// Capture held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl CaptureSource for MemorySource {
    type Reader = Cursor<Bytes>;

    fn open(&self) -> Result<Self::Reader> {
        Ok(Cursor::new(self.data.clone()))
    }
}

/// Splits a byte stream into 188-byte packets, resynchronising on 0x47.
pub struct PacketReader<R> {
    inner: R,
    buf: [u8; TS_PACKET_SIZE],
    done: bool,
}

impl<R: Read> PacketReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, buf: [0u8; TS_PACKET_SIZE], done: false }
    }

    /// Fills `buf[filled..]`; false on EOF before the packet is complete.
    fn fill(&mut self, mut filled: usize) -> io::Result<bool> {
        while filled < TS_PACKET_SIZE {
            match self.inner.read(&mut self.buf[filled..]) {
                Ok(0) => return Ok(false),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    fn next_packet(&mut self) -> io::Result<Option<Packet>> {
        if !self.fill(0)? {
            return Ok(None);
        }
        let mut skipped = 0usize;
        while self.buf[0] != TS_SYNC_BYTE {
            match self.buf[1..].iter().position(|&b| b == TS_SYNC_BYTE) {
                Some(pos) => {
                    let start = pos + 1;
                    self.buf.copy_within(start.., 0);
                    skipped += start;
                    if !self.fill(TS_PACKET_SIZE - start)? {
                        return Ok(None);
                    }
                }
                None => {
                    skipped += TS_PACKET_SIZE;
                    if !self.fill(0)? {
                        return Ok(None);
                    }
                }
            }
        }
        if skipped > 0 {
            warn!(skipped, "lost sync, resynchronised on next sync byte");
        }
        Ok(Some(Packet::from_slice(&self.buf)))
    }
}

impl<R: Read> Iterator for PacketReader<R> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_packet() {
            Ok(Some(p)) => Some(Ok(p)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}
