// src/lib.rs
//! Transport stream tools: EPG extraction and single-program splitting.

pub mod arib;
pub mod capture;
pub mod checksum;
pub mod constants;
pub mod epg;
pub mod error;
pub mod event;
pub mod filter;
pub mod logging;
pub mod psi;
pub mod rewrite;
pub mod types;

pub use capture::{CaptureSource, FileSource, MemorySource, Packet, PacketReader};
pub use checksum::crc32;
pub use epg::{extract, write_epg, EpgAggregator, EpgRecord};
pub use error::{Error, Result, Table};
pub use event::Event;
pub use filter::{copy_filtered, discover, filter, Discovery, FirstProgram, ProgramSelector, RetainedPids};
pub use rewrite::replace_pat;
pub use types::{EpgOptions, EpgStats, FilterStats, SplitOptions};
