//! Constants for MPEG-TS / ARIB SI processing

/// MPEG-TS packet constants
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_SYNC_BYTE: u8 = 0x47;
pub const STUFFING_BYTE: u8 = 0xFF;

/// Well-known PIDs
pub const PAT_PID: u16 = 0x0000;
pub const NULL_PID: u16 = 0x1FFF; // also "no PCR" in a PMT
pub const EIT_PIDS: &[u16] = &[
    0x0012, // EIT (H-EIT on ISDB)
    0x0026, // M-EIT
    0x0027, // L-EIT
];

/// Table ids
pub const PAT_TABLE_ID: u8 = 0x00;
pub const PMT_TABLE_ID: u8 = 0x02;
pub const EIT_TABLE_IDS: std::ops::RangeInclusive<u8> = 0x4E..=0x6F;

/// Closed caption / teletext stream type, never retained by the splitter
pub const STREAM_TYPE_CAPTION: u8 = 0x0D;

/// PAT rewrite template: section header plus two association entries
pub const PAT_TEMPLATE_LEN: usize = 16;
pub const PAT_SENTINEL_OFFSET: usize = 2;
pub const PAT_SENTINEL_VALUE: u8 = 0x11;
/// TS header + pointer field, copied from every PAT packet in the output
pub const PAT_PREFIX_LEN: usize = 5;
/// Size of the synthesized PAT body following the prefix
pub const PAT_BODY_LEN: usize = TS_PACKET_SIZE - PAT_PREFIX_LEN;

/// Descriptor tags used by the event view
pub const SHORT_EVENT_DESCRIPTOR: u8 = 0x4D;
pub const CONTENT_DESCRIPTOR: u8 = 0x54;

/// EPG frequency threshold (sightings must be strictly greater)
pub const DEFAULT_EPG_THRESHOLD: u32 = 5;
