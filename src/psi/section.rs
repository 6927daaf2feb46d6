// psi/section.rs
//! Generic long-form PSI / SI section reader with CRC-32 (MPEG-2) validation.

use crc::{Crc, CRC_32_MPEG_2};

use crate::error::{Error, Result};

/// Header fields of one complete section; `body` excludes header and CRC.
pub struct SectionReader<'a> {
    pub table_id:          u8,
    pub table_id_extension:u16,
    pub version:           u8,
    pub current_next:      bool,
    pub section_number:    u8,
    pub body:              &'a [u8],
}

const CRC_MPEG: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

impl<'a> SectionReader<'a> {
    /// `section` starts at table_id (pointer field already consumed).
    pub fn new(section: &'a [u8]) -> Result<Self> {
        if section.len() < 3 { return Err(Error::malformed("short section")) }

        let table_id = section[0];
        let sec_len  = (((section[1] & 0x0F) as usize) << 8) | section[2] as usize;
        if sec_len < 9 { return Err(Error::malformed("invalid section_length")) }
        let end = 3 + sec_len;
        if end > section.len() { return Err(Error::malformed("truncated section")) }

        let crc_calc = CRC_MPEG.checksum(&section[..end - 4]);
        let crc_pkt  = u32::from_be_bytes([
            section[end - 4], section[end - 3], section[end - 2], section[end - 1],
        ]);
        if crc_calc != crc_pkt {
            return Err(Error::malformed(format!(
                "CRC-32 mismatch (table 0x{table_id:02X}: 0x{crc_pkt:08X} != 0x{crc_calc:08X})"
            )));
        }

        Ok(Self {
            table_id,
            table_id_extension: u16::from_be_bytes([section[3], section[4]]),
            version:            (section[5] & 0x3E) >> 1,
            current_next:       section[5] & 0x01 != 0,
            section_number:     section[6],
            body:               &section[8..end - 4],
        })
    }
}
