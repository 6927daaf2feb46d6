//! Bit-serial CRC-32 as used by PSI/SI sections (CRC-32/MPEG-2).
//!
//! Polynomial 0x04C11DB7, initial register 0xFFFFFFFF, MSB first,
//! no reflection and no final XOR.

const POLY: u32 = 0x04C1_1DB7;

/// Computes the section CRC one bit at a time.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        for shift in (0..8).rev() {
            let bit = (byte >> shift) & 0x01;
            let carry = (crc >> 31) as u8;
            crc <<= 1;
            if carry ^ bit != 0 {
                crc ^= POLY;
            }
        }
    }
    crc
}

/// True when the trailing 4 bytes are the big-endian CRC of what precedes them.
pub fn verify(section: &[u8]) -> bool {
    if section.len() < 4 {
        return false;
    }
    let (body, tail) = section.split_at(section.len() - 4);
    let stored = u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]]);
    crc32(body) == stored
}
