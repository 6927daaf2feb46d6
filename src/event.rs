//! Higher-level view over a raw EIT event entry.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::arib;
use crate::constants::{CONTENT_DESCRIPTOR, SHORT_EVENT_DESCRIPTOR};
use crate::psi::EitEvent;

/// Decoded event fields; anything the broadcaster left undefined is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_id: u16,
    pub start_time: Option<NaiveDateTime>,
    pub duration: Option<Duration>,
    pub title: String,
    pub desc: String,
    /// Level-1 nibble of the first content descriptor's first entry; later
    /// entries and later content descriptors are ignored.
    pub genre: Option<u8>,
    pub subgenre: Option<u8>,
    pub user_genre: Option<u8>,
}

fn bcd(b: u8) -> Option<u32> {
    let (hi, lo) = (b >> 4, b & 0x0F);
    (hi < 10 && lo < 10).then(|| (hi * 10 + lo) as u32)
}

fn bcd_hms(raw: &[u8]) -> Option<(u32, u32, u32)> {
    Some((bcd(raw[0])?, bcd(raw[1])?, bcd(raw[2])?))
}

/// MJD + BCD time; all ones means "undefined".
pub fn decode_start_time(raw: &[u8; 5]) -> Option<NaiveDateTime> {
    if raw.iter().all(|&b| b == 0xFF) {
        return None;
    }
    let mjd = u16::from_be_bytes([raw[0], raw[1]]);
    let (h, m, s) = bcd_hms(&raw[2..])?;
    let epoch = NaiveDate::from_ymd_opt(1858, 11, 17)?;
    let date = epoch.checked_add_days(chrono::Days::new(mjd as u64))?;
    Some(date.and_time(NaiveTime::from_hms_opt(h, m, s)?))
}

/// BCD hh mm ss; all ones means "undefined".
pub fn decode_duration(raw: &[u8; 3]) -> Option<Duration> {
    if raw.iter().all(|&b| b == 0xFF) {
        return None;
    }
    let (h, m, s) = bcd_hms(raw)?;
    Some(Duration::seconds((h * 3600 + m * 60 + s) as i64))
}

impl Event {
    pub fn from_eit(raw: &EitEvent) -> Self {
        let mut event = Event {
            event_id: raw.event_id,
            start_time: decode_start_time(&raw.start_time),
            duration: decode_duration(&raw.duration),
            title: String::new(),
            desc: String::new(),
            genre: None,
            subgenre: None,
            user_genre: None,
        };

        for (tag, data) in raw.descriptors() {
            match tag {
                SHORT_EVENT_DESCRIPTOR => {
                    // ISO_639_language_code(24) name_len name text_len text
                    let Some(&name_len) = data.get(3) else { continue };
                    let name_end = 4 + name_len as usize;
                    if let Some(name) = data.get(4..name_end) {
                        event.title = arib::decode(name);
                    }
                    if let Some(&text_len) = data.get(name_end) {
                        let text_start = name_end + 1;
                        if let Some(text) = data.get(text_start..text_start + text_len as usize) {
                            event.desc = arib::decode(text);
                        }
                    }
                }
                CONTENT_DESCRIPTOR if event.genre.is_none() && data.len() >= 2 => {
                    event.genre = Some(data[0] >> 4);
                    event.subgenre = Some(data[0] & 0x0F);
                    event.user_genre = Some(data[1]);
                }
                _ => {}
            }
        }
        event
    }

    /// Events without a usable duration or any genre are noise for the EPG.
    pub fn is_complete(&self) -> bool {
        let has_duration = self.duration.is_some_and(|d| !d.is_zero());
        has_duration && self.genre.is_some()
    }
}
