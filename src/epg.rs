//! EPG extraction: frequency-weighted deduplication of present events.
//!
//! EIT is retransmitted about once per second, so a real programme entry is
//! seen many times while boundary artifacts and garbled sections show up
//! only a few times. Entries seen `threshold` times or fewer are dropped.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use tracing::{debug, info};

use crate::capture::CaptureSource;
use crate::error::Result;
use crate::event::Event;
use crate::psi::{sections, EitSection, PidFilter};
use crate::types::{EpgOptions, EpgStats};

/// `(start_time, title)` rendered as strings.
pub type DedupKey = (String, String);

/// One output line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpgRecord {
    pub start_time: String,
    /// seconds
    pub duration: f64,
    pub title: String,
    pub desc: String,
    pub genre: Option<u8>,
    pub subgenre: Option<u8>,
    pub user_genre: Option<u8>,
}

impl EpgRecord {
    pub fn from_event(event: &Event) -> Self {
        Self {
            start_time: event.start_time.map(|t| t.to_string()).unwrap_or_default(),
            duration: event.duration.map_or(0.0, |d| d.num_milliseconds() as f64 / 1000.0),
            title: event.title.clone(),
            desc: event.desc.clone(),
            genre: event.genre,
            subgenre: event.subgenre,
            user_genre: event.user_genre,
        }
    }

    pub fn key(&self) -> DedupKey {
        (self.start_time.clone(), self.title.clone())
    }
}

struct Sighting {
    count: u32,
    body: String,
}

/// Counts sightings per key and keeps the last serialized body.
#[derive(Default)]
pub struct EpgAggregator {
    entries: BTreeMap<DedupKey, Sighting>,
    stats: EpgStats,
}

impl EpgAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only section 0 (the event on air) is counted.
    pub fn observe(&mut self, section: &EitSection) -> Result<()> {
        if section.section_number != 0 {
            return Ok(());
        }
        self.stats.sections += 1;

        for raw in &section.events {
            self.stats.events += 1;
            let event = Event::from_eit(raw);
            if !event.is_complete() {
                debug!(service = section.service_id, event = event.event_id, "skipping incomplete event");
                self.stats.incomplete += 1;
                continue;
            }
            let record = EpgRecord::from_event(&event);
            let body = serde_json::to_string(&record)?;
            let sighting = self
                .entries
                .entry(record.key())
                .or_insert_with(|| Sighting { count: 0, body: String::new() });
            sighting.count += 1;
            sighting.body = body;
        }
        Ok(())
    }

    pub fn stats(&self) -> EpgStats {
        EpgStats { keys: self.entries.len() as u64, ..self.stats }
    }

    /// Bodies of keys seen more than `threshold` times, ascending by key.
    pub fn finish(self, threshold: u32) -> impl Iterator<Item = String> {
        self.entries.into_iter().filter_map(move |(key, s)| {
            if s.count > threshold {
                Some(s.body)
            } else {
                debug!(start_time = %key.0, title = %key.1, count = s.count, "below threshold");
                None
            }
        })
    }
}

/// Consumes every section, then yields the surviving records in key order.
pub fn extract<I>(sections: I, threshold: u32) -> Result<impl Iterator<Item = String>>
where
    I: IntoIterator<Item = Result<EitSection>>,
{
    let mut aggregator = EpgAggregator::new();
    for section in sections {
        aggregator.observe(&section?)?;
    }
    Ok(aggregator.finish(threshold))
}

/// Writes one JSON line per retained EPG entry.
pub fn write_epg<S: CaptureSource, W: Write>(
    source: &S,
    sink: &mut W,
    options: &EpgOptions,
) -> Result<EpgStats> {
    let mut aggregator = EpgAggregator::new();
    for section in sections::<EitSection, _>(source.packets()?, PidFilter::Default) {
        aggregator.observe(&section?)?;
    }
    let mut stats = aggregator.stats();

    for line in aggregator.finish(options.threshold) {
        writeln!(sink, "{line}")?;
        stats.written += 1;
    }
    sink.flush()?;

    info!(
        sections = stats.sections,
        events = stats.events,
        incomplete = stats.incomplete,
        keys = stats.keys,
        written = stats.written,
        "EPG extraction finished"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psi::EitEvent;

    // MJD 0xEB96 = 2024-01-01
    fn event(hour_bcd: u8, title: &[u8], genre: bool, duration: [u8; 3]) -> EitEvent {
        let mut d = vec![0x4D, (5 + title.len() + 1) as u8, b'j', b'p', b'n', (title.len() + 1) as u8, 0x0E];
        d.extend_from_slice(title);
        d.push(0);
        if genre {
            d.extend([0x54, 2, 0x00, 0xFF]);
        }
        EitEvent {
            event_id: 1,
            start_time: [0xEB, 0x96, hour_bcd, 0x00, 0x00],
            duration,
            descriptors: d,
        }
    }

    fn section(number: u8, events: Vec<EitEvent>) -> EitSection {
        EitSection {
            service_id: 0x400,
            section_number: number,
            events,
        }
    }

    const HOUR: [u8; 3] = [0x01, 0x00, 0x00];

    fn run(sections: Vec<EitSection>, threshold: u32) -> Vec<EpgRecord> {
        extract(sections.into_iter().map(Ok), threshold)
            .unwrap()
            .map(|s| {
                let v: serde_json::Value = serde_json::from_str(&s).unwrap();
                EpgRecord {
                    start_time: v["start_time"].as_str().unwrap().to_owned(),
                    duration: v["duration"].as_f64().unwrap(),
                    title: v["title"].as_str().unwrap().to_owned(),
                    desc: v["desc"].as_str().unwrap().to_owned(),
                    genre: v["genre"].as_u64().map(|g| g as u8),
                    subgenre: v["subgenre"].as_u64().map(|g| g as u8),
                    user_genre: v["user_genre"].as_u64().map(|g| g as u8),
                }
            })
            .collect()
    }

    #[test]
    fn six_sightings_pass_default_threshold() {
        let mut secs: Vec<_> = (0..6).map(|_| section(0, vec![event(0x20, b"News", true, HOUR)])).collect();
        secs.push(section(0, vec![event(0x20, b"News", false, HOUR)]));

        let out = run(secs, 5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start_time, "2024-01-01 20:00:00");
        assert_eq!(out[0].title, "News");
        assert_eq!(out[0].duration, 3600.0);
        assert_eq!(out[0].genre, Some(0));
    }

    #[test]
    fn threshold_is_strict() {
        let secs: Vec<_> = (0..5).map(|_| section(0, vec![event(0x20, b"News", true, HOUR)])).collect();
        assert!(run(secs, 5).is_empty());
    }

    #[test]
    fn incomplete_events_never_count() {
        let mut secs: Vec<_> = (0..3).map(|_| section(0, vec![event(0x20, b"A", true, HOUR)])).collect();
        secs.extend((0..10).map(|_| section(0, vec![event(0x20, b"A", false, HOUR)])));
        secs.extend((0..10).map(|_| section(0, vec![event(0x20, b"A", true, [0, 0, 0])])));
        assert!(run(secs, 3).is_empty());
    }

    #[test]
    fn following_sections_are_ignored() {
        let secs: Vec<_> = (0..10).map(|_| section(1, vec![event(0x21, b"Next", true, HOUR)])).collect();
        assert!(run(secs, 0).is_empty());
    }

    #[test]
    fn output_is_sorted_by_key() {
        let mut secs = Vec::new();
        for _ in 0..2 {
            secs.push(section(0, vec![event(0x21, b"Late", true, HOUR)]));
            secs.push(section(0, vec![event(0x20, b"Zeta", true, HOUR)]));
            secs.push(section(0, vec![event(0x20, b"Alpha", true, HOUR)]));
        }
        let titles: Vec<_> = run(secs, 1).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Alpha", "Zeta", "Late"]);
    }

    #[test]
    fn non_ascii_is_not_escaped() {
        let ev = Event {
            event_id: 1,
            start_time: None,
            duration: Some(chrono::Duration::seconds(90)),
            title: "ニュース".into(),
            desc: String::new(),
            genre: Some(0),
            subgenre: Some(0),
            user_genre: None,
        };
        let json = serde_json::to_string(&EpgRecord::from_event(&ev)).unwrap();
        assert!(json.contains("ニュース"));
        assert!(json.contains("\"duration\":90.0"));
        assert!(json.contains("\"user_genre\":null"));
    }
}
