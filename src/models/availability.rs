use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::Serialize;

/// Separator used in slot labels (EN DASH, U+2013).
pub const SLOT_SEPARATOR: char = '–';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> anyhow::Result<Self> {
        if start >= end {
            anyhow::bail!(
                "slot must end after it starts: {}-{}",
                start.format("%H:%M"),
                end.format("%H:%M")
            );
        }
        Ok(Self { start, end })
    }

    /// Parses `HH:MM–HH:MM`; an ASCII hyphen is accepted in place of the dash.
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        let (start, end) = s
            .split_once(SLOT_SEPARATOR)
            .or_else(|| s.split_once('-'))
            .ok_or_else(|| anyhow::anyhow!("invalid slot format: {s}"))?;
        Self::new(parse_time(start.trim())?, parse_time(end.trim())?)
    }

    pub fn label(&self) -> String {
        format!(
            "{}{SLOT_SEPARATOR}{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// The ordered base set of bookable slots for an open day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSchedule {
    slots: Vec<TimeSlot>,
}

impl Default for SlotSchedule {
    fn default() -> Self {
        let slot = |a: u32, b: u32| TimeSlot {
            start: NaiveTime::from_hms_opt(a, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(b, 0, 0).unwrap_or_default(),
        };
        Self {
            slots: vec![slot(9, 11), slot(12, 14), slot(15, 17)],
        }
    }
}

impl SlotSchedule {
    pub fn new(slots: Vec<TimeSlot>) -> anyhow::Result<Self> {
        if slots.is_empty() {
            anyhow::bail!("slot schedule must not be empty");
        }
        for (i, slot) in slots.iter().enumerate() {
            if slots[..i].contains(slot) {
                anyhow::bail!("duplicate slot in schedule: {}", slot.label());
            }
        }
        Ok(Self { slots })
    }

    /// Parses a comma-separated list such as `09:00-11:00,12:00-14:00`.
    pub fn from_list(s: &str) -> anyhow::Result<Self> {
        let slots = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(TimeSlot::parse)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Self::new(slots)
    }

    pub fn labels(&self) -> Vec<String> {
        self.slots.iter().map(TimeSlot::label).collect()
    }

    pub fn find(&self, label: &str) -> Option<&TimeSlot> {
        self.slots.iter().find(|slot| slot.label() == label)
    }
}

/// Strict `YYYY-MM-DD` parsing; anything else (including out-of-range days)
/// is rejected.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    if bytes.len() != 10 {
        return None;
    }
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!("invalid time format: {s}"));
    }
    let hour: u32 = parts[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = parts[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| anyhow::anyhow!("time out of range: {s}"))
}
