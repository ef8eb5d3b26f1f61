use chrono::{Duration, NaiveDateTime};

use crate::models::{Booking, TimeSlot};

/// Every appointment is blocked out for two hours from the slot start.
pub const APPOINTMENT_HOURS: i64 = 2;

pub fn generate_ics(booking: &Booking, slot: &TimeSlot, service_name: &str, uid: &str) -> String {
    let start = NaiveDateTime::new(booking.date, slot.start);
    let end = start + Duration::hours(APPOINTMENT_HOURS);

    let dtstart = start.format("%Y%m%dT%H%M%S").to_string();
    let dtend = end.format("%Y%m%dT%H%M%S").to_string();
    let dtstamp = booking.created_at.format("%Y%m%dT%H%M%SZ").to_string();
    let summary = escape_text(&format!("{service_name} - {}", booking.service_type.as_str()));
    let location = escape_text(&booking.address);

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//CleanRide//Booking//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}@cleanride\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         LOCATION:{location}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

// RFC 5545 TEXT escaping.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}
