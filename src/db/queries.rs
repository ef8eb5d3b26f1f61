use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    BlockedDay, BlockedSlot, Booking, BookingStatus, DayCount, NewBooking, ServiceCount, ServiceType,
};

const BOOKING_COLUMNS: &str =
    "id, service_type, date, time_slot, name, phone, email, address, notes, status, created_at";

// ── Bookings ──

/// Inserts a confirmed booking. Returns `None` when the slot is already held by
/// another active booking (unique index violation).
pub fn insert_booking(conn: &Connection, booking: &NewBooking) -> anyhow::Result<Option<i64>> {
    let created_at = booking
        .created_at
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

    let result = conn.execute(
        "INSERT INTO bookings (service_type, date, time_slot, name, phone, email, address, notes, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.service_type.as_str(),
            booking.date.format("%Y-%m-%d").to_string(),
            booking.time_slot,
            booking.name,
            booking.phone,
            booking.email,
            booking.address,
            booking.notes,
            BookingStatus::Confirmed.as_str(),
            created_at,
        ],
    );

    match result {
        Ok(_) => Ok(Some(conn.last_insert_rowid())),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Slots on `date` held by active bookings.
pub fn booked_slots(conn: &Connection, date: &str) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT time_slot FROM bookings WHERE date = ?1 AND status != 'cancelled'",
    )?;
    let rows = stmt.query_map(params![date], |row| row.get::<_, String>(0))?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

/// Active bookings from `from` onwards, in calendar order.
pub fn get_upcoming_bookings(conn: &Connection, from: NaiveDate) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE date >= ?1 AND status != 'cancelled'
         ORDER BY date ASC, time_slot ASC"
    ))?;

    let rows = stmt.query_map(params![from.format("%Y-%m-%d").to_string()], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_active_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE status != 'cancelled'
         ORDER BY date ASC, time_slot ASC, id ASC"
    ))?;

    let rows = stmt.query_map([], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn cancel_booking(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2 AND status != ?1",
        params![BookingStatus::Cancelled.as_str(), id],
    )?;
    Ok(count > 0)
}

pub fn count_by_service(conn: &Connection) -> anyhow::Result<Vec<ServiceCount>> {
    let mut stmt = conn.prepare(
        "SELECT service_type, COUNT(*) FROM bookings
         WHERE status != 'cancelled'
         GROUP BY service_type ORDER BY service_type ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(ServiceCount {
            service_type: row.get(0)?,
            count: row.get(1)?,
        })
    })?;

    let mut counts = vec![];
    for row in rows {
        counts.push(row?);
    }
    Ok(counts)
}

pub fn count_by_day(conn: &Connection) -> anyhow::Result<Vec<DayCount>> {
    let mut stmt = conn.prepare(
        "SELECT date, COUNT(*) FROM bookings
         WHERE status != 'cancelled'
         GROUP BY date ORDER BY date ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(DayCount {
            date: row.get(0)?,
            count: row.get(1)?,
        })
    })?;

    let mut counts = vec![];
    for row in rows {
        counts.push(row?);
    }
    Ok(counts)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: i64 = row.get(0)?;
    let service_type_str: String = row.get(1)?;
    let date_str: String = row.get(2)?;
    let time_slot: String = row.get(3)?;
    let name: String = row.get(4)?;
    let phone: String = row.get(5)?;
    let email: String = row.get(6)?;
    let address: String = row.get(7)?;
    let notes: String = row.get(8)?;
    let status_str: String = row.get(9)?;
    let created_at_str: String = row.get(10)?;

    let service_type = ServiceType::parse(&service_type_str)
        .ok_or_else(|| anyhow::anyhow!("unknown service type in booking {id}: {service_type_str}"))?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("bad date in booking {id}: {e}"))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow::anyhow!("bad created_at in booking {id}: {e}"))?;

    Ok(Booking {
        id,
        service_type,
        date,
        time_slot,
        name,
        phone,
        email,
        address,
        notes,
        status: BookingStatus::parse(&status_str),
        created_at,
    })
}

// ── Blocked Days ──

pub fn is_day_blocked(conn: &Connection, date: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM blocked_days WHERE date = ?1",
        params![date],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Returns false when the day was already blocked.
pub fn block_day(conn: &Connection, date: &str, reason: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "INSERT OR IGNORE INTO blocked_days (date, reason) VALUES (?1, ?2)",
        params![date, reason],
    )?;
    Ok(count > 0)
}

pub fn unblock_day(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM blocked_days WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_blocked_days(conn: &Connection) -> anyhow::Result<Vec<BlockedDay>> {
    let mut stmt = conn.prepare("SELECT id, date, reason FROM blocked_days ORDER BY date ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(BlockedDay {
            id: row.get(0)?,
            date: row.get(1)?,
            reason: row.get(2)?,
        })
    })?;

    let mut days = vec![];
    for row in rows {
        days.push(row?);
    }
    Ok(days)
}

// ── Blocked Slots ──

pub fn blocked_slots_for_date(conn: &Connection, date: &str) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT time_slot FROM blocked_slots WHERE date = ?1")?;
    let rows = stmt.query_map(params![date], |row| row.get::<_, String>(0))?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

/// Returns false when the slot was already blocked.
pub fn block_slot(conn: &Connection, date: &str, time_slot: &str, reason: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "INSERT OR IGNORE INTO blocked_slots (date, time_slot, reason) VALUES (?1, ?2, ?3)",
        params![date, time_slot, reason],
    )?;
    Ok(count > 0)
}

pub fn unblock_slot(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM blocked_slots WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_blocked_slots(conn: &Connection) -> anyhow::Result<Vec<BlockedSlot>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, time_slot, reason FROM blocked_slots ORDER BY date ASC, time_slot ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(BlockedSlot {
            id: row.get(0)?,
            date: row.get(1)?,
            time_slot: row.get(2)?,
            reason: row.get(3)?,
        })
    })?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn new_booking(date: &str, slot: &str) -> NewBooking {
        NewBooking {
            service_type: ServiceType::Basic,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time_slot: slot.to_string(),
            name: "Ion Popescu".to_string(),
            phone: "0722000111".to_string(),
            email: "ion@example.com".to_string(),
            address: "Bd. Unirii 5".to_string(),
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let conn = setup_db();
        let id = insert_booking(&conn, &new_booking("2025-01-18", "09:00–11:00"))
            .unwrap()
            .unwrap();

        let bookings = get_active_bookings(&conn).unwrap();
        assert_eq!(bookings.len(), 1);
        let booking = &bookings[0];
        assert_eq!(booking.id, id);
        assert_eq!(booking.time_slot, "09:00–11:00");
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booked_slots(&conn, "2025-01-18").unwrap(), vec!["09:00–11:00"]);
    }

    #[test]
    fn test_unique_index_rejects_second_active_booking() {
        let conn = setup_db();
        assert!(insert_booking(&conn, &new_booking("2025-01-18", "12:00–14:00"))
            .unwrap()
            .is_some());
        assert!(insert_booking(&conn, &new_booking("2025-01-18", "12:00–14:00"))
            .unwrap()
            .is_none());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_cancelled_booking_releases_slot() {
        let conn = setup_db();
        let id = insert_booking(&conn, &new_booking("2025-01-18", "12:00–14:00"))
            .unwrap()
            .unwrap();

        assert!(cancel_booking(&conn, id).unwrap());
        assert!(!cancel_booking(&conn, id).unwrap());
        assert!(booked_slots(&conn, "2025-01-18").unwrap().is_empty());
        assert!(insert_booking(&conn, &new_booking("2025-01-18", "12:00–14:00"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_upcoming_is_ordered_and_skips_past() {
        let conn = setup_db();
        insert_booking(&conn, &new_booking("2025-01-11", "09:00–11:00")).unwrap();
        insert_booking(&conn, &new_booking("2025-01-19", "15:00–17:00")).unwrap();
        insert_booking(&conn, &new_booking("2025-01-18", "12:00–14:00")).unwrap();
        insert_booking(&conn, &new_booking("2025-01-18", "09:00–11:00")).unwrap();

        let from = NaiveDate::from_ymd_opt(2025, 1, 12).unwrap();
        let upcoming: Vec<(String, String)> = get_upcoming_bookings(&conn, from)
            .unwrap()
            .into_iter()
            .map(|b| (b.date.to_string(), b.time_slot))
            .collect();

        assert_eq!(
            upcoming,
            vec![
                ("2025-01-18".to_string(), "09:00–11:00".to_string()),
                ("2025-01-18".to_string(), "12:00–14:00".to_string()),
                ("2025-01-19".to_string(), "15:00–17:00".to_string()),
            ]
        );
    }

    #[test]
    fn test_block_day_is_idempotent() {
        let conn = setup_db();
        assert!(block_day(&conn, "2025-01-19", "holiday").unwrap());
        assert!(!block_day(&conn, "2025-01-19", "again").unwrap());
        assert!(is_day_blocked(&conn, "2025-01-19").unwrap());

        let days = list_blocked_days(&conn).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].reason, "holiday");

        assert!(unblock_day(&conn, days[0].id).unwrap());
        assert!(!is_day_blocked(&conn, "2025-01-19").unwrap());
    }

    #[test]
    fn test_block_slot_ignores_duplicates() {
        let conn = setup_db();
        assert!(block_slot(&conn, "2025-01-18", "09:00–11:00", "").unwrap());
        assert!(!block_slot(&conn, "2025-01-18", "09:00–11:00", "dup").unwrap());
        assert!(block_slot(&conn, "2025-01-18", "15:00–17:00", "").unwrap());

        assert_eq!(
            blocked_slots_for_date(&conn, "2025-01-18").unwrap().len(),
            2
        );
        let slots = list_blocked_slots(&conn).unwrap();
        assert_eq!(slots[0].time_slot, "09:00–11:00");
        assert!(unblock_slot(&conn, slots[0].id).unwrap());
        assert!(!unblock_slot(&conn, slots[0].id).unwrap());
    }

    #[test]
    fn test_grouped_counts_exclude_cancelled() {
        let conn = setup_db();
        let mut premium = new_booking("2025-01-18", "09:00–11:00");
        premium.service_type = ServiceType::Premium;
        insert_booking(&conn, &premium).unwrap();
        insert_booking(&conn, &new_booking("2025-01-18", "12:00–14:00")).unwrap();
        let cancelled = insert_booking(&conn, &new_booking("2025-01-19", "12:00–14:00"))
            .unwrap()
            .unwrap();
        cancel_booking(&conn, cancelled).unwrap();

        let per_service = count_by_service(&conn).unwrap();
        assert_eq!(
            per_service,
            vec![
                ServiceCount { service_type: "Basic".into(), count: 1 },
                ServiceCount { service_type: "Premium".into(), count: 1 },
            ]
        );
        let per_day = count_by_day(&conn).unwrap();
        assert_eq!(per_day, vec![DayCount { date: "2025-01-18".into(), count: 2 }]);
    }
}
