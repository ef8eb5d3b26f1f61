use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, TransactionBehavior};

use crate::db::{self, queries, Db};
use crate::errors::AppError;
use crate::models::availability::{is_weekend, parse_date};
use crate::models::{
    BlockKind, Blocks, Booking, BookingRequest, BookingStats, NewBooking, ServiceType, SlotSchedule,
};
use crate::services::auth::AdminSession;
use crate::services::export::bookings_csv;
use crate::services::notifications::NotificationQueue;

/// Availability and booking consistency engine. Holds no state of its own;
/// every answer is read from the store at call time.
#[derive(Clone)]
pub struct BookingEngine {
    db: Db,
    schedule: SlotSchedule,
    notifications: NotificationQueue,
}

impl BookingEngine {
    pub fn new(db: Db, schedule: SlotSchedule, notifications: NotificationQueue) -> Self {
        Self {
            db,
            schedule,
            notifications,
        }
    }

    /// Bookable slots for `date`, in schedule order. Malformed dates,
    /// weekdays and blocked days all yield an empty list.
    pub fn available_slots(&self, date: &str) -> Result<Vec<String>, AppError> {
        let conn = db::lock(&self.db)?;
        Ok(compute_available_slots(&conn, &self.schedule, date)?)
    }

    /// Validates and commits a booking. The availability check and the insert
    /// run in one immediate transaction; the unique index on active
    /// (date, time_slot) catches anything that slips past the check.
    pub fn submit(&self, request: BookingRequest) -> Result<Booking, AppError> {
        let new_booking = validate_request(request)?;
        let date = new_booking.date.format("%Y-%m-%d").to_string();

        let booking = {
            let mut conn = db::lock(&self.db)?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let available = compute_available_slots(&tx, &self.schedule, &date)?;
            if !available.contains(&new_booking.time_slot) {
                tracing::info!(date = %date, slot = %new_booking.time_slot, "slot not available");
                return Err(AppError::Conflict);
            }

            let Some(id) = queries::insert_booking(&tx, &new_booking)? else {
                tracing::warn!(date = %date, slot = %new_booking.time_slot, "lost race for slot");
                return Err(AppError::Conflict);
            };
            tx.commit()?;

            new_booking.into_booking(id)
        };

        tracing::info!(
            booking_id = booking.id,
            date = %date,
            slot = %booking.time_slot,
            service = booking.service_type.as_str(),
            "booking committed"
        );
        self.notifications.enqueue(&booking);

        Ok(booking)
    }

    /// Frees the slot held by a booking. Returns false for unknown or
    /// already-cancelled bookings.
    pub fn cancel(&self, _admin: &AdminSession, id: i64) -> Result<bool, AppError> {
        let conn = db::lock(&self.db)?;
        let cancelled = queries::cancel_booking(&conn, id)?;
        if cancelled {
            tracing::info!(booking_id = id, "booking cancelled");
        }
        Ok(cancelled)
    }

    pub fn block_day(&self, _admin: &AdminSession, date: &str, reason: &str) -> Result<(), AppError> {
        let date = require_date(date)?;
        let conn = db::lock(&self.db)?;
        if queries::block_day(&conn, &date, reason.trim())? {
            tracing::info!(date = %date, "day blocked");
        }
        Ok(())
    }

    pub fn block_slot(
        &self,
        _admin: &AdminSession,
        date: &str,
        time_slot: &str,
        reason: &str,
    ) -> Result<(), AppError> {
        let date = require_date(date)?;
        if self.schedule.find(time_slot).is_none() {
            return Err(AppError::Validation(format!("unknown time slot: {time_slot}")));
        }
        let conn = db::lock(&self.db)?;
        if queries::block_slot(&conn, &date, time_slot, reason.trim())? {
            tracing::info!(date = %date, slot = %time_slot, "slot blocked");
        }
        Ok(())
    }

    pub fn unblock(&self, _admin: &AdminSession, kind: BlockKind, id: i64) -> Result<bool, AppError> {
        let conn = db::lock(&self.db)?;
        let removed = match kind {
            BlockKind::Day => queries::unblock_day(&conn, id)?,
            BlockKind::Slot => queries::unblock_slot(&conn, id)?,
        };
        if removed {
            tracing::info!(id, kind = ?kind, "block removed");
        }
        Ok(removed)
    }

    pub fn upcoming(&self, _admin: &AdminSession, today: NaiveDate) -> Result<Vec<Booking>, AppError> {
        let conn = db::lock(&self.db)?;
        Ok(queries::get_upcoming_bookings(&conn, today)?)
    }

    pub fn stats(&self, _admin: &AdminSession) -> Result<BookingStats, AppError> {
        let conn = db::lock(&self.db)?;
        let per_service = queries::count_by_service(&conn)?;
        let per_day = queries::count_by_day(&conn)?;
        Ok(BookingStats::new(per_service, per_day))
    }

    pub fn blocks(&self, _admin: &AdminSession) -> Result<Blocks, AppError> {
        let conn = db::lock(&self.db)?;
        Ok(Blocks {
            blocked_days: queries::list_blocked_days(&conn)?,
            blocked_slots: queries::list_blocked_slots(&conn)?,
        })
    }

    pub fn export_csv(&self, _admin: &AdminSession) -> Result<String, AppError> {
        let bookings = {
            let conn = db::lock(&self.db)?;
            queries::get_active_bookings(&conn)?
        };
        Ok(bookings_csv(&bookings))
    }
}

pub fn compute_available_slots(
    conn: &Connection,
    schedule: &SlotSchedule,
    date: &str,
) -> anyhow::Result<Vec<String>> {
    let Some(day) = parse_date(date) else {
        return Ok(vec![]);
    };
    if !is_weekend(day) {
        return Ok(vec![]);
    }
    if queries::is_day_blocked(conn, date)? {
        return Ok(vec![]);
    }

    let booked = queries::booked_slots(conn, date)?;
    let blocked = queries::blocked_slots_for_date(conn, date)?;

    Ok(schedule
        .labels()
        .into_iter()
        .filter(|slot| !booked.contains(slot) && !blocked.contains(slot))
        .collect())
}

fn validate_request(request: BookingRequest) -> Result<NewBooking, AppError> {
    let service_type = required(request.service_type, "serviceType")?;
    let date = required(request.date, "date")?;
    let time_slot = required(request.time_slot, "timeSlot")?;
    let name = required(request.name, "name")?;
    let phone = required(request.phone, "phone")?;
    let email = required(request.email, "email")?;
    let address = required(request.address, "address")?;

    let service_type = ServiceType::parse(&service_type)
        .ok_or_else(|| AppError::Validation(format!("unknown service type: {service_type}")))?;
    let date = parse_date(&date)
        .ok_or_else(|| AppError::Validation(format!("invalid date: {date}")))?;
    if !is_valid_email(&email) {
        return Err(AppError::Validation(format!("invalid email address: {email}")));
    }

    Ok(NewBooking {
        service_type,
        date,
        time_slot,
        name,
        phone,
        email,
        address,
        notes: request.notes.unwrap_or_default(),
        created_at: Utc::now(),
    })
}

/// Blank means empty after trimming; accepted values are kept as sent.
fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("missing required field: {field}")))
}

fn require_date(date: &str) -> Result<String, AppError> {
    let date = date.trim();
    parse_date(date)
        .map(|_| date.to_string())
        .ok_or_else(|| AppError::Validation(format!("invalid date: {date}")))
}

/// `local@domain.tld` shape check: no whitespace, non-empty local part and a
/// dot inside the domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier, Mutex};

    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;

    const SATURDAY: &str = "2025-01-18";
    const SUNDAY: &str = "2025-01-19";

    fn setup() -> (BookingEngine, UnboundedReceiver<Booking>) {
        let conn = db::init_db(":memory:").unwrap();
        let (queue, rx) = NotificationQueue::channel();
        let engine = BookingEngine::new(Arc::new(Mutex::new(conn)), SlotSchedule::default(), queue);
        (engine, rx)
    }

    fn request(date: &str, slot: &str) -> BookingRequest {
        BookingRequest {
            service_type: Some("Standard".to_string()),
            date: Some(date.to_string()),
            time_slot: Some(slot.to_string()),
            name: Some("Ion Popescu".to_string()),
            phone: Some("0722000111".to_string()),
            email: Some("ion@example.com".to_string()),
            address: Some("Bd. Unirii 5".to_string()),
            notes: None,
        }
    }

    fn admin() -> AdminSession {
        AdminSession::for_tests()
    }

    #[test]
    fn test_weekend_without_state_has_all_slots() {
        let (engine, _rx) = setup();
        assert_eq!(
            engine.available_slots(SATURDAY).unwrap(),
            vec!["09:00–11:00", "12:00–14:00", "15:00–17:00"]
        );
        assert_eq!(engine.available_slots(SUNDAY).unwrap().len(), 3);
    }

    #[test]
    fn test_weekdays_are_never_available() {
        let (engine, _rx) = setup();
        // 2025-01-13 .. 2025-01-17 is Monday to Friday
        for day in 13..=17 {
            let date = format!("2025-01-{day}");
            assert!(engine.available_slots(&date).unwrap().is_empty(), "{date}");
        }
    }

    #[test]
    fn test_malformed_dates_fail_soft() {
        let (engine, _rx) = setup();
        for date in ["", "tomorrow", "2025-1-18", "2025-02-30", "2025-01-18 "] {
            assert!(engine.available_slots(date).unwrap().is_empty(), "{date:?}");
        }
    }

    #[test]
    fn test_booking_removes_slot_and_repeat_conflicts() {
        let (engine, _rx) = setup();

        let booking = engine.submit(request(SATURDAY, "12:00–14:00")).unwrap();
        assert!(booking.id > 0);

        assert_eq!(
            engine.available_slots(SATURDAY).unwrap(),
            vec!["09:00–11:00", "15:00–17:00"]
        );
        assert!(matches!(
            engine.submit(request(SATURDAY, "12:00–14:00")),
            Err(AppError::Conflict)
        ));
    }

    #[test]
    fn test_availability_is_idempotent() {
        let (engine, _rx) = setup();
        engine.submit(request(SATURDAY, "09:00–11:00")).unwrap();
        let first = engine.available_slots(SATURDAY).unwrap();
        let second = engine.available_slots(SATURDAY).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_blocked_day_hides_everything() {
        let (engine, _rx) = setup();
        engine.block_day(&admin(), SUNDAY, "holiday").unwrap();
        engine.block_slot(&admin(), SUNDAY, "09:00–11:00", "").unwrap();

        assert!(engine.available_slots(SUNDAY).unwrap().is_empty());
        assert!(matches!(
            engine.submit(request(SUNDAY, "12:00–14:00")),
            Err(AppError::Conflict)
        ));
    }

    #[test]
    fn test_block_day_twice_is_a_noop() {
        let (engine, _rx) = setup();
        engine.block_day(&admin(), SUNDAY, "holiday").unwrap();
        engine.block_day(&admin(), SUNDAY, "other").unwrap();

        let blocks = engine.blocks(&admin()).unwrap();
        assert_eq!(blocks.blocked_days.len(), 1);
        assert_eq!(blocks.blocked_days[0].reason, "holiday");
    }

    #[test]
    fn test_blocked_slot_and_unblock() {
        let (engine, _rx) = setup();
        engine.block_slot(&admin(), SATURDAY, "15:00–17:00", "staff").unwrap();
        assert_eq!(
            engine.available_slots(SATURDAY).unwrap(),
            vec!["09:00–11:00", "12:00–14:00"]
        );

        let id = engine.blocks(&admin()).unwrap().blocked_slots[0].id;
        assert!(engine.unblock(&admin(), BlockKind::Slot, id).unwrap());
        assert!(!engine.unblock(&admin(), BlockKind::Slot, id).unwrap());
        assert_eq!(engine.available_slots(SATURDAY).unwrap().len(), 3);
    }

    #[test]
    fn test_block_validation() {
        let (engine, _rx) = setup();
        assert!(matches!(
            engine.block_day(&admin(), "19/01/2025", ""),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            engine.block_slot(&admin(), SATURDAY, "10:00–12:00", ""),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_phone_is_rejected_without_side_effects() {
        let (engine, mut rx) = setup();
        let mut req = request(SATURDAY, "09:00–11:00");
        req.phone = Some(String::new());

        assert!(matches!(engine.submit(req), Err(AppError::Validation(_))));
        assert_eq!(engine.available_slots(SATURDAY).unwrap().len(), 3);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_submitted_values_are_stored_as_sent() {
        let (engine, _rx) = setup();
        let mut req = request(SATURDAY, "09:00–11:00");
        req.name = Some("  Ion Popescu ".to_string());
        req.notes = Some(" gate code 42\n".to_string());

        let booking = engine.submit(req).unwrap();
        assert_eq!(booking.name, "  Ion Popescu ");
        assert_eq!(booking.notes, " gate code 42\n");

        let csv = engine.export_csv(&admin()).unwrap();
        assert!(csv.contains("\"  Ion Popescu \""));
        assert!(csv.contains("\" gate code 42\n\""));
    }

    #[test]
    fn test_field_validation() {
        let (engine, _rx) = setup();

        let mut req = request(SATURDAY, "09:00–11:00");
        req.service_type = Some("Deluxe".to_string());
        assert!(matches!(engine.submit(req), Err(AppError::Validation(_))));

        let mut req = request(SATURDAY, "09:00–11:00");
        req.email = Some("ion.example.com".to_string());
        assert!(matches!(engine.submit(req), Err(AppError::Validation(_))));

        let mut req = request(SATURDAY, "09:00–11:00");
        req.name = Some("   ".to_string());
        assert!(matches!(engine.submit(req), Err(AppError::Validation(_))));

        let mut req = request(SATURDAY, "09:00–11:00");
        req.address = None;
        assert!(matches!(engine.submit(req), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_unknown_slot_or_weekday_is_a_conflict() {
        let (engine, _rx) = setup();
        assert!(matches!(
            engine.submit(request(SATURDAY, "10:00–12:00")),
            Err(AppError::Conflict)
        ));
        // 2025-01-15 is a Wednesday
        assert!(matches!(
            engine.submit(request("2025-01-15", "09:00–11:00")),
            Err(AppError::Conflict)
        ));
    }

    #[test]
    fn test_successful_booking_is_queued_for_notification() {
        let (engine, mut rx) = setup();
        let booking = engine.submit(request(SATURDAY, "09:00–11:00")).unwrap();
        let queued = rx.try_recv().unwrap();
        assert_eq!(queued, booking);
    }

    #[test]
    fn test_cancel_frees_the_slot() {
        let (engine, _rx) = setup();
        let booking = engine.submit(request(SATURDAY, "09:00–11:00")).unwrap();

        assert!(engine.cancel(&admin(), booking.id).unwrap());
        assert!(!engine.cancel(&admin(), booking.id).unwrap());
        assert_eq!(engine.available_slots(SATURDAY).unwrap().len(), 3);
        engine.submit(request(SATURDAY, "09:00–11:00")).unwrap();
    }

    #[test]
    fn test_stats_and_upcoming() {
        let (engine, _rx) = setup();
        engine.submit(request(SATURDAY, "09:00–11:00")).unwrap();
        let mut premium = request(SUNDAY, "15:00–17:00");
        premium.service_type = Some("Premium".to_string());
        engine.submit(premium).unwrap();

        let stats = engine.stats(&admin()).unwrap();
        assert_eq!(stats.revenue, 250 + 350);
        assert_eq!(stats.per_day.len(), 2);

        let today = NaiveDate::from_ymd_opt(2025, 1, 19).unwrap();
        let upcoming = engine.upcoming(&admin(), today).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].time_slot, "15:00–17:00");
    }

    #[test]
    fn test_injected_schedule() {
        let conn = db::init_db(":memory:").unwrap();
        let (queue, _rx) = NotificationQueue::channel();
        let schedule = SlotSchedule::from_list("10:00-12:00,13:00-15:00").unwrap();
        let engine = BookingEngine::new(Arc::new(Mutex::new(conn)), schedule, queue);

        assert_eq!(
            engine.available_slots(SATURDAY).unwrap(),
            vec!["10:00–12:00", "13:00–15:00"]
        );
        engine.submit(request(SATURDAY, "13:00–15:00")).unwrap();
        assert_eq!(engine.available_slots(SATURDAY).unwrap(), vec!["10:00–12:00"]);
    }

    #[test]
    fn test_concurrent_submissions_on_separate_connections() {
        let path = std::env::temp_dir().join(format!("cleanride-race-{}.db", uuid::Uuid::new_v4()));
        let path_str = path.to_string_lossy().to_string();
        db::init_db(&path_str).unwrap();

        let contenders = 4;
        let barrier = Arc::new(Barrier::new(contenders));
        let handles: Vec<_> = (0..contenders)
            .map(|_| {
                let path = path_str.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let conn = db::init_db(&path).unwrap();
                    let (queue, _rx) = NotificationQueue::channel();
                    let engine =
                        BookingEngine::new(Arc::new(Mutex::new(conn)), SlotSchedule::default(), queue);
                    barrier.wait();
                    engine.submit(request(SATURDAY, "12:00–14:00"))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::Conflict)))
            .count();

        assert_eq!(wins, 1);
        assert_eq!(conflicts, contenders - 1);

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{path_str}{suffix}"));
        }
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@mail.example.ro"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@.co"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email("plainaddress"));
    }
}
