pub mod availability;
pub mod block;
pub mod booking;
pub mod stats;

pub use availability::{SlotSchedule, TimeSlot};
pub use block::{BlockKind, BlockedDay, BlockedSlot, Blocks};
pub use booking::{Booking, BookingRequest, BookingStatus, NewBooking, ServiceType};
pub use stats::{BookingStats, DayCount, ServiceCount};
