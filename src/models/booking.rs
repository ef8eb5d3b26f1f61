use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub service_type: ServiceType,
    pub date: NaiveDate,
    pub time_slot: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub notes: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn created_at_string(&self) -> String {
        self.created_at
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

/// A booking that passed validation but has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub service_type: ServiceType,
    pub date: NaiveDate,
    pub time_slot: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    pub fn into_booking(self, id: i64) -> Booking {
        Booking {
            id,
            service_type: self.service_type,
            date: self.date,
            time_slot: self.time_slot,
            name: self.name,
            phone: self.phone,
            email: self.email,
            address: self.address,
            notes: self.notes,
            status: BookingStatus::Confirmed,
            created_at: self.created_at,
        }
    }
}

/// Raw booking submission as it arrives from a client. Every field is
/// optional so missing values surface as validation errors, not as
/// deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub service_type: Option<String>,
    pub date: Option<String>,
    pub time_slot: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ServiceType {
    Basic,
    Standard,
    Premium,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [ServiceType::Basic, ServiceType::Standard, ServiceType::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Basic => "Basic",
            ServiceType::Standard => "Standard",
            ServiceType::Premium => "Premium",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn price(&self) -> i64 {
        match self {
            ServiceType::Basic => 150,
            ServiceType::Standard => 250,
            ServiceType::Premium => 350,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Confirmed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_prices() {
        assert_eq!(ServiceType::Basic.price(), 150);
        assert_eq!(ServiceType::Standard.price(), 250);
        assert_eq!(ServiceType::Premium.price(), 350);
    }

    #[test]
    fn test_service_parse_is_exact() {
        assert_eq!(ServiceType::parse("Premium"), Some(ServiceType::Premium));
        assert_eq!(ServiceType::parse("premium"), None);
        assert_eq!(ServiceType::parse("Deluxe"), None);
    }

    #[test]
    fn test_booking_serializes_camel_case() {
        let booking = Booking {
            id: 7,
            service_type: ServiceType::Standard,
            date: NaiveDate::from_ymd_opt(2025, 1, 18).unwrap(),
            time_slot: "12:00–14:00".to_string(),
            name: "Ana".to_string(),
            phone: "0700000000".to_string(),
            email: "ana@example.com".to_string(),
            address: "Str. Lunga 1".to_string(),
            notes: String::new(),
            status: BookingStatus::Confirmed,
            created_at: "2025-01-10T08:00:00Z".parse().unwrap(),
        };

        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["serviceType"], "Standard");
        assert_eq!(json["timeSlot"], "12:00–14:00");
        assert_eq!(json["date"], "2025-01-18");
        assert_eq!(json["status"], "confirmed");
        assert_eq!(booking.created_at_string(), "2025-01-10T08:00:00.000Z");
    }
}
