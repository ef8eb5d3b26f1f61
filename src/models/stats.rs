use serde::Serialize;

use super::ServiceType;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCount {
    pub service_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStats {
    pub per_service: Vec<ServiceCount>,
    pub per_day: Vec<DayCount>,
    pub revenue: i64,
}

impl BookingStats {
    pub fn new(per_service: Vec<ServiceCount>, per_day: Vec<DayCount>) -> Self {
        let revenue = per_service
            .iter()
            .filter_map(|c| ServiceType::parse(&c.service_type).map(|t| t.price() * c.count))
            .sum();
        Self {
            per_service,
            per_day,
            revenue,
        }
    }
}
