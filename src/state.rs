use crate::config::AppConfig;
use crate::db::Db;
use crate::services::booking::BookingEngine;

pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
    pub engine: BookingEngine,
}
