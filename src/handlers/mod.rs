pub mod admin;
pub mod booking;
pub mod health;

use std::sync::Arc;

use axum::extract::FromRequest;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::state::AppState;

/// `axum::Json` whose rejections answer as `400 {message}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/slots", get(booking::get_slots))
        .route("/api/book", post(booking::book))
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/logout", post(admin::logout))
        .route("/api/admin/me", get(admin::me))
        .route("/api/admin/bookings", get(admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/cancel",
            post(admin::cancel_booking),
        )
        .route("/api/admin/stats", get(admin::get_stats))
        .route("/api/admin/blocks", get(admin::get_blocks))
        .route("/api/admin/block-day", post(admin::block_day))
        .route("/api/admin/block-slot", post(admin::block_slot))
        .route("/api/admin/unblock", post(admin::unblock))
        .route("/api/admin/export", get(admin::export_csv))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
