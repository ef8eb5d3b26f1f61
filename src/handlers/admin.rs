use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::handlers::JsonBody;
use crate::models::{BlockKind, Blocks, Booking, BookingStats};
use crate::services::auth::{clear_session_cookie_header, session_cookie_header, AdminSession};
use crate::state::AppState;

fn ok() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true }))
}

// POST /api/admin/login
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Response, AppError> {
    let Some((_session, token)) = AdminSession::login(&state.config, &body.username, &body.password)
    else {
        tracing::warn!(username = %body.username, "admin login rejected");
        return Err(AppError::Unauthorized);
    };

    tracing::info!("admin logged in");
    Ok(([(header::SET_COOKIE, session_cookie_header(&token))], ok()).into_response())
}

// POST /api/admin/logout
pub async fn logout() -> Response {
    ([(header::SET_COOKIE, clear_session_cookie_header())], ok()).into_response()
}

// GET /api/admin/me
pub async fn me(session: Option<AdminSession>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "isAdmin": session.is_some() }))
}

// GET /api/admin/bookings
#[derive(Serialize)]
pub struct BookingsResponse {
    bookings: Vec<Booking>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
) -> Result<Json<BookingsResponse>, AppError> {
    let today = chrono::Local::now().date_naive();
    let bookings = state.engine.upcoming(&admin, today)?;
    Ok(Json(BookingsResponse { bookings }))
}

// POST /api/admin/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    if state.engine.cancel(&admin, id)? {
        Ok(ok())
    } else {
        Err(AppError::NotFound(format!("booking {id}")))
    }
}

// GET /api/admin/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
) -> Result<Json<BookingStats>, AppError> {
    Ok(Json(state.engine.stats(&admin)?))
}

// GET /api/admin/blocks
pub async fn get_blocks(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
) -> Result<Json<Blocks>, AppError> {
    Ok(Json(state.engine.blocks(&admin)?))
}

// POST /api/admin/block-day
#[derive(Deserialize)]
pub struct BlockDayRequest {
    pub date: Option<String>,
    pub reason: Option<String>,
}

pub async fn block_day(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
    JsonBody(body): JsonBody<BlockDayRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let date = body
        .date
        .ok_or_else(|| AppError::Validation("missing required field: date".to_string()))?;
    state
        .engine
        .block_day(&admin, &date, body.reason.as_deref().unwrap_or(""))?;
    Ok(ok())
}

// POST /api/admin/block-slot
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSlotRequest {
    pub date: Option<String>,
    pub time_slot: Option<String>,
    pub reason: Option<String>,
}

pub async fn block_slot(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
    JsonBody(body): JsonBody<BlockSlotRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (Some(date), Some(time_slot)) = (body.date, body.time_slot) else {
        return Err(AppError::Validation(
            "date and timeSlot are required".to_string(),
        ));
    };
    state.engine.block_slot(
        &admin,
        &date,
        &time_slot,
        body.reason.as_deref().unwrap_or(""),
    )?;
    Ok(ok())
}

// POST /api/admin/unblock
#[derive(Deserialize)]
pub struct UnblockRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
}

pub async fn unblock(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
    JsonBody(body): JsonBody<UnblockRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let kind = BlockKind::parse(&body.kind)
        .ok_or_else(|| AppError::Validation(format!("invalid block type: {}", body.kind)))?;

    if state.engine.unblock(&admin, kind, body.id)? {
        Ok(ok())
    } else {
        Err(AppError::NotFound(format!("{} block {}", body.kind, body.id)))
    }
}

// GET /api/admin/export
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    admin: AdminSession,
) -> Result<Response, AppError> {
    let csv = state.engine.export_csv(&admin)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=bookings.csv",
            ),
        ],
        csv,
    )
        .into_response())
}
