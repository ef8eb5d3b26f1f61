use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::handlers::JsonBody;
use crate::models::BookingRequest;
use crate::state::AppState;

// GET /api/slots?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: Option<String>,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    date: Option<String>,
    slots: Vec<String>,
}

pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let slots = match query.date.as_deref() {
        Some(date) => state.engine.available_slots(date)?,
        None => vec![],
    };

    Ok(Json(SlotsResponse {
        date: query.date,
        slots,
    }))
}

// POST /api/book
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    success: bool,
    booking_id: i64,
}

pub async fn book(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<BookingRequest>,
) -> Result<Json<BookResponse>, AppError> {
    let booking = state.engine.submit(body)?;

    Ok(Json(BookResponse {
        success: true,
        booking_id: booking.id,
    }))
}
