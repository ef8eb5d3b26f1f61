use std::sync::Arc;

use axum::extract::State;

use crate::db;
use crate::errors::AppError;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Result<&'static str, AppError> {
    let conn = db::lock(&state.db)?;
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok("ok")
}
