use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::middleware::AdminUser;
use crate::models::Event;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/events", get(list_events))
}

// GET /api/events — admin navigation over collaborator-owned events
async fn list_events(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let events = sqlx::query_as::<_, Event>(
        "SELECT id, title, description, datetime_start
         FROM events
         ORDER BY datetime_start",
    )
    .fetch_all(&state.db.pool)
    .await?;

    Ok((StatusCode::OK, Json(events)))
}
