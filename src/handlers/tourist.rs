use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::errors::AppError;
use crate::models::Booking;
use crate::services::auth::Actor;
use crate::services::booking::{self, BookEventRequest};
use crate::state::AppState;

// POST /api/tourist/bookings
pub async fn book_event(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(body): Json<BookEventRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    body.validate()?;

    let created = {
        let mut db = state.db()?;
        booking::book_event(&mut db, &actor, &body)?
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({"status": true, "message": "Booking Success", "body": created})),
    ))
}

// GET /api/tourist/bookings
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = {
        let db = state.db()?;
        booking::list_bookings(&db, &actor)?
    };
    Ok(Json(bookings))
}
