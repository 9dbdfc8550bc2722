use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use validator::Validate;

use crate::errors::AppError;
use crate::models::EventStatus;
use crate::services::auth::Actor;
use crate::services::events::{self, CreateEventRequest, UpdateEventRequest};
use crate::state::AppState;

// POST /api/business/events
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(body): Json<CreateEventRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    body.validate()?;

    let detail = {
        let mut db = state.db()?;
        events::create_event(&mut db, &actor, &body)?
    };

    Ok(Json(serde_json::json!({"status": true, "message": "Event created", "body": detail})))
}

// PUT /api/business/events/:id
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(body): Json<UpdateEventRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    body.validate()?;

    let detail = {
        let mut db = state.db()?;
        events::update_event(&mut db, &actor, id, &body)?
    };

    Ok(Json(serde_json::json!({"status": true, "message": "Event updated.", "body": detail})))
}

// POST /api/business/events/:id/disable
pub async fn disable_event(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    set_status(&state, &actor, id, EventStatus::Disabled)
}

// POST /api/business/events/:id/enable
pub async fn enable_event(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    set_status(&state, &actor, id, EventStatus::Enabled)
}

fn set_status(
    state: &AppState,
    actor: &Actor,
    id: i64,
    status: EventStatus,
) -> Result<Json<serde_json::Value>, AppError> {
    let event = {
        let mut db = state.db()?;
        events::set_event_status(&mut db, actor, id, status)?
    };
    Ok(Json(serde_json::json!({"status": true, "body": event})))
}
