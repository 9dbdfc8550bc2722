use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::errors::AppError;
use crate::services::events::{self, EventDetail, EventPage, SearchQuery};
use crate::state::AppState;

// GET /api/events
pub async fn search_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<EventPage>, AppError> {
    let page = {
        let db = state.db()?;
        events::search_events(&db, &query)?
    };
    Ok(Json(page))
}

// GET /api/events/:id
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<EventDetail>, AppError> {
    let detail = {
        let db = state.db()?;
        events::get_event_detail(&db, id)?
    };
    Ok(Json(detail))
}
