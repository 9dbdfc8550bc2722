use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Approval, ApprovalStatus, Business, Event};
use crate::services::auth::Actor;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ApprovalResponse {
    #[serde(flatten)]
    approval: Approval,
    event: Option<Event>,
    business: Option<Business>,
}

fn with_relations(conn: &Connection, approval: Approval) -> Result<ApprovalResponse, AppError> {
    let event = match approval.event_id {
        Some(id) => queries::get_event(conn, id)?,
        None => None,
    };
    let business = match approval.business_id {
        Some(id) => queries::get_business(conn, id)?,
        None => None,
    };
    Ok(ApprovalResponse {
        approval,
        event,
        business,
    })
}

fn list_approvals(
    state: &AppState,
    actor: &Actor,
    statuses: &[ApprovalStatus],
) -> Result<Json<Vec<ApprovalResponse>>, AppError> {
    actor.require_admin()?;

    let db = state.db()?;
    let approvals = queries::get_approvals_by_status(&db, statuses)?
        .into_iter()
        .map(|a| with_relations(&db, a))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(approvals))
}

// GET /api/admin/approvals/pending
pub async fn pending_approvals(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<ApprovalResponse>>, AppError> {
    list_approvals(&state, &actor, &[ApprovalStatus::Pending])
}

// GET /api/admin/approvals/history
pub async fn approval_history(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<ApprovalResponse>>, AppError> {
    list_approvals(
        &state,
        &actor,
        &[ApprovalStatus::Approved, ApprovalStatus::Rejected],
    )
}

// PUT /api/admin/approvals/:id
#[derive(Deserialize)]
pub struct UpdateApprovalRequest {
    pub status: String,
}

pub async fn update_approval(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(body): Json<UpdateApprovalRequest>,
) -> Result<Json<ApprovalResponse>, AppError> {
    actor.require_admin()?;

    let status = ApprovalStatus::parse(&body.status)
        .ok_or_else(|| AppError::InvalidArgument("Invalid status value".to_string()))?;

    let db = state.db()?;
    let now = Utc::now().naive_utc();
    if !queries::update_approval_status(&db, id, status, &actor.name, &now)? {
        return Err(AppError::NotFound("Approval not found".to_string()));
    }

    let approval = queries::get_approval(&db, id)?
        .ok_or_else(|| AppError::NotFound("Approval not found".to_string()))?;

    tracing::info!(approval_id = id, status = status.as_str(), admin = actor.user_id, "approval updated");
    Ok(Json(with_relations(&db, approval)?))
}

// GET /api/admin/stats
#[derive(Serialize)]
pub struct StatsResponse {
    tourist_count: i64,
    business_count: i64,
    event_count: i64,
    booking_count: i64,
    tickets_sold: i64,
    revenue: i64,
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<StatsResponse>, AppError> {
    actor.require_admin()?;

    let stats = {
        let db = state.db()?;
        queries::get_dashboard_stats(&db)?
    };

    Ok(Json(StatsResponse {
        tourist_count: stats.tourist_count,
        business_count: stats.business_count,
        event_count: stats.event_count,
        booking_count: stats.booking_count,
        tickets_sold: stats.tickets_sold,
        revenue: stats.revenue,
    }))
}
