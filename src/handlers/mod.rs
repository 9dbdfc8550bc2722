pub mod admin;
pub mod auth;
pub mod business;
pub mod events;
pub mod health;
pub mod tourist;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/signin", post(auth::signin))
        .route("/api/events", get(events::search_events))
        .route("/api/events/:id", get(events::get_event))
        .route("/api/business/events", post(business::create_event))
        .route("/api/business/events/:id", put(business::update_event))
        .route(
            "/api/business/events/:id/disable",
            post(business::disable_event),
        )
        .route(
            "/api/business/events/:id/enable",
            post(business::enable_event),
        )
        .route(
            "/api/tourist/bookings",
            post(tourist::book_event).get(tourist::my_bookings),
        )
        .route(
            "/api/admin/approvals/pending",
            get(admin::pending_approvals),
        )
        .route(
            "/api/admin/approvals/history",
            get(admin::approval_history),
        )
        .route("/api/admin/approvals/:id", put(admin::update_approval))
        .route("/api/admin/stats", get(admin::get_stats))
        .with_state(state)
}
