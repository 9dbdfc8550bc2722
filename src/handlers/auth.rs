use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::Json;
use validator::Validate;

use crate::errors::AppError;
use crate::services::auth::{self, Actor, SigninRequest, SignupRequest};
use crate::state::AppState;

/// Resolves `Authorization: Bearer <jwt>` into the calling [`Actor`].
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let claims = auth::decode_token(token, &state.config.jwt_secret)?;
        let user_id: i64 = claims.sub.parse().map_err(|_| AppError::Unauthorized)?;

        let actor = {
            let db = state.db()?;
            auth::load_actor(&db, user_id)?
        };
        actor.ok_or(AppError::Unauthorized)
    }
}

// POST /api/auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    body.validate()?;
    auth::signup_profile(&body)?;

    let password_hash = auth::hash_password_blocking(body.password.clone()).await?;

    let user = {
        let mut db = state.db()?;
        auth::signup(&mut db, &body, &password_hash)?
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({"status": true, "message": "User registered", "body": user})),
    ))
}

// POST /api/auth/signin
pub async fn signin(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SigninRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    body.validate()?;

    let user = {
        let db = state.db()?;
        auth::find_signin_user(&db, &body.email)?
    };

    if !auth::verify_password_blocking(body.password.clone(), user.password_hash.clone()).await? {
        return Err(AppError::Unauthorized);
    }
    let token = auth::issue_token(&user, &state.config)?;

    tracing::info!(user_id = user.id, "user signed in");
    Ok(Json(serde_json::json!({"status": true, "token": token, "user": user})))
}
