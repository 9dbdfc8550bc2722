use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{ApprovalAction, ApprovalCategory, Role, User};

/// The authenticated caller of a request, with the profile ids its role
/// acts through.
#[derive(Debug, Clone, Serialize)]
pub struct Actor {
    pub user_id: i64,
    pub name: String,
    pub role: Role,
    pub business_id: Option<i64>,
    pub tourist_id: Option<i64>,
}

impl Actor {
    /// Tourist profile id, or `Forbidden` for any other kind of actor.
    pub fn tourist_id(&self) -> Result<i64, AppError> {
        match (self.role, self.tourist_id) {
            (Role::Tourist, Some(id)) => Ok(id),
            _ => Err(AppError::Forbidden(
                "Only tourist users can book events".to_string(),
            )),
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin => Ok(()),
            _ => Err(AppError::Forbidden("Administrator access required".to_string())),
        }
    }

    /// Businesses manage their own events; administrators manage any.
    pub fn require_event_manager(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin | Role::Business => Ok(()),
            Role::Tourist => Err(AppError::Forbidden(
                "Only business users can manage events".to_string(),
            )),
        }
    }

    pub fn can_manage_business(&self, business_id: i64) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Business => self.business_id == Some(business_id),
            Role::Tourist => false,
        }
    }
}

pub fn load_actor(conn: &Connection, user_id: i64) -> Result<Option<Actor>, AppError> {
    let Some(user) = queries::get_user(conn, user_id)? else {
        return Ok(None);
    };

    let business_id = match user.role {
        Role::Business => queries::get_business_id_for_user(conn, user.id)?,
        _ => None,
    };
    let tourist_id = match user.role {
        Role::Tourist => queries::get_tourist_id_for_user(conn, user.id)?,
        _ => None,
    };

    Ok(Some(Actor {
        user_id: user.id,
        name: user.name,
        role: user.role,
        business_id,
        tourist_id,
    }))
}

// ── Tokens ──

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(user: &User, config: &AppConfig) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role,
        iat: now,
        exp: now + config.token_ttl_hours * 3600,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign token: {e}")))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        AppError::Unauthorized
    })
}

// ── Passwords ──

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// ── Sign-up / sign-in ──

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 5, max = 250, message = "Name must be between 5 and 250 characters."))]
    pub name: String,
    #[validate(email(message = "Invalid email format."))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long."))]
    pub password: String,
    pub role: Role,
    pub business_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email format."))]
    pub email: String,
    pub password: String,
}

/// Name of the business profile to create, or `None` for a tourist.
/// Admins cannot self-register and a business needs a name.
pub fn signup_profile(req: &SignupRequest) -> Result<Option<&str>, AppError> {
    match req.role {
        Role::Admin => Err(AppError::Forbidden(
            "Administrator accounts cannot be self-registered".to_string(),
        )),
        Role::Business => req
            .business_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(Some)
            .ok_or_else(|| AppError::InvalidArgument("Business name is required.".to_string())),
        Role::Tourist => Ok(None),
    }
}

/// Writes the user and its profile. `password_hash` is computed by the
/// caller so no Argon2 work happens while the connection is held.
pub fn signup(conn: &mut Connection, req: &SignupRequest, password_hash: &str) -> Result<User, AppError> {
    let business_name = signup_profile(req)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if queries::get_user_by_email(&tx, &req.email)?.is_some() {
        return Err(AppError::Conflict("Email already registered.".to_string()));
    }

    let user_id = queries::create_user(&tx, &req.name, &req.email, password_hash, req.role)?;
    match business_name {
        Some(name) => {
            let business_id = queries::create_business(&tx, user_id, name)?;
            queries::insert_approval(
                &tx,
                None,
                Some(business_id),
                ApprovalCategory::Business,
                ApprovalAction::Create,
            )?;
        }
        None => {
            queries::create_tourist(&tx, user_id)?;
        }
    }

    let user = queries::get_user(&tx, user_id)?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user {user_id} vanished after insert")))?;
    tx.commit()?;

    tracing::info!(user_id, role = user.role.as_str(), "user signed up");
    Ok(user)
}

/// Looks up the account for a sign-in attempt. Unknown emails are
/// `Unauthorized`, same as a wrong password.
pub fn find_signin_user(conn: &Connection, email: &str) -> Result<User, AppError> {
    queries::get_user_by_email(conn, email)?.ok_or(AppError::Unauthorized)
}

pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing task failed: {e}")))?
}

pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password check task failed: {e}")))
}

/// Creates the administrator account named by `ADMIN_EMAIL` /
/// `ADMIN_PASSWORD` if it does not exist yet.
pub fn seed_admin(conn: &Connection, config: &AppConfig) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };

    if queries::get_user_by_email(conn, email)?.is_some() {
        return Ok(());
    }

    let hash = hash_password(password).map_err(|e| anyhow::anyhow!("{e}"))?;
    let id = queries::create_user(conn, "Administrator", email, &hash, Role::Admin)?;
    tracing::info!(user_id = id, "seeded administrator account");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::ApprovalStatus;

    fn test_config() -> AppConfig {
        AppConfig {
            port: 3000,
            database_url: ":memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            token_ttl_hours: 1,
            busy_timeout_ms: 1000,
            admin_email: Some("admin@example.com".to_string()),
            admin_password: Some("admin-password".to_string()),
        }
    }

    fn signup_req(email: &str, role: Role, business_name: Option<&str>) -> SignupRequest {
        SignupRequest {
            name: "Test Person".to_string(),
            email: email.to_string(),
            password: "correct-horse".to_string(),
            role,
            business_name: business_name.map(str::to_string),
        }
    }

    fn register(conn: &mut Connection, req: &SignupRequest) -> Result<User, AppError> {
        let hash = hash_password(&req.password).unwrap();
        signup(conn, req, &hash)
    }

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret-pass", "not-a-phc-string"));
    }

    #[test]
    fn test_token_round_trip_and_tamper() {
        let config = test_config();
        let mut conn = db::init_db(":memory:").unwrap();
        let user = register(&mut conn, &signup_req("t@example.com", Role::Tourist, None)).unwrap();

        let token = issue_token(&user, &config).unwrap();
        let claims = decode_token(&token, &config.jwt_secret).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, Role::Tourist);

        assert!(matches!(
            decode_token(&token, "other-secret"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_signup_creates_profiles() {
        let mut conn = db::init_db(":memory:").unwrap();
        let tourist = register(&mut conn, &signup_req("t@example.com", Role::Tourist, None)).unwrap();
        let business =
            register(&mut conn, &signup_req("b@example.com", Role::Business, Some("Sea Tours"))).unwrap();

        let tourist_actor = load_actor(&conn, tourist.id).unwrap().unwrap();
        assert!(tourist_actor.tourist_id.is_some());
        assert!(tourist_actor.tourist_id().is_ok());

        let business_actor = load_actor(&conn, business.id).unwrap().unwrap();
        let business_id = business_actor.business_id.unwrap();
        assert!(business_actor.can_manage_business(business_id));
        assert!(!business_actor.can_manage_business(business_id + 1));
        assert!(matches!(business_actor.tourist_id(), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_signup_rejects_duplicates_and_admins() {
        let mut conn = db::init_db(":memory:").unwrap();
        register(&mut conn, &signup_req("dup@example.com", Role::Tourist, None)).unwrap();

        let dup = register(&mut conn, &signup_req("dup@example.com", Role::Tourist, None));
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        let admin = register(&mut conn, &signup_req("a@example.com", Role::Admin, None));
        assert!(matches!(admin, Err(AppError::Forbidden(_))));

        let nameless = register(&mut conn, &signup_req("b@example.com", Role::Business, Some("  ")));
        assert!(matches!(nameless, Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn test_find_signin_user() {
        let mut conn = db::init_db(":memory:").unwrap();
        let user = register(&mut conn, &signup_req("t@example.com", Role::Tourist, None)).unwrap();

        let found = find_signin_user(&conn, "t@example.com").unwrap();
        assert_eq!(found.id, user.id);
        assert!(verify_password("correct-horse", &found.password_hash));

        assert!(matches!(
            find_signin_user(&conn, "nobody@example.com"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_business_signup_records_pending_approval() {
        let mut conn = db::init_db(":memory:").unwrap();
        let user =
            register(&mut conn, &signup_req("b@example.com", Role::Business, Some("Sea Tours"))).unwrap();
        register(&mut conn, &signup_req("t@example.com", Role::Tourist, None)).unwrap();

        let business_id = queries::get_business_id_for_user(&conn, user.id).unwrap().unwrap();
        let pending = queries::get_approvals_by_status(&conn, &[ApprovalStatus::Pending]).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].category, ApprovalCategory::Business);
        assert_eq!(pending[0].action, ApprovalAction::Create);
        assert_eq!(pending[0].business_id, Some(business_id));
        assert_eq!(pending[0].event_id, None);
    }

    #[test]
    fn test_rejected_signup_needs_no_hash() {
        let admin = signup_req("a@example.com", Role::Admin, None);
        assert!(matches!(signup_profile(&admin), Err(AppError::Forbidden(_))));

        let business = signup_req("b@example.com", Role::Business, Some(" Sea Tours "));
        assert_eq!(signup_profile(&business).unwrap(), Some("Sea Tours"));
    }

    #[tokio::test]
    async fn test_blocking_password_helpers() {
        let hash = hash_password_blocking("s3cret-pass".to_string()).await.unwrap();
        assert!(verify_password_blocking("s3cret-pass".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_blocking("wrong".to_string(), hash).await.unwrap());
    }

    #[test]
    fn test_seed_admin_once() {
        let config = test_config();
        let conn = db::init_db(":memory:").unwrap();
        seed_admin(&conn, &config).unwrap();
        seed_admin(&conn, &config).unwrap();

        let admin = queries::get_user_by_email(&conn, "admin@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        let actor = load_actor(&conn, admin.id).unwrap().unwrap();
        assert!(actor.require_admin().is_ok());
        assert!(actor.can_manage_business(42));
    }
}
