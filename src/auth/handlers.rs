use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::auth::{
    claims::Role,
    dto::{AuthResponse, LoginRequest, ProfileResponse, PublicUser, RegisterRequest},
    extractors::AuthUser,
    password::{hash_password, verify_password},
    repo::{Purchase, User},
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
}

fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

/// Checks the registration payload and resolves the requested role,
/// defaulting to a plain user.
fn validate_registration(payload: &RegisterRequest) -> Result<Role, ApiError> {
    if payload.username.chars().count() < 3 {
        return Err(ApiError::Validation(
            "Username must be at least 3 characters long".into(),
        ));
    }
    if !is_valid_username(&payload.username) {
        return Err(ApiError::Validation(
            "Username may only contain letters, numbers, '.', '_' and '-'".into(),
        ));
    }
    if payload.password.chars().count() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters long".into(),
        ));
    }
    match payload.role.as_deref() {
        None => Ok(Role::User),
        Some(raw) => raw.parse().map_err(|_| {
            ApiError::Validation("Invalid role. Must be 'admin' or 'user'".into())
        }),
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let role = validate_registration(&payload).inspect_err(|e| {
        warn!(username = %payload.username, error = %e, "registration rejected");
    })?;

    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username already registered");
        return Err(ApiError::Conflict("Username already exists".into()));
    }

    let hash = hash_password(&payload.password)?;
    // The unique constraint still backstops a concurrent duplicate; the
    // sqlx conversion turns that into the same conflict error.
    let user = User::create(&state.db, &payload.username, &hash, role).await?;

    let token = state.jwt.sign(user.id, user.role)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            token,
            user: PublicUser {
                username: user.username,
                role: user.role,
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    // Unknown username and wrong password must be indistinguishable.
    let user = match User::find_by_username(&state.db, &payload.username).await? {
        Some(u) => u,
        None => {
            warn!(username = %payload.username, "login unknown username");
            return Err(ApiError::Auth("Invalid credentials".into()));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Auth("Invalid credentials".into()));
    }

    let token = state.jwt.sign(user.id, user.role)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(AuthResponse {
        message: "Login successful",
        token,
        user: PublicUser {
            username: user.username,
            role: user.role,
        },
    }))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ProfileResponse>> {
    let record = User::find_by_id(&state.db, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let purchases = Purchase::list_by_user(&state.db, user.id).await?;

    Ok(Json(ProfileResponse {
        username: record.username,
        role: record.role,
        purchases,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, password: &str, role: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            password: password.into(),
            role: role.map(Into::into),
        }
    }

    #[test]
    fn registration_rejects_short_username() {
        let err = validate_registration(&request("ab", "secret1", None)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.to_string(), "Username must be at least 3 characters long");
    }

    #[test]
    fn registration_rejects_short_password() {
        let err = validate_registration(&request("jalebi", "12345", None)).unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters long");
    }

    #[test]
    fn registration_rejects_unknown_role() {
        let err = validate_registration(&request("jalebi", "secret1", Some("root"))).unwrap_err();
        assert_eq!(err.to_string(), "Invalid role. Must be 'admin' or 'user'");
    }

    #[test]
    fn registration_rejects_usernames_with_spaces() {
        let err = validate_registration(&request("ja lebi", "secret1", None)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn registration_defaults_to_the_user_role() {
        let role = validate_registration(&request("jalebi", "secret1", None)).unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn registration_accepts_an_explicit_admin_role() {
        let role = validate_registration(&request("shop.owner", "secret1", Some("admin"))).unwrap();
        assert_eq!(role, Role::Admin);
    }
}
