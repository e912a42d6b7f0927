use axum::{
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, LoginRequest, Pagination, RegisterRequest, TokenResponse,
            UpdateUserRequest, UserResponse,
        },
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::User,
    },
    error::ApiError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
        .route("/auth/me", put(update_me))
        .route("/auth/me", delete(delete_me))
        .route("/auth/change-password", post(change_password))
        .route("/auth/users", get(list_users))
        .route("/auth/users/:id", get(get_user))
        .route("/auth/users/:id", delete(delete_user))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.len() < 3 || username.len() > 50 {
        return Err(ApiError::Validation(
            "username must be between 3 and 50 characters".into(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 6 || password.len() > 100 {
        return Err(ApiError::Validation(
            "password must be between 6 and 100 characters".into(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    if !is_valid_email(email) {
        return Err(ApiError::Validation("invalid email".into()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    validate_username(&payload.username)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    // Friendlier messages than the bare constraint violation; the unique
    // indexes remain the actual guarantor under concurrent registration.
    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username already registered");
        return Err(ApiError::Duplicate("username is already registered".into()));
    }
    if User::email_exists(&state.db, &payload.email).await? {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Duplicate("email is already registered".into()));
    }

    let hash = hash_password(&payload.password).map_err(|_| ApiError::Internal)?;
    let user = User::create(&state.db, &payload.username, &payload.email, &hash).await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = match User::find_by_username(&state.db, &payload.username).await? {
        Some(u) => u,
        None => {
            warn!(username = %payload.username, "login unknown username");
            return Err(ApiError::Unauthorized);
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::Unauthorized);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(&user.username).map_err(|_| ApiError::Internal)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
        expires_in: keys.ttl_seconds(),
        user: UserResponse::from(user),
    }))
}

#[instrument(skip_all)]
async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

#[instrument(skip_all)]
async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(mut payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if payload.is_empty() {
        return Err(ApiError::Validation("no fields to update".into()));
    }

    if let Some(username) = &payload.username {
        validate_username(username)?;
        if User::username_taken_by_other(&state.db, username, user.id).await? {
            return Err(ApiError::Duplicate("username is already in use".into()));
        }
    }
    if let Some(email) = payload.email.take() {
        let email = email.trim().to_lowercase();
        validate_email(&email)?;
        if User::email_taken_by_other(&state.db, &email, user.id).await? {
            return Err(ApiError::Duplicate("email is already in use".into()));
        }
        payload.email = Some(email);
    }

    let password_hash = match &payload.password {
        Some(p) => {
            validate_password(p)?;
            Some(hash_password(p).map_err(|_| ApiError::Internal)?)
        }
        None => None,
    };

    let updated = User::update(
        &state.db,
        user.id,
        payload.username.as_deref(),
        payload.email.as_deref(),
        password_hash.as_deref(),
    )
    .await?;

    info!(user_id = updated.id, "user updated");
    Ok(Json(UserResponse::from(updated)))
}

#[instrument(skip_all)]
async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    if !verify_password(&payload.current_password, &user.password_hash) {
        return Err(ApiError::Validation("current password is incorrect".into()));
    }
    validate_password(&payload.new_password)?;

    let hash = hash_password(&payload.new_password).map_err(|_| ApiError::Internal)?;
    User::update(&state.db, user.id, None, None, Some(&hash)).await?;

    info!(user_id = user.id, "password changed");
    Ok(Json(json!({ "message": "password updated successfully" })))
}

#[instrument(skip_all)]
async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    User::delete(&state.db, user.id).await?;
    info!(user_id = user.id, "account deleted");
    Ok(Json(json!({ "message": "account deleted successfully" })))
}

// Administrative endpoints. Protected by a valid session only; the data
// model carries no role attribute.

#[instrument(skip_all)]
async fn list_users(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = User::list(&state.db, p.skip(), p.limit()).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip_all)]
async fn get_user(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(Json(UserResponse::from(user)))
}

#[instrument(skip_all)]
async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    User::delete(&state.db, id).await?;
    info!(user_id = id, "user deleted by admin endpoint");
    Ok(Json(json!({ "message": "user deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("alice@x.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("spaces in@x.com"));
    }

    #[test]
    fn username_bounds() {
        assert!(validate_username("al").is_err());
        assert!(validate_username("ali").is_ok());
        assert!(validate_username(&"a".repeat(50)).is_ok());
        assert!(validate_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn password_bounds() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password(&"x".repeat(100)).is_ok());
        assert!(validate_password(&"x".repeat(101)).is_err());
    }
}
