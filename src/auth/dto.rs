use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::repo::User;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Partial update of the current user; absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password.is_none()
    }
}

/// Request body for password rotation.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Public view of a user; the password hash never leaves the server.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

/// `skip`/`limit` paging for list endpoints.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

impl Pagination {
    // Negative query values would otherwise reach OFFSET/LIMIT and error.
    pub fn skip(&self) -> i64 {
        self.skip.max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            username: "alice".into(),
            email: "alice@x.com".into(),
            password_hash: "$argon2id$v=19$...".into(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        }
    }

    #[test]
    fn user_response_never_leaks_password_hash() {
        let json = serde_json::to_string(&UserResponse::from(sample_user())).unwrap();
        assert!(json.contains("alice@x.com"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn token_response_shape() {
        let body = TokenResponse {
            access_token: "abc".into(),
            token_type: "bearer".into(),
            expires_in: 1800,
            user: UserResponse::from(sample_user()),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["expires_in"], 1800);
        assert_eq!(json["user"]["username"], "alice");
    }

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.skip(), 0);
        assert_eq!(p.limit(), 100);
    }

    #[test]
    fn pagination_clamps_negative_values() {
        let p: Pagination = serde_json::from_str(r#"{"skip":-5,"limit":-1}"#).unwrap();
        assert_eq!(p.skip(), 0);
        assert_eq!(p.limit(), 0);
    }

    #[test]
    fn empty_update_detected() {
        let u: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(u.is_empty());
        let u: UpdateUserRequest = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert!(!u.is_empty());
    }
}
