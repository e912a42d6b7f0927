use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Error taxonomy surfaced at the endpoint boundary. Raw storage errors
/// never reach the client; they are logged and collapsed into `Transient`
/// or `Internal`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    NotFound(String),
    #[error("not authorized")]
    Unauthorized,
    #[error("storage temporarily unavailable")]
    Transient,
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Duplicate(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Transient => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "detail": self.to_string() }));
        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => ApiError::NotFound("not found".into()),
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                // Unique index violation is the authoritative duplicate
                // signal; pick the message from the violated constraint.
                let msg = match db.constraint() {
                    Some("user_username_key") => "username is already registered",
                    Some("user_email_key") => "email is already registered",
                    _ => "duplicate record",
                };
                ApiError::Duplicate(msg.into())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                error!(error = %e, "transient storage failure");
                ApiError::Transient
            }
            _ => {
                error!(error = %e, "storage error");
                ApiError::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn pool_timeout_maps_to_transient() {
        let err = ApiError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, ApiError::Transient));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unauthorized_response_carries_bearer_challenge() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response
                .headers()
                .get(header::WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );
    }

    // Minimal DatabaseError for driving the sqlx mapping without a live
    // database.
    #[derive(Debug)]
    struct StubDbError {
        code: &'static str,
        constraint: Option<&'static str>,
    }

    impl std::fmt::Display for StubDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(std::borrow::Cow::Borrowed(self.code))
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    fn db_error(code: &'static str, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(StubDbError { code, constraint }))
    }

    #[test]
    fn unique_violation_maps_to_duplicate_with_constraint_message() {
        let err = ApiError::from(db_error("23505", Some("user_username_key")));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "username is already registered");

        let err = ApiError::from(db_error("23505", Some("user_email_key")));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "email is already registered");
    }

    #[test]
    fn unique_violation_on_unknown_constraint_is_still_duplicate() {
        let err = ApiError::from(db_error("23505", None));
        assert!(matches!(err, ApiError::Duplicate(_)));
        assert_eq!(err.to_string(), "duplicate record");
    }

    #[test]
    fn other_database_errors_are_internal() {
        let err = ApiError::from(db_error("23503", Some("some_fkey")));
        assert!(matches!(err, ApiError::Internal));
    }

    #[test]
    fn duplicate_is_conflict() {
        let err = ApiError::Duplicate("username is already registered".into());
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "username is already registered");
    }
}
