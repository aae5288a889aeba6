use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors raised by a [`UserStore`](crate::auth::repo::UserStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,

    #[error("duplicate user")]
    Duplicate,

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                StoreError::Duplicate
            }
            other => StoreError::Database(other),
        }
    }
}

/// Failures of the authentication workflow.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User {0} already exists")]
    AlreadyRegistered(String),

    #[error("user not found")]
    UserNotFound,

    #[error("invalid reset token")]
    InvalidResetToken,

    /// Covers both unknown emails and store failures.
    #[error("cannot issue reset token")]
    CannotIssueToken,

    #[error("email and password are required")]
    MissingCredentials,

    #[error("Invalid email")]
    InvalidEmail,

    #[error("password hashing failed: {0}")]
    Hashing(anyhow::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::AlreadyRegistered(_)
            | AuthError::MissingCredentials
            | AuthError::InvalidEmail => StatusCode::BAD_REQUEST,
            AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthError::InvalidResetToken | AuthError::CannotIssueToken => StatusCode::FORBIDDEN,
            AuthError::Hashing(_) | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AuthError::AlreadyRegistered(_) => "email already registered".into(),
            AuthError::Hashing(_) | AuthError::Store(_) => "internal error".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "auth request failed");
        }
        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}
