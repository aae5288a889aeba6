use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                       // unique user ID
    pub email: String,                  // normalized email
    #[serde(skip_serializing)]
    pub hashed_password: String,        // Argon2 PHC string, not exposed in JSON
    #[serde(skip_serializing)]
    pub session_id: Option<String>,     // set while logged in
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,    // set while a reset is outstanding
    pub created_at: OffsetDateTime,     // creation timestamp
}

/// Unique attribute a user can be looked up by.
#[derive(Debug, Clone, Copy)]
pub enum UserLookup<'a> {
    Email(&'a str),
    SessionId(&'a str),
    ResetToken(&'a str),
}

impl UserLookup<'_> {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            UserLookup::Email(_) => "email",
            UserLookup::SessionId(_) => "session_id",
            UserLookup::ResetToken(_) => "reset_token",
        }
    }

    pub(crate) fn matches(&self, user: &User) -> bool {
        match *self {
            UserLookup::Email(email) => user.email == email,
            UserLookup::SessionId(sid) => user.session_id.as_deref() == Some(sid),
            UserLookup::ResetToken(tok) => user.reset_token.as_deref() == Some(tok),
        }
    }
}

/// Sparse update of a user row.
///
/// Token fields are three-state: `None` leaves the column alone,
/// `Some(None)` clears it and `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub hashed_password: Option<String>,
    pub session_id: Option<Option<String>>,
    pub reset_token: Option<Option<String>>,
}

impl UserUpdate {
    pub fn session(session_id: Option<String>) -> Self {
        Self {
            session_id: Some(session_id),
            ..Self::default()
        }
    }

    pub fn password_reset(reset_token: String) -> Self {
        Self {
            reset_token: Some(Some(reset_token)),
            ..Self::default()
        }
    }

    /// New hash and a cleared reset token, applied together.
    pub fn password_changed(hashed_password: String) -> Self {
        Self {
            hashed_password: Some(hashed_password),
            reset_token: Some(None),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hashed_password.is_none() && self.session_id.is_none() && self.reset_token.is_none()
    }

    pub(crate) fn apply(self, user: &mut User) {
        if let Some(hash) = self.hashed_password {
            user.hashed_password = hash;
        }
        if let Some(sid) = self.session_id {
            user.session_id = sid;
        }
        if let Some(tok) = self.reset_token {
            user.reset_token = tok;
        }
    }
}
