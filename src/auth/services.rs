use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::{
    error::{AuthError, StoreError},
    password::{Argon2Hashing, PasswordHashing},
    repo::UserStore,
    repo_types::{User, UserLookup, UserUpdate},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Emails are compared case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Verified against when the email is unknown, so both login branches
// pay for one verification with the configured hasher.
const DUMMY_PASSWORD: &str = "not-a-real-password";

/// Opaque random token (UUID v4, 122 random bits).
pub(crate) fn generate_token() -> String {
    Uuid::new_v4().to_string()
}

/// Registration, login, sessions and password resets on top of a [`UserStore`].
///
/// Cheap to clone; build one at startup and hand it to the handlers.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHashing>,
    dummy_hash: Option<Arc<str>>,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self::with_hasher(store, Arc::new(Argon2Hashing))
    }

    pub fn with_hasher(store: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHashing>) -> Self {
        let dummy_hash = match hasher.hash(DUMMY_PASSWORD) {
            Ok(h) => Some(Arc::from(h)),
            Err(e) => {
                warn!(error = %e, "could not precompute dummy hash");
                None
            }
        };
        Self {
            store,
            hasher,
            dummy_hash,
        }
    }

    #[instrument(skip(self, password))]
    pub async fn register_user(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        match self.store.find_user_by(UserLookup::Email(&email)).await {
            Ok(_) => {
                warn!(email = %email, "email already registered");
                return Err(AuthError::AlreadyRegistered(email));
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let hashed = self.hasher.hash(password).map_err(AuthError::Hashing)?;
        let user = match self.store.add_user(&email, &hashed).await {
            Ok(u) => u,
            // lost a race with a concurrent registration
            Err(StoreError::Duplicate) => return Err(AuthError::AlreadyRegistered(email)),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Never fails: unknown users, lookup errors and bad hashes all read as `false`.
    #[instrument(skip(self, password))]
    pub async fn valid_login(&self, email: &str, password: &str) -> bool {
        self.check_credentials(email, password).await.is_some()
    }

    /// The user owning these credentials, if they check out.
    #[instrument(skip(self, password))]
    pub async fn user_from_credentials(&self, email: &str, password: &str) -> Option<User> {
        self.check_credentials(email, password).await
    }

    async fn check_credentials(&self, email: &str, password: &str) -> Option<User> {
        let email = normalize_email(email);
        let user = match self.store.find_user_by(UserLookup::Email(&email)).await {
            Ok(u) => u,
            Err(e) => {
                if let Some(hash) = self.dummy_hash.as_deref() {
                    let _ = self.hasher.verify(password, hash);
                }
                warn!(email = %email, error = %e, "login unknown email");
                return None;
            }
        };

        match self.hasher.verify(password, &user.hashed_password) {
            Ok(true) => Some(user),
            Ok(false) => {
                warn!(user_id = %user.id, "login invalid password");
                None
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "stored hash unreadable");
                None
            }
        }
    }

    /// Starts a session, replacing any session the user already had.
    #[instrument(skip(self))]
    pub async fn create_session(&self, email: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        let user = match self.store.find_user_by(UserLookup::Email(&email)).await {
            Ok(u) => u,
            Err(StoreError::NotFound) => return Err(AuthError::UserNotFound),
            Err(e) => return Err(e.into()),
        };

        let session_id = generate_token();
        self.store
            .update_user(user.id, UserUpdate::session(Some(session_id.clone())))
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AuthError::UserNotFound,
                other => other.into(),
            })?;

        info!(user_id = %user.id, "session created");
        Ok(session_id)
    }

    #[instrument(skip_all)]
    pub async fn user_from_session(&self, session_id: &str) -> Option<User> {
        if session_id.is_empty() {
            return None;
        }
        match self.store.find_user_by(UserLookup::SessionId(session_id)).await {
            Ok(u) => Some(u),
            Err(StoreError::NotFound) => {
                debug!("unknown session");
                None
            }
            Err(e) => {
                warn!(error = %e, "session lookup failed");
                None
            }
        }
    }

    /// Clears the user's session. Idempotent and never fails.
    #[instrument(skip(self))]
    pub async fn destroy_session(&self, user_id: Uuid) {
        match self.store.update_user(user_id, UserUpdate::session(None)).await {
            Ok(()) => info!(user_id = %user_id, "session destroyed"),
            Err(StoreError::NotFound) => debug!(user_id = %user_id, "no such user"),
            Err(e) => warn!(user_id = %user_id, error = %e, "destroy session failed"),
        }
    }

    /// Issues a reset token. Every failure looks the same to the caller.
    #[instrument(skip(self))]
    pub async fn reset_password_token(&self, email: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        let user = self
            .store
            .find_user_by(UserLookup::Email(&email))
            .await
            .map_err(|e| {
                warn!(email = %email, error = %e, "reset requested for unknown email");
                AuthError::CannotIssueToken
            })?;

        let token = generate_token();
        self.store
            .update_user(user.id, UserUpdate::password_reset(token.clone()))
            .await
            .map_err(|e| {
                warn!(user_id = %user.id, error = %e, "storing reset token failed");
                AuthError::CannotIssueToken
            })?;

        info!(user_id = %user.id, "reset token issued");
        Ok(token)
    }

    /// Consumes a reset token and sets a new password.
    #[instrument(skip_all)]
    pub async fn update_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if reset_token.is_empty() {
            return Err(AuthError::InvalidResetToken);
        }
        let user = self
            .store
            .find_user_by(UserLookup::ResetToken(reset_token))
            .await
            .map_err(|e| {
                warn!(error = %e, "unknown reset token");
                AuthError::InvalidResetToken
            })?;

        if new_password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let hashed = self.hasher.hash(new_password).map_err(AuthError::Hashing)?;
        self.store
            .update_user(user.id, UserUpdate::password_changed(hashed))
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AuthError::InvalidResetToken,
                other => other.into(),
            })?;

        info!(user_id = %user.id, "password updated");
        Ok(())
    }
}
