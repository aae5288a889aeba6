use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use axum_extra::extract::CookieJar;
use tracing::warn;

use super::{
    basic::BasicCredentials,
    repo_types::User,
    services::AuthService,
};
use crate::config::SessionConfig;

/// Session id taken from the configured cookie, if any.
pub(crate) fn session_cookie(parts: &Parts, cfg: &SessionConfig) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(&cfg.cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// The authenticated user, from the session cookie or Basic credentials.
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AuthService: FromRef<S>,
    SessionConfig: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthService::from_ref(state);
        let cfg = SessionConfig::from_ref(state);

        if let Some(session_id) = session_cookie(parts, &cfg) {
            if let Some(user) = auth.user_from_session(&session_id).await {
                return Ok(CurrentUser(user));
            }
        }

        if let Some(creds) = BasicCredentials::from_headers(&parts.headers) {
            if let Some(user) = auth.user_from_credentials(&creds.email, &creds.password).await {
                return Ok(CurrentUser(user));
            }
        }

        warn!("request without valid session or credentials");
        Err((StatusCode::FORBIDDEN, "Forbidden".into()))
    }
}
