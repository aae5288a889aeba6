use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            required, CredentialsForm, EmailMessage, ProfileResponse, ResetRequestForm,
            ResetTokenResponse, UpdatePasswordForm,
        },
        error::AuthError,
        extractors::CurrentUser,
        services::{is_valid_email, normalize_email},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/sessions", post(login).delete(logout))
        .route("/reset_password", post(get_reset_password_token).put(update_password))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(profile))
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, "Forbidden").into_response()
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Json<EmailMessage>, AuthError> {
    let (Some(email), Some(password)) = (required(form.email), required(form.password)) else {
        return Err(AuthError::MissingCredentials);
    };

    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AuthError::InvalidEmail);
    }

    let user = state.auth.register_user(&email, &password).await?;
    Ok(Json(EmailMessage {
        email: user.email,
        message: "user created",
    }))
}

#[instrument(skip(state, jar, form))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<(CookieJar, Json<EmailMessage>), Response> {
    let (Some(email), Some(password)) = (required(form.email), required(form.password)) else {
        return Err(unauthorized());
    };

    if !state.auth.valid_login(&email, &password).await {
        return Err(unauthorized());
    }

    let session_id = state
        .auth
        .create_session(&email)
        .await
        .map_err(IntoResponse::into_response)?;

    let cookie = Cookie::build((state.config.session.cookie_name.clone(), session_id))
        .path("/")
        .http_only(true);

    info!(email = %email, "user logged in");
    Ok((
        jar.add(cookie),
        Json(EmailMessage {
            email: normalize_email(&email),
            message: "logged in",
        }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), Response> {
    let cookie_name = state.config.session.cookie_name.clone();
    let Some(session_id) = jar.get(&cookie_name).map(|c| c.value().to_string()) else {
        return Err(forbidden());
    };

    let Some(user) = state.auth.user_from_session(&session_id).await else {
        return Err(forbidden());
    };

    state.auth.destroy_session(user.id).await;
    let jar = jar.remove(Cookie::build((cookie_name, "")).path("/"));
    Ok((jar, Redirect::to("/")))
}

#[instrument(skip_all)]
pub async fn profile(CurrentUser(user): CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse { email: user.email })
}

#[instrument(skip(state, form))]
pub async fn get_reset_password_token(
    State(state): State<AppState>,
    Form(form): Form<ResetRequestForm>,
) -> Result<Json<ResetTokenResponse>, Response> {
    let Some(email) = required(form.email) else {
        return Err(forbidden());
    };

    let reset_token = state
        .auth
        .reset_password_token(&email)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(ResetTokenResponse {
        email: normalize_email(&email),
        reset_token,
    }))
}

#[instrument(skip(state, form))]
pub async fn update_password(
    State(state): State<AppState>,
    Form(form): Form<UpdatePasswordForm>,
) -> Result<Json<EmailMessage>, Response> {
    let (Some(email), Some(reset_token), Some(new_password)) = (
        required(form.email),
        required(form.reset_token),
        required(form.new_password),
    ) else {
        return Err(forbidden());
    };

    state
        .auth
        .update_password(&reset_token, &new_password)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(EmailMessage {
        email: normalize_email(&email),
        message: "Password updated",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_message_serialization() {
        let body = EmailMessage {
            email: "test@example.com".to_string(),
            message: "user created",
        };

        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("user created"));
    }

    #[test]
    fn blank_form_values_are_missing() {
        assert_eq!(required(Some("  ".into())), None);
        assert_eq!(required(None), None);
        assert_eq!(required(Some("a".into())).as_deref(), Some("a"));
    }
}
