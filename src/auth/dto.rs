use serde::{Deserialize, Serialize};

/// Form body for registration and login.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Form body for requesting a reset token.
#[derive(Debug, Deserialize)]
pub struct ResetRequestForm {
    pub email: Option<String>,
}

/// Form body for consuming a reset token.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordForm {
    pub email: Option<String>,
    pub reset_token: Option<String>,
    pub new_password: Option<String>,
}

/// `{"email": ..., "message": ...}`
#[derive(Debug, Serialize)]
pub struct EmailMessage {
    pub email: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ResetTokenResponse {
    pub email: String,
    pub reset_token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub email: String,
}

/// Keeps only present, non-blank form values.
pub(crate) fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}
