use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for account registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Display name shown on certificates (1-128 characters).
    #[schema(example = "Ana Pérez")]
    pub name: String,
    /// Unique email address, used as the login.
    #[schema(example = "ana@example.com")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

/// Lowercase and trim an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let name = payload.name.trim();
    if name.is_empty() || name.chars().count() > 128 {
        return Err(AppError::Validation("Name must be 1-128 characters".into()));
    }
    let email = normalize_email(&payload.email);
    if email.len() > 254 || !looks_like_email(&email) {
        return Err(AppError::Validation("Email address is not valid".into()));
    }
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ana@example.com")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful registration response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "Ana Pérez")]
    pub name: String,
    #[schema(example = "ana@example.com")]
    pub email: String,
}

impl From<crate::entity::user::Model> for RegisterResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub id: i32,
    pub name: String,
    pub email: String,
    #[schema(example = "visitor")]
    pub role: String,
    #[schema(example = json!(["enrollment:self"]))]
    pub permissions: Vec<String>,
}

/// Current authenticated user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[schema(example = "visitor")]
    pub role: String,
    #[schema(example = json!(["enrollment:self"]))]
    pub permissions: Vec<String>,
}
