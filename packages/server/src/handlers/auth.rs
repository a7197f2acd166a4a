use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{role, role_permission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse, normalize_email,
    validate_login_request, validate_register_request,
};
use crate::services::{bounded, guarded};
use crate::state::AppState;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Create an account",
    description = "Registers a visitor account. Emails are compared case-insensitively.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_user = user::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(normalize_email(&payload.email)),
        password: Set(hash),
        role: Set(role::DEFAULT_ROLE.to_string()),
        identity_secret: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let insert = async {
        new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailTaken,
            _ => AppError::from(e),
        })
    };
    let user = bounded(state.store_limits(), insert).await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse::from(user))))
}

async fn permissions_of(db: &DatabaseConnection, role: &str) -> Result<Vec<String>, AppError> {
    Ok(role_permission::Entity::find()
        .filter(role_permission::Column::Role.eq(role))
        .all(db)
        .await?
        .into_iter()
        .map(|rp| rp.permission)
        .collect())
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in",
    description = "Exchanges email and password for a JWT bearer token carrying the user's role and permissions.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong email or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let email = normalize_email(&payload.email);
    let (db, email) = (&state.db, email.as_str());
    let lookup = move || async move {
        let user = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(db)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        let permissions = permissions_of(db, &user.role).await?;
        Ok::<_, AppError>((user, permissions))
    };
    let (user, permissions) = guarded(state.store_limits(), lookup).await?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = jwt::sign(
        user.id,
        &user.email,
        &user.role,
        permissions.clone(),
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_days,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        permissions,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Current user",
    responses(
        (status = 200, description = "Profile of the token holder", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let (db, user_id) = (&state.db, auth_user.user_id);
    let user = guarded(state.store_limits(), move || async move {
        user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    })
    .await?;

    Ok(Json(MeResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: auth_user.role,
        permissions: auth_user.permissions,
    }))
}
