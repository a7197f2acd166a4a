use axum::Json;
use axum::extract::{Query, State};
use tracing::{instrument, warn};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::identity::*;
use crate::services::{IdentityTokens, guarded};
use crate::state::AppState;

fn tokens(state: &AppState) -> IdentityTokens<'_> {
    IdentityTokens::new(
        &state.db,
        state.qr.as_ref(),
        state.mailer.as_ref(),
        &state.config.mail.site_name,
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/me/identity-token",
    tag = "Identity",
    operation_id = "getIdentityToken",
    summary = "Get the caller's identity QR token",
    description = "Returns the opaque payload and its QR rendering. The underlying secret is created on first request.",
    responses(
        (status = 200, description = "Identity token", body = IdentityTokenResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_identity_token(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<IdentityTokenResponse>, AppError> {
    let tokens = tokens(&state);
    let user_id = auth_user.user_id;
    let token = guarded(state.store_limits(), || tokens.token_for(user_id)).await?;
    Ok(Json(token))
}

#[utoipa::path(
    post,
    path = "/api/v1/me/identity-token/rotate",
    tag = "Identity",
    operation_id = "rotateIdentityToken",
    summary = "Rotate the caller's identity token",
    description = "Replaces the secret; previously issued QR codes stop matching immediately. With `notify=true` the new code is emailed. A delivery failure does not undo the rotation and is reported through `emailed` and `delivery_error`.",
    params(RotateQuery),
    responses(
        (status = 200, description = "Token rotated", body = RotateResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id, notify = query.notify))]
pub async fn rotate_identity_token(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<RotateQuery>,
) -> Result<Json<RotateResponse>, AppError> {
    let tokens = tokens(&state);
    let user_id = auth_user.user_id;
    let token = guarded(state.store_limits(), || tokens.rotate_token(user_id)).await?;

    let (emailed, delivery_error) = if query.notify {
        match tokens.deliver(&token).await {
            Ok(()) => (true, None),
            Err(e) => {
                warn!(user_id, error = %e, "Rotation stands, notification not delivered");
                (false, Some(e.to_string()))
            }
        }
    } else {
        (false, None)
    };

    Ok(Json(RotateResponse {
        token,
        emailed,
        delivery_error,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/me/identity-token/email",
    tag = "Identity",
    operation_id = "emailIdentityToken",
    summary = "Email the caller's current identity token",
    description = "Sends the current QR code to the account address without rotating it.",
    responses(
        (status = 200, description = "Handed to the mail transport", body = EmailTokenResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 503, description = "Mail not available (DELIVERY_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn email_identity_token(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<EmailTokenResponse>, AppError> {
    let tokens = tokens(&state);
    let user_id = auth_user.user_id;
    let token = guarded(state.store_limits(), || tokens.token_for(user_id)).await?;

    tokens.deliver(&token).await?;
    Ok(Json(EmailTokenResponse {
        emailed: true,
        to: token.email,
    }))
}
