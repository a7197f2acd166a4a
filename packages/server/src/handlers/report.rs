use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::report::ParticipantsReport;
use crate::services::{ActivityDirectory, guarded};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/reports/participants",
    tag = "Reports",
    operation_id = "participantsReport",
    summary = "Participants across all activities",
    description = "Every enrollment of both kinds with activity and participant details, oldest first, plus per-kind totals. Requires `report:view` permission.",
    responses(
        (status = 200, description = "Report", body = ParticipantsReport),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn participants_report(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ParticipantsReport>, AppError> {
    auth_user.require_permission("report:view")?;

    let directory = ActivityDirectory::new(&state.db);
    let report = guarded(state.store_limits(), || directory.participants_report()).await?;
    Ok(Json(report))
}
