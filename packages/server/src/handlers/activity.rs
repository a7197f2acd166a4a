use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::entity::activity::ActivityKind;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::activity::*;
use crate::services::{ActivityDirectory, bounded, guarded};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/{kind}",
    tag = "Activities",
    operation_id = "listActivities",
    summary = "List activities of one kind",
    description = "Returns every workshop or competition with its live occupancy, most recently scheduled first (ties broken by descending id). `remaining` is `null` when capacity is unlimited.",
    params(("kind" = String, Path, description = "`workshops` or `competitions`")),
    responses(
        (status = 200, description = "Activities", body = Vec<ActivityView>),
        (status = 503, description = "Store unavailable (TRANSIENT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_activities(
    Extension(kind): Extension<ActivityKind>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ActivityView>>, AppError> {
    let directory = ActivityDirectory::new(&state.db);
    let items = guarded(state.store_limits(), || directory.list(kind)).await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/{kind}/{id}",
    tag = "Activities",
    operation_id = "getActivity",
    summary = "Get one activity",
    params(
        ("kind" = String, Path, description = "`workshops` or `competitions`"),
        ("id" = i32, Path, description = "Activity ID"),
    ),
    responses(
        (status = 200, description = "Activity", body = ActivityView),
        (status = 404, description = "Activity not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_activity(
    Extension(kind): Extension<ActivityKind>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ActivityView>, AppError> {
    let directory = ActivityDirectory::new(&state.db);
    let view = guarded(state.store_limits(), || directory.get(kind, id)).await?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/v1/{kind}",
    tag = "Activities",
    operation_id = "createActivity",
    summary = "Create an activity",
    description = "Creates a workshop or competition. Requires `activity:create` permission. `capacity` 0 means unlimited; `type_tag` defaults to \"Workshop\" or \"General\".",
    params(("kind" = String, Path, description = "`workshops` or `competitions`")),
    request_body = CreateActivityRequest,
    responses(
        (status = 201, description = "Activity created", body = ActivityView),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_activity(
    Extension(kind): Extension<ActivityKind>,
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("activity:create")?;
    validate_create_activity(&payload)?;

    let directory = ActivityDirectory::new(&state.db);
    let view = bounded(state.store_limits(), directory.create(kind, &payload)).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/{kind}/{id}",
    tag = "Activities",
    operation_id = "updateActivity",
    summary = "Update an activity",
    description = "Partially updates an activity. Requires `activity:manage` permission. The schedule window is validated against the stored values. Lowering capacity below current occupancy keeps existing enrollments and blocks new ones.",
    params(
        ("kind" = String, Path, description = "`workshops` or `competitions`"),
        ("id" = i32, Path, description = "Activity ID"),
    ),
    request_body = UpdateActivityRequest,
    responses(
        (status = 200, description = "Activity updated", body = ActivityView),
        (status = 400, description = "Validation error (VALIDATION_ERROR, NOTHING_TO_UPDATE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Activity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_activity(
    Extension(kind): Extension<ActivityKind>,
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateActivityRequest>,
) -> Result<Json<ActivityView>, AppError> {
    auth_user.require_permission("activity:manage")?;
    validate_update_activity(&payload)?;

    let directory = ActivityDirectory::new(&state.db);
    let view = guarded(state.store_limits(), || directory.update(kind, id, &payload)).await?;
    Ok(Json(view))
}

#[utoipa::path(
    delete,
    path = "/api/v1/{kind}/{id}",
    tag = "Activities",
    operation_id = "deleteActivity",
    summary = "Delete an activity",
    description = "Deletes the activity and all of its enrollments in one transaction. Requires `activity:delete` permission.",
    params(
        ("kind" = String, Path, description = "`workshops` or `competitions`"),
        ("id" = i32, Path, description = "Activity ID"),
    ),
    responses(
        (status = 204, description = "Activity deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Activity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_activity(
    Extension(kind): Extension<ActivityKind>,
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("activity:delete")?;

    let directory = ActivityDirectory::new(&state.db);
    guarded(state.store_limits(), || directory.delete(kind, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
