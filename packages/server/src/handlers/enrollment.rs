use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::entity::activity::ActivityKind;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::enrollment::*;
use crate::services::{ActivityDirectory, AttendanceTracker, EnrollmentLedger, bounded, guarded};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/{kind}/{id}/enrollment",
    tag = "Enrollment",
    operation_id = "enroll",
    summary = "Enroll in an activity",
    description = "Takes a seat for the caller. Capacity and uniqueness are enforced atomically: when several requests race for the last seat exactly one succeeds and the others receive CAPACITY_EXCEEDED.",
    params(
        ("kind" = String, Path, description = "`workshops` or `competitions`"),
        ("id" = i32, Path, description = "Activity ID"),
    ),
    responses(
        (status = 201, description = "Enrolled", body = EnrollmentRef),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Activity not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already enrolled or full (ALREADY_ENROLLED, CAPACITY_EXCEEDED)", body = ErrorBody),
        (status = 503, description = "Store unavailable (TRANSIENT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn enroll(
    Extension(kind): Extension<ActivityKind>,
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("enrollment:self")?;

    let ledger = EnrollmentLedger::new(&state.db);
    let user_id = auth_user.user_id;
    // A lost commit reply would make a retry see its own row as a duplicate.
    let created = bounded(state.store_limits(), ledger.enroll(kind, user_id, id)).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/{kind}/{id}/enrollment",
    tag = "Enrollment",
    operation_id = "withdraw",
    summary = "Withdraw from an activity",
    description = "Removes the caller's enrollment. Succeeds when there is nothing to remove.",
    params(
        ("kind" = String, Path, description = "`workshops` or `competitions`"),
        ("id" = i32, Path, description = "Activity ID"),
    ),
    responses(
        (status = 204, description = "Not enrolled any more"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn withdraw(
    Extension(kind): Extension<ActivityKind>,
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let ledger = EnrollmentLedger::new(&state.db);
    let user_id = auth_user.user_id;
    guarded(state.store_limits(), || ledger.withdraw(kind, user_id, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/{kind}/{id}/enrollment",
    tag = "Enrollment",
    operation_id = "enrollmentStatus",
    summary = "Get the caller's enrollment status",
    params(
        ("kind" = String, Path, description = "`workshops` or `competitions`"),
        ("id" = i32, Path, description = "Activity ID"),
    ),
    responses(
        (status = 200, description = "Enrollment status", body = EnrollmentStatusResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Activity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn enrollment_status(
    Extension(kind): Extension<ActivityKind>,
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EnrollmentStatusResponse>, AppError> {
    let ledger = EnrollmentLedger::new(&state.db);
    let user_id = auth_user.user_id;
    let enrollment = guarded(state.store_limits(), || ledger.status(kind, user_id, id)).await?;

    Ok(Json(EnrollmentStatusResponse {
        enrolled: enrollment.is_some(),
        enrollment,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/{kind}/mine",
    tag = "Enrollment",
    operation_id = "myActivities",
    summary = "List the caller's activities",
    description = "Activities of one kind the caller is enrolled in, newest enrollment first.",
    params(("kind" = String, Path, description = "`workshops` or `competitions`")),
    responses(
        (status = 200, description = "Caller's activities", body = Vec<MyActivity>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn my_activities(
    Extension(kind): Extension<ActivityKind>,
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<MyActivity>>, AppError> {
    let ledger = EnrollmentLedger::new(&state.db);
    let user_id = auth_user.user_id;
    let items = guarded(state.store_limits(), || ledger.mine(kind, user_id)).await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/{kind}/{id}/enrollees",
    tag = "Roster",
    operation_id = "listEnrollees",
    summary = "List an activity's enrollees",
    description = "Roster with each enrollee's name and email, newest enrollment first. Requires `enrollment:manage` permission.",
    params(
        ("kind" = String, Path, description = "`workshops` or `competitions`"),
        ("id" = i32, Path, description = "Activity ID"),
    ),
    responses(
        (status = 200, description = "Roster", body = Vec<EnrollmentView>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Activity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_enrollees(
    Extension(kind): Extension<ActivityKind>,
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<EnrollmentView>>, AppError> {
    auth_user.require_permission("enrollment:manage")?;

    let directory = ActivityDirectory::new(&state.db);
    let roster = guarded(state.store_limits(), || directory.enrollees(kind, id)).await?;
    Ok(Json(roster))
}

#[utoipa::path(
    put,
    path = "/api/v1/{kind}/{id}/enrollees/{user_id}/attendance",
    tag = "Roster",
    operation_id = "setAttendance",
    summary = "Mark attendance",
    description = "Sets the attended flag for one enrollee. Idempotent. Requires `enrollment:manage` permission.",
    params(
        ("kind" = String, Path, description = "`workshops` or `competitions`"),
        ("id" = i32, Path, description = "Activity ID"),
        ("user_id" = i32, Path, description = "Enrolled user ID"),
    ),
    request_body = SetAttendanceRequest,
    responses(
        (status = 204, description = "Attendance recorded"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Activity or enrollment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(attended = payload.attended))]
pub async fn set_attendance(
    Extension(kind): Extension<ActivityKind>,
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<SetAttendanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("enrollment:manage")?;

    let tracker = AttendanceTracker::new(&state.db);
    guarded(state.store_limits(), || {
        tracker.set_attendance(kind, id, user_id, payload.attended)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/v1/competitions/{id}/enrollees/{user_id}",
    tag = "Roster",
    operation_id = "setOutcome",
    summary = "Record a competition outcome",
    description = "Partially updates rank and project fields. Absent fields are untouched and `null` clears a field. Requires `enrollment:manage` permission.",
    params(
        ("id" = i32, Path, description = "Competition ID"),
        ("user_id" = i32, Path, description = "Enrolled user ID"),
    ),
    request_body = SetOutcomeRequest,
    responses(
        (status = 200, description = "Updated roster entry", body = EnrollmentView),
        (status = 400, description = "Validation error (VALIDATION_ERROR, NOTHING_TO_UPDATE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Competition or enrollment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn set_outcome(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<SetOutcomeRequest>,
) -> Result<Json<EnrollmentView>, AppError> {
    auth_user.require_permission("enrollment:manage")?;

    let tracker = AttendanceTracker::new(&state.db);
    let view = guarded(state.store_limits(), || {
        tracker.set_outcome(id, user_id, &payload)
    })
    .await?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/api/v1/competitions/results",
    tag = "Roster",
    operation_id = "competitionResults",
    summary = "Public competition results",
    description = "Ranked enrollees per competition, ordered by rank then enrollment time. Unranked enrollees are omitted.",
    params(ResultsQuery),
    responses(
        (status = 200, description = "Results", body = Vec<CompetitionResults>),
        (status = 404, description = "Competition not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(competition_id = ?query.competition_id))]
pub async fn competition_results(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<Vec<CompetitionResults>>, AppError> {
    let directory = ActivityDirectory::new(&state.db);
    let results = guarded(state.store_limits(), || {
        directory.results(query.competition_id)
    })
    .await?;
    Ok(Json(results))
}
