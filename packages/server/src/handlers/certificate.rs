use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use common::CertificateDocument;
use tracing::instrument;

use crate::entity::activity::ActivityKind;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::certificate::{CertificatePayload, VerificationRecord};
use crate::services::{CertificateIssuer, CertificateVerifier, guarded};
use crate::state::AppState;

async fn issue_for_caller(
    state: &AppState,
    kind: ActivityKind,
    user_id: i32,
    activity_id: i32,
) -> Result<CertificatePayload, AppError> {
    let issuer = CertificateIssuer::new(&state.db, &state.config.server.public_base_url);
    guarded(state.store_limits(), || {
        issuer.certificate_for(kind, user_id, activity_id)
    })
    .await
}

#[utoipa::path(
    get,
    path = "/api/v1/{kind}/{id}/certificate",
    tag = "Certificates",
    operation_id = "getCertificate",
    summary = "Issue or fetch the caller's certificate",
    description = "Returns the certificate data for the caller's enrollment. The verification code is assigned on the first request after attendance is confirmed and never changes afterwards.",
    params(
        ("kind" = String, Path, description = "`workshops` or `competitions`"),
        ("id" = i32, Path, description = "Activity ID"),
    ),
    responses(
        (status = 200, description = "Certificate data", body = CertificatePayload),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Attendance not confirmed (NOT_ELIGIBLE)", body = ErrorBody),
        (status = 404, description = "Activity not found or caller not enrolled (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_certificate(
    Extension(kind): Extension<ActivityKind>,
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CertificatePayload>, AppError> {
    let payload = issue_for_caller(&state, kind, auth_user.user_id, id).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/api/v1/{kind}/{id}/certificate/document",
    tag = "Certificates",
    operation_id = "downloadCertificate",
    summary = "Download the caller's certificate document",
    description = "Issues the code if needed, then renders the certificate. A rendering failure is reported as INTERNAL_ERROR and leaves the issued code in place.",
    params(
        ("kind" = String, Path, description = "`workshops` or `competitions`"),
        ("id" = i32, Path, description = "Activity ID"),
    ),
    responses(
        (status = 200, description = "Rendered certificate", content_type = "text/plain"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Attendance not confirmed (NOT_ELIGIBLE)", body = ErrorBody),
        (status = 404, description = "Activity not found or caller not enrolled (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn download_certificate(
    Extension(kind): Extension<ActivityKind>,
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let payload = issue_for_caller(&state, kind, auth_user.user_id, id).await?;

    let document = CertificateDocument {
        subject_name: payload.subject_name,
        activity_title: payload.activity_title,
        activity_kind: kind.label().to_string(),
        window_start: payload.window_start,
        window_end: payload.window_end,
        verification_code: payload.verification_code,
        verify_url: payload.verify_url,
    };
    let rendered = state.renderer.render(&document)?;

    let disposition = format!(
        "attachment; filename=\"certificate-{}-{id}.{}\"",
        kind.label().to_lowercase(),
        rendered.file_extension
    );
    Ok((
        [
            (header::CONTENT_TYPE, rendered.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        rendered.bytes,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates/verify/{code}",
    tag = "Certificates",
    operation_id = "verifyCertificate",
    summary = "Verify a certificate code",
    description = "Public trust check. Discloses only the activity kind, participant name, activity title and issue time. Unknown and malformed codes both return NOT_FOUND.",
    params(("code" = String, Path, description = "Verification code")),
    responses(
        (status = 200, description = "Certificate is genuine", body = VerificationRecord),
        (status = 404, description = "Unknown code (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<VerificationRecord>, AppError> {
    let verifier = CertificateVerifier::new(&state.db);
    let record = guarded(state.store_limits(), || verifier.verify(&code)).await?;
    Ok(Json(record))
}
