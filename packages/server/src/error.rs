use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{MailError, QrError, RenderError, Retryable};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOTHING_TO_UPDATE`,
    /// `TOKEN_MISSING`, `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`,
    /// `NOT_ELIGIBLE`, `NOT_FOUND`, `ALREADY_ENROLLED`, `CAPACITY_EXCEEDED`,
    /// `CONFLICT`, `EMAIL_TAKEN`, `DELIVERY_UNAVAILABLE`, `TRANSIENT`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "CAPACITY_EXCEEDED")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "This activity is full")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("nothing to update")]
    NothingToUpdate,
    #[error("authentication required")]
    TokenMissing,
    #[error("invalid or expired token")]
    TokenInvalid,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("insufficient permissions")]
    PermissionDenied,
    /// Certificate requested before attendance was confirmed.
    #[error("not eligible: {0}")]
    NotEligible(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already enrolled")]
    AlreadyEnrolled,
    #[error("capacity exceeded")]
    CapacityExceeded,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("email already registered")]
    EmailTaken,
    /// Mail transport missing or unreachable. Never undoes the triggering change.
    #[error("delivery unavailable: {0}")]
    DeliveryUnavailable(String),
    /// Store timeout or connection failure; safe to retry.
    #[error("transient store failure: {0}")]
    Transient(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for the admission-control outcomes reported as 409.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            AppError::AlreadyEnrolled
                | AppError::CapacityExceeded
                | AppError::Conflict(_)
                | AppError::EmailTaken
        )
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NothingToUpdate => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "NOTHING_TO_UPDATE",
                    message: "The request does not contain any field to update".into(),
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid email or password".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Insufficient permissions".into(),
                },
            ),
            AppError::NotEligible(msg) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "NOT_ELIGIBLE",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::AlreadyEnrolled => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "ALREADY_ENROLLED",
                    message: "You are already enrolled in this activity".into(),
                },
            ),
            AppError::CapacityExceeded => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CAPACITY_EXCEEDED",
                    message: "This activity is full".into(),
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "EMAIL_TAKEN",
                    message: "Email is already registered".into(),
                },
            ),
            AppError::DeliveryUnavailable(detail) => {
                tracing::warn!("Mail delivery unavailable: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody {
                        code: "DELIVERY_UNAVAILABLE",
                        message: "Email delivery is not available right now".into(),
                    },
                )
            }
            AppError::Transient(detail) => {
                tracing::warn!("Transient store failure: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody {
                        code: "TRANSIENT",
                        message: "The service is temporarily unavailable, please retry".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let transient = matches!(self, AppError::Transient(_));
        let (status, body) = self.status_and_body();

        if transient {
            (status, [("Retry-After", "1")], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl Retryable for AppError {
    fn is_transient(&self) -> bool {
        matches!(self, AppError::Transient(_))
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => AppError::Transient(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        AppError::DeliveryUnavailable(err.to_string())
    }
}

impl From<QrError> for AppError {
    fn from(err: QrError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Internal(format!("certificate rendering failed: {err}"))
    }
}
