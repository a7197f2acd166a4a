use chrono::{DateTime, SubsecRound, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr,
};
use tracing::info;
use uuid::Uuid;

use crate::entity::activity::{self, ActivityKind};
use crate::entity::{enrollment, user};
use crate::error::AppError;
use crate::models::certificate::CertificatePayload;
use crate::utils::activity::{find_activity, find_enrollment};

/// Issues write-once, attendance-gated certificate codes.
pub struct CertificateIssuer<'a> {
    db: &'a DatabaseConnection,
    public_base_url: &'a str,
}

/// Public link that resolves a certificate code.
pub fn verify_url(public_base_url: &str, code: &str) -> String {
    format!(
        "{}/api/v1/certificates/verify/{code}",
        public_base_url.trim_end_matches('/')
    )
}

/// A stored certificate code and when it was first assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedCode {
    pub code: Uuid,
    pub issued_at: Option<DateTime<Utc>>,
}

fn issued_code(e: &enrollment::Model) -> Option<IssuedCode> {
    e.certificate_code.map(|code| IssuedCode {
        code,
        issued_at: e.certificate_issued_at,
    })
}

/// Issue timestamp at the precision the database keeps, so the value
/// returned on first issuance matches later reads.
fn issue_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn not_eligible() -> AppError {
    AppError::NotEligible("Attendance has not been confirmed for this enrollment".into())
}

impl<'a> CertificateIssuer<'a> {
    pub fn new(db: &'a DatabaseConnection, public_base_url: &'a str) -> Self {
        Self {
            db,
            public_base_url,
        }
    }

    async fn find_enrollment_of_kind(
        &self,
        kind: ActivityKind,
        enrollment_id: i32,
    ) -> Result<enrollment::Model, AppError> {
        enrollment::Entity::find_by_id(enrollment_id)
            .find_also_related(activity::Entity)
            .filter(activity::Column::Kind.eq(kind))
            .one(self.db)
            .await?
            .map(|(e, _)| e)
            .ok_or_else(|| AppError::NotFound("Enrollment not found".into()))
    }

    /// Return the enrollment's certificate code, assigning one on first use.
    ///
    /// The assignment is a single conditional write that only succeeds while
    /// the row is attended and still has no code, so at most one code is ever
    /// stored per enrollment.
    pub async fn issue_or_get(
        &self,
        kind: ActivityKind,
        enrollment_id: i32,
    ) -> Result<IssuedCode, AppError> {
        let existing = self.find_enrollment_of_kind(kind, enrollment_id).await?;
        if !existing.attended {
            return Err(not_eligible());
        }
        if let Some(issued) = issued_code(&existing) {
            return Ok(issued);
        }

        let code = Uuid::new_v4();
        let issued_at = issue_timestamp();
        let res = enrollment::Entity::update_many()
            .col_expr(enrollment::Column::CertificateCode, Expr::value(code))
            .col_expr(
                enrollment::Column::CertificateIssuedAt,
                Expr::value(issued_at),
            )
            .filter(enrollment::Column::Id.eq(enrollment_id))
            .filter(enrollment::Column::Attended.eq(true))
            .filter(enrollment::Column::CertificateCode.is_null())
            .exec(self.db)
            .await?;

        if res.rows_affected == 1 {
            info!(kind = ?kind, enrollment_id, "Certificate issued");
            return Ok(IssuedCode {
                code,
                issued_at: Some(issued_at),
            });
        }

        // Lost a race with another issuer, or attendance was revoked meanwhile.
        let current = self.find_enrollment_of_kind(kind, enrollment_id).await?;
        issued_code(&current).ok_or_else(not_eligible)
    }

    /// Resolve the caller's enrollment, issue or fetch its code, and build
    /// everything a certificate document shows.
    pub async fn certificate_for(
        &self,
        kind: ActivityKind,
        user_id: i32,
        activity_id: i32,
    ) -> Result<CertificatePayload, AppError> {
        let activity = find_activity(self.db, kind, activity_id).await?;
        let enrollment = find_enrollment(self.db, activity_id, user_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => {
                    AppError::NotFound("You are not enrolled in this activity".into())
                }
                other => other,
            })?;

        let issued = self.issue_or_get(kind, enrollment.id).await?;
        let subject = user::Entity::find_by_id(user_id)
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let code = issued.code.to_string();
        Ok(CertificatePayload {
            subject_name: subject.name,
            activity_title: activity.title,
            kind,
            window_start: activity.start_time,
            window_end: activity.end_time,
            verify_url: verify_url(self.public_base_url, &code),
            verification_code: code,
            issued_at: issued.issued_at,
        })
    }
}
