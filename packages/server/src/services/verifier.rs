use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entity::activity::{self, ActivityKind};
use crate::entity::{enrollment, user};
use crate::error::AppError;
use crate::models::certificate::VerificationRecord;

/// Public, read-only certificate lookup.
pub struct CertificateVerifier<'a> {
    db: &'a DatabaseConnection,
}

fn unknown_code() -> AppError {
    AppError::NotFound("Certificate not found".into())
}

impl<'a> CertificateVerifier<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Resolve a code to its minimal public record.
    ///
    /// Malformed and unknown codes are indistinguishable to the caller.
    pub async fn verify(&self, code: &str) -> Result<VerificationRecord, AppError> {
        let code = Uuid::parse_str(code.trim()).map_err(|_| unknown_code())?;

        for kind in ActivityKind::SCAN_ORDER {
            let hit = enrollment::Entity::find()
                .filter(enrollment::Column::CertificateCode.eq(code))
                .find_also_related(activity::Entity)
                .filter(activity::Column::Kind.eq(kind))
                .one(self.db)
                .await?;

            if let Some((e, Some(a))) = hit {
                let participant = user::Entity::find_by_id(e.user_id)
                    .one(self.db)
                    .await?
                    .ok_or_else(unknown_code)?;
                return Ok(VerificationRecord {
                    kind,
                    participant_name: participant.name,
                    activity_title: a.title,
                    issued_at: e.certificate_issued_at,
                });
            }
        }

        Err(unknown_code())
    }
}
