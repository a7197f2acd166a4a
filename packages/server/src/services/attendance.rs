use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::info;

use crate::entity::activity::ActivityKind;
use crate::entity::{enrollment, user};
use crate::error::AppError;
use crate::models::enrollment::{EnrollmentView, SetOutcomeRequest, validate_set_outcome};
use crate::models::shared::normalize_optional;
use crate::utils::activity::{find_activity, find_enrollment};

/// Admin-side mutations of attendance and competition outcomes.
pub struct AttendanceTracker<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AttendanceTracker<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Set the attended flag. Writing the stored value again is a no-op success.
    pub async fn set_attendance(
        &self,
        kind: ActivityKind,
        activity_id: i32,
        user_id: i32,
        attended: bool,
    ) -> Result<(), AppError> {
        find_activity(self.db, kind, activity_id).await?;
        let existing = find_enrollment(self.db, activity_id, user_id).await?;
        if existing.attended == attended {
            return Ok(());
        }

        let mut active: enrollment::ActiveModel = existing.into();
        active.attended = Set(attended);
        active.update(self.db).await?;

        info!(kind = ?kind, activity_id, user_id, attended, "Attendance updated");
        Ok(())
    }

    /// Partially update a competition outcome and return the merged roster view.
    pub async fn set_outcome(
        &self,
        activity_id: i32,
        user_id: i32,
        req: &SetOutcomeRequest,
    ) -> Result<EnrollmentView, AppError> {
        if req.is_empty() {
            return Err(AppError::NothingToUpdate);
        }
        validate_set_outcome(req)?;

        find_activity(self.db, ActivityKind::Competition, activity_id).await?;
        let existing = find_enrollment(self.db, activity_id, user_id).await?;

        let mut active: enrollment::ActiveModel = existing.into();
        if let Some(rank) = req.rank {
            active.rank = Set(rank);
        }
        if let Some(ref title) = req.project_title {
            active.project_title = Set(normalize_optional(title.clone()));
        }
        if let Some(ref description) = req.project_description {
            active.project_description = Set(normalize_optional(description.clone()));
        }
        if let Some(ref photo) = req.photo_ref {
            active.photo_ref = Set(normalize_optional(photo.clone()));
        }
        let updated = active.update(self.db).await?;

        let owner = user::Entity::find_by_id(user_id).one(self.db).await?;
        info!(activity_id, user_id, rank = ?updated.rank, "Competition outcome updated");
        Ok(EnrollmentView::new(updated, owner))
    }
}
