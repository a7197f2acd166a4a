use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionTrait,
};
use tracing::info;

use crate::entity::activity::{self, ActivityKind};
use crate::entity::enrollment;
use crate::error::AppError;
use crate::models::enrollment::{EnrollmentRef, MyActivity};
use crate::utils::activity::{find_activity, find_activity_for_update, occupancy_of};

/// Records which participants hold a seat in which activity.
pub struct EnrollmentLedger<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> EnrollmentLedger<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Admit `user_id` into the activity, enforcing uniqueness and capacity.
    ///
    /// The activity row is locked for the duration of the check-and-insert,
    /// so concurrent requests for the same activity are admitted one at a time.
    pub async fn enroll(
        &self,
        kind: ActivityKind,
        user_id: i32,
        activity_id: i32,
    ) -> Result<EnrollmentRef, AppError> {
        let txn = self.db.begin().await?;
        let activity = find_activity_for_update(&txn, kind, activity_id).await?;

        let existing = enrollment::Entity::find()
            .filter(enrollment::Column::ActivityId.eq(activity_id))
            .filter(enrollment::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::AlreadyEnrolled);
        }

        if activity.capacity > 0 {
            let occupancy = occupancy_of(&txn, activity_id).await?;
            if occupancy >= i64::from(activity.capacity) {
                return Err(AppError::CapacityExceeded);
            }
        }

        let model = enrollment::ActiveModel {
            user_id: Set(user_id),
            activity_id: Set(activity_id),
            enrolled_at: Set(Utc::now()),
            attended: Set(false),
            ..Default::default()
        };

        let created = model.insert(&txn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                tracing::debug!("Enrollment race: unique constraint caught on insert");
                AppError::AlreadyEnrolled
            }
            _ => AppError::from(e),
        })?;

        txn.commit().await?;
        info!(kind = ?kind, activity_id, user_id, "Enrolled");
        Ok(EnrollmentRef::new(&created, kind))
    }

    /// Remove the enrollment if present. Absent enrollments and absent
    /// activities are both success.
    pub async fn withdraw(
        &self,
        kind: ActivityKind,
        user_id: i32,
        activity_id: i32,
    ) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        let activity = match find_activity_for_update(&txn, kind, activity_id).await {
            Ok(activity) => activity,
            Err(AppError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };

        let res = enrollment::Entity::delete_many()
            .filter(enrollment::Column::ActivityId.eq(activity.id))
            .filter(enrollment::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        if res.rows_affected > 0 {
            info!(kind = ?kind, activity_id, user_id, "Withdrew");
        }
        Ok(())
    }

    /// The caller's enrollment in one activity, if any.
    pub async fn status(
        &self,
        kind: ActivityKind,
        user_id: i32,
        activity_id: i32,
    ) -> Result<Option<EnrollmentRef>, AppError> {
        let activity = find_activity(self.db, kind, activity_id).await?;
        let row = enrollment::Entity::find()
            .filter(enrollment::Column::ActivityId.eq(activity.id))
            .filter(enrollment::Column::UserId.eq(user_id))
            .one(self.db)
            .await?;
        Ok(row.map(|e| EnrollmentRef::new(&e, kind)))
    }

    /// Every activity of `kind` the user is enrolled in, newest enrollment first.
    pub async fn mine(&self, kind: ActivityKind, user_id: i32) -> Result<Vec<MyActivity>, AppError> {
        let rows = enrollment::Entity::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .find_also_related(activity::Entity)
            .filter(activity::Column::Kind.eq(kind))
            .order_by_desc(enrollment::Column::EnrolledAt)
            .order_by_desc(enrollment::Column::Id)
            .all(self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(e, a)| a.map(|a| MyActivity::new(e, a)))
            .collect())
    }
}
