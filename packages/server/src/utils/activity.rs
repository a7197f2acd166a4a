use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, sea_query::LockType,
};

use crate::entity::activity::{self, ActivityKind};
use crate::entity::enrollment;
use crate::error::AppError;

fn not_found(kind: ActivityKind) -> AppError {
    AppError::NotFound(format!("{} not found", kind.label()))
}

/// Look up an activity of the given kind, returning 404 if absent or of the other kind.
pub async fn find_activity<C: ConnectionTrait>(
    db: &C,
    kind: ActivityKind,
    id: i32,
) -> Result<activity::Model, AppError> {
    activity::Entity::find_by_id(id)
        .filter(activity::Column::Kind.eq(kind))
        .one(db)
        .await?
        .ok_or_else(|| not_found(kind))
}

/// Same as [`find_activity`] but takes a row lock, serializing admissions per activity.
pub async fn find_activity_for_update<C: ConnectionTrait>(
    db: &C,
    kind: ActivityKind,
    id: i32,
) -> Result<activity::Model, AppError> {
    activity::Entity::find_by_id(id)
        .filter(activity::Column::Kind.eq(kind))
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| not_found(kind))
}

/// Look up a (user, activity) enrollment, returning 404 if the pair does not resolve.
pub async fn find_enrollment<C: ConnectionTrait>(
    db: &C,
    activity_id: i32,
    user_id: i32,
) -> Result<enrollment::Model, AppError> {
    enrollment::Entity::find()
        .filter(enrollment::Column::ActivityId.eq(activity_id))
        .filter(enrollment::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".into()))
}

/// Count enrollments for one activity.
pub async fn occupancy_of<C: ConnectionTrait>(db: &C, activity_id: i32) -> Result<i64, AppError> {
    Ok(occupancy_map(db, &[activity_id])
        .await?
        .get(&activity_id)
        .copied()
        .unwrap_or(0))
}

/// Count enrollments for many activities with one grouped query.
/// Activities without enrollments are absent from the map.
pub async fn occupancy_map<C: ConnectionTrait>(
    db: &C,
    activity_ids: &[i32],
) -> Result<HashMap<i32, i64>, AppError> {
    if activity_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, i64)> = enrollment::Entity::find()
        .select_only()
        .column(enrollment::Column::ActivityId)
        .column_as(enrollment::Column::Id.count(), "count")
        .filter(enrollment::Column::ActivityId.is_in(activity_ids.iter().copied()))
        .group_by(enrollment::Column::ActivityId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows.into_iter().collect())
}
