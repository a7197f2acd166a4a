use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

use crate::entity::activity::{self, ActivityKind};
use crate::entity::{enrollment, user};
use crate::error::AppError;
use crate::models::activity::{
    ActivityView, CreateActivityRequest, UpdateActivityRequest, validate_window,
};
use crate::models::enrollment::{CompetitionResults, EnrollmentView, ResultEntry};
use crate::models::report::{ParticipantRow, ParticipantsReport};
use crate::models::shared::normalize_optional;
use crate::utils::activity::{find_activity, find_activity_for_update, occupancy_map, occupancy_of};

/// Catalog of workshops and competitions with live occupancy.
pub struct ActivityDirectory<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ActivityDirectory<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// All activities of `kind`, most recently scheduled first.
    pub async fn list(&self, kind: ActivityKind) -> Result<Vec<ActivityView>, AppError> {
        let rows = activity::Entity::find()
            .filter(activity::Column::Kind.eq(kind))
            .order_by_desc(activity::Column::StartTime)
            .order_by_desc(activity::Column::Id)
            .all(self.db)
            .await?;

        let ids: Vec<i32> = rows.iter().map(|a| a.id).collect();
        let counts = occupancy_map(self.db, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|a| {
                let occupancy = counts.get(&a.id).copied().unwrap_or(0);
                ActivityView::new(a, occupancy)
            })
            .collect())
    }

    pub async fn get(&self, kind: ActivityKind, id: i32) -> Result<ActivityView, AppError> {
        let model = find_activity(self.db, kind, id).await?;
        let occupancy = occupancy_of(self.db, id).await?;
        Ok(ActivityView::new(model, occupancy))
    }

    pub async fn create(
        &self,
        kind: ActivityKind,
        req: &CreateActivityRequest,
    ) -> Result<ActivityView, AppError> {
        let now = Utc::now();
        let type_tag = normalize_optional(req.type_tag.clone())
            .unwrap_or_else(|| kind.default_type_tag().to_string());

        let model = activity::ActiveModel {
            kind: Set(kind),
            title: Set(req.title.trim().to_string()),
            description: Set(normalize_optional(req.description.clone())),
            type_tag: Set(type_tag),
            start_time: Set(req.start_time),
            end_time: Set(req.end_time),
            capacity: Set(req.capacity),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model.insert(self.db).await?;
        info!(kind = ?kind, activity_id = created.id, "Activity created");
        Ok(ActivityView::new(created, 0))
    }

    /// Apply a partial update. The schedule window is validated against the
    /// merged values. Lowering capacity below current occupancy is allowed;
    /// it only blocks further admissions.
    pub async fn update(
        &self,
        kind: ActivityKind,
        id: i32,
        req: &UpdateActivityRequest,
    ) -> Result<ActivityView, AppError> {
        if req.is_empty() {
            return Err(AppError::NothingToUpdate);
        }

        let txn = self.db.begin().await?;
        let existing = find_activity_for_update(&txn, kind, id).await?;

        let start = req.start_time.unwrap_or(existing.start_time);
        let end = req.end_time.unwrap_or(existing.end_time);
        validate_window(start, end)?;

        let mut active: activity::ActiveModel = existing.into();
        if let Some(ref title) = req.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(ref description) = req.description {
            active.description = Set(normalize_optional(description.clone()));
        }
        if let Some(ref tag) = req.type_tag {
            active.type_tag = Set(tag.trim().to_string());
        }
        if req.start_time.is_some() {
            active.start_time = Set(start);
        }
        if req.end_time.is_some() {
            active.end_time = Set(end);
        }
        if let Some(capacity) = req.capacity {
            active.capacity = Set(capacity);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await?;
        let occupancy = occupancy_of(&txn, id).await?;
        txn.commit().await?;

        info!(kind = ?kind, activity_id = id, "Activity updated");
        Ok(ActivityView::new(updated, occupancy))
    }

    /// Remove the activity and all of its enrollments in one transaction.
    pub async fn delete(&self, kind: ActivityKind, id: i32) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        find_activity_for_update(&txn, kind, id).await?;

        let removed = enrollment::Entity::delete_many()
            .filter(enrollment::Column::ActivityId.eq(id))
            .exec(&txn)
            .await?;
        activity::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        info!(
            kind = ?kind,
            activity_id = id,
            enrollments_removed = removed.rows_affected,
            "Activity deleted"
        );
        Ok(())
    }

    /// Roster of one activity, newest enrollment first.
    pub async fn enrollees(
        &self,
        kind: ActivityKind,
        id: i32,
    ) -> Result<Vec<EnrollmentView>, AppError> {
        find_activity(self.db, kind, id).await?;

        let rows = enrollment::Entity::find()
            .filter(enrollment::Column::ActivityId.eq(id))
            .find_also_related(user::Entity)
            .order_by_desc(enrollment::Column::EnrolledAt)
            .order_by_desc(enrollment::Column::Id)
            .all(self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(e, u)| EnrollmentView::new(e, u))
            .collect())
    }

    /// Public ranked results, one block per competition, newest competition first.
    pub async fn results(
        &self,
        competition_id: Option<i32>,
    ) -> Result<Vec<CompetitionResults>, AppError> {
        let competitions = match competition_id {
            Some(id) => vec![find_activity(self.db, ActivityKind::Competition, id).await?],
            None => {
                activity::Entity::find()
                    .filter(activity::Column::Kind.eq(ActivityKind::Competition))
                    .order_by_desc(activity::Column::StartTime)
                    .order_by_desc(activity::Column::Id)
                    .all(self.db)
                    .await?
            }
        };
        if competitions.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = competitions.iter().map(|c| c.id).collect();
        let ranked = enrollment::Entity::find()
            .filter(enrollment::Column::ActivityId.is_in(ids))
            .filter(enrollment::Column::Rank.is_not_null())
            .find_also_related(user::Entity)
            .order_by_asc(enrollment::Column::Rank)
            .order_by_asc(enrollment::Column::EnrolledAt)
            .all(self.db)
            .await?;

        let mut by_competition: HashMap<i32, Vec<ResultEntry>> = HashMap::new();
        for (e, u) in ranked {
            let Some(rank) = e.rank else { continue };
            by_competition
                .entry(e.activity_id)
                .or_default()
                .push(ResultEntry {
                    rank,
                    user_id: e.user_id,
                    name: u.map(|u| u.name).unwrap_or_default(),
                    project_title: e.project_title,
                    project_description: e.project_description,
                    photo_ref: e.photo_ref,
                });
        }

        Ok(competitions
            .into_iter()
            .map(|c| CompetitionResults {
                results: by_competition.remove(&c.id).unwrap_or_default(),
                competition_id: c.id,
                title: c.title,
                type_tag: c.type_tag,
                start_time: c.start_time,
                end_time: c.end_time,
            })
            .collect())
    }

    /// Every enrollment across both kinds, oldest first.
    pub async fn participants_report(&self) -> Result<ParticipantsReport, AppError> {
        let activities: HashMap<i32, activity::Model> = activity::Entity::find()
            .all(self.db)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let rows = enrollment::Entity::find()
            .find_also_related(user::Entity)
            .order_by_asc(enrollment::Column::EnrolledAt)
            .order_by_asc(enrollment::Column::Id)
            .all(self.db)
            .await?;

        let rows = rows
            .into_iter()
            .filter_map(|(e, u)| {
                let a = activities.get(&e.activity_id)?;
                let (name, email) = u.map(|u| (u.name, u.email)).unwrap_or_default();
                Some(ParticipantRow {
                    kind: a.kind,
                    activity_id: a.id,
                    activity_title: a.title.clone(),
                    type_tag: a.type_tag.clone(),
                    user_id: e.user_id,
                    name,
                    email,
                    enrolled_at: e.enrolled_at,
                    attended: e.attended,
                    rank: e.rank,
                    certificate_issued: e.certificate_code.is_some(),
                })
            })
            .collect();

        Ok(ParticipantsReport::new(rows))
    }
}
