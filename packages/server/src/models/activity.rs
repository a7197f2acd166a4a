use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_text_len, validate_title};
use crate::entity::activity::{self, ActivityKind};
use crate::error::AppError;

const MAX_DESCRIPTION_CHARS: usize = 20_000;
const MAX_TYPE_TAG_CHARS: usize = 64;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateActivityRequest {
    #[schema(example = "Intro to Rust")]
    pub title: String,
    pub description: Option<String>,
    /// Free-form category. Defaults to "Workshop" or "General" by kind.
    #[schema(example = "Hands-on")]
    pub type_tag: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Seat limit; 0 or omitted means unlimited.
    #[serde(default)]
    #[schema(example = 30)]
    pub capacity: i32,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateActivityRequest {
    pub title: Option<String>,
    /// Send `null` to clear the description.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub type_tag: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
}

impl UpdateActivityRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.type_tag.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.capacity.is_none()
    }
}

/// A stored activity decorated with its live occupancy.
#[derive(Serialize, Debug, Clone, utoipa::ToSchema)]
pub struct ActivityView {
    pub id: i32,
    pub kind: ActivityKind,
    pub title: String,
    pub description: Option<String>,
    pub type_tag: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Seat limit; 0 means unlimited.
    pub capacity: i32,
    /// Number of current enrollments.
    pub occupancy: i64,
    /// Open seats, or `null` when capacity is unlimited.
    pub remaining: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Open seats for a capacity and occupancy; `None` means unbounded.
pub fn remaining_seats(capacity: i32, occupancy: i64) -> Option<i64> {
    if capacity > 0 {
        Some((i64::from(capacity) - occupancy).max(0))
    } else {
        None
    }
}

impl ActivityView {
    pub fn new(m: activity::Model, occupancy: i64) -> Self {
        Self {
            remaining: remaining_seats(m.capacity, occupancy),
            id: m.id,
            kind: m.kind,
            title: m.title,
            description: m.description,
            type_tag: m.type_tag,
            start_time: m.start_time,
            end_time: m.end_time,
            capacity: m.capacity,
            occupancy,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn validate_capacity(capacity: i32) -> Result<(), AppError> {
    if capacity < 0 {
        return Err(AppError::Validation("Capacity must be >= 0".into()));
    }
    Ok(())
}

fn validate_type_tag(tag: &str) -> Result<(), AppError> {
    let tag = tag.trim();
    if tag.is_empty() || tag.chars().count() > MAX_TYPE_TAG_CHARS {
        return Err(AppError::Validation(format!(
            "Type tag must be 1-{MAX_TYPE_TAG_CHARS} characters"
        )));
    }
    Ok(())
}

/// Check that a schedule window is non-empty.
pub fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if end <= start {
        return Err(AppError::Validation(
            "end_time must be after start_time".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_activity(req: &CreateActivityRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    validate_text_len(req.description.as_deref(), "Description", MAX_DESCRIPTION_CHARS)?;
    if let Some(ref tag) = req.type_tag {
        validate_type_tag(tag)?;
    }
    validate_capacity(req.capacity)?;
    validate_window(req.start_time, req.end_time)
}

/// Field-level checks only; the schedule window is checked against stored values by the caller.
pub fn validate_update_activity(req: &UpdateActivityRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    if let Some(Some(ref description)) = req.description {
        validate_text_len(Some(description), "Description", MAX_DESCRIPTION_CHARS)?;
    }
    if let Some(ref tag) = req.type_tag {
        validate_type_tag(tag)?;
    }
    if let Some(capacity) = req.capacity {
        validate_capacity(capacity)?;
    }
    Ok(())
}
