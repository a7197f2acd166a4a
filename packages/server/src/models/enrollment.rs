use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_text_len};
use crate::entity::activity::ActivityKind;
use crate::entity::{activity, enrollment, user};
use crate::error::AppError;

/// A participant's enrollment as seen by the participant.
#[derive(Serialize, Debug, Clone, utoipa::ToSchema)]
pub struct EnrollmentRef {
    pub id: i32,
    pub user_id: i32,
    pub activity_id: i32,
    pub kind: ActivityKind,
    pub enrolled_at: DateTime<Utc>,
    pub attended: bool,
    /// Whether a certificate code has been issued.
    pub certificate_issued: bool,
}

impl EnrollmentRef {
    pub fn new(m: &enrollment::Model, kind: ActivityKind) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            activity_id: m.activity_id,
            kind,
            enrolled_at: m.enrolled_at,
            attended: m.attended,
            certificate_issued: m.certificate_code.is_some(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EnrollmentStatusResponse {
    pub enrolled: bool,
    pub enrollment: Option<EnrollmentRef>,
}

/// One of the caller's own activities.
#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct MyActivity {
    pub activity_id: i32,
    pub kind: ActivityKind,
    pub title: String,
    pub type_tag: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub enrolled_at: DateTime<Utc>,
    pub attended: bool,
    pub rank: Option<i32>,
    pub certificate_issued: bool,
}

impl MyActivity {
    pub fn new(e: enrollment::Model, a: activity::Model) -> Self {
        Self {
            activity_id: a.id,
            kind: a.kind,
            title: a.title,
            type_tag: a.type_tag,
            start_time: a.start_time,
            end_time: a.end_time,
            enrolled_at: e.enrolled_at,
            attended: e.attended,
            rank: e.rank,
            certificate_issued: e.certificate_code.is_some(),
        }
    }
}

/// Enrollment joined with the owner's public profile, for administrators.
#[derive(Serialize, Debug, Clone, utoipa::ToSchema)]
pub struct EnrollmentView {
    pub enrollment_id: i32,
    pub activity_id: i32,
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub enrolled_at: DateTime<Utc>,
    pub attended: bool,
    pub rank: Option<i32>,
    pub project_title: Option<String>,
    pub project_description: Option<String>,
    pub photo_ref: Option<String>,
    pub certificate_issued_at: Option<DateTime<Utc>>,
}

impl EnrollmentView {
    pub fn new(e: enrollment::Model, u: Option<user::Model>) -> Self {
        let (name, email) = u.map(|u| (u.name, u.email)).unwrap_or_default();
        Self {
            enrollment_id: e.id,
            activity_id: e.activity_id,
            user_id: e.user_id,
            name,
            email,
            enrolled_at: e.enrolled_at,
            attended: e.attended,
            rank: e.rank,
            project_title: e.project_title,
            project_description: e.project_description,
            photo_ref: e.photo_ref,
            certificate_issued_at: e.certificate_issued_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetAttendanceRequest {
    pub attended: bool,
}

/// Partial update of a competition outcome. Absent fields are untouched,
/// `null` clears the stored value.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct SetOutcomeRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>, minimum = 1)]
    pub rank: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub project_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub project_description: Option<Option<String>>,
    /// Reference to an uploaded photo (URL or storage key).
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub photo_ref: Option<Option<String>>,
}

impl SetOutcomeRequest {
    pub fn is_empty(&self) -> bool {
        self.rank.is_none()
            && self.project_title.is_none()
            && self.project_description.is_none()
            && self.photo_ref.is_none()
    }
}

pub fn validate_set_outcome(req: &SetOutcomeRequest) -> Result<(), AppError> {
    if let Some(Some(rank)) = req.rank
        && rank < 1
    {
        return Err(AppError::Validation("Rank must be >= 1".into()));
    }
    if let Some(Some(ref title)) = req.project_title {
        validate_text_len(Some(title), "Project title", 256)?;
    }
    if let Some(Some(ref description)) = req.project_description {
        validate_text_len(Some(description), "Project description", 20_000)?;
    }
    if let Some(Some(ref photo)) = req.photo_ref {
        validate_text_len(Some(photo), "Photo reference", 1024)?;
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ResultsQuery {
    /// Restrict to one competition.
    pub competition_id: Option<i32>,
}

/// A ranked entry in public competition results. Carries no contact data.
#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct ResultEntry {
    pub rank: i32,
    pub user_id: i32,
    pub name: String,
    pub project_title: Option<String>,
    pub project_description: Option<String>,
    pub photo_ref: Option<String>,
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct CompetitionResults {
    pub competition_id: i32,
    pub title: String,
    pub type_tag: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub results: Vec<ResultEntry>,
}
