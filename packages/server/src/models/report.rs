use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::activity::ActivityKind;

/// One enrollment in the cross-activity participants report.
#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct ParticipantRow {
    pub kind: ActivityKind,
    pub activity_id: i32,
    pub activity_title: String,
    pub type_tag: String,
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub enrolled_at: DateTime<Utc>,
    pub attended: bool,
    pub rank: Option<i32>,
    pub certificate_issued: bool,
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct ParticipantsReport {
    pub total: usize,
    pub workshop_enrollments: usize,
    pub competition_enrollments: usize,
    pub rows: Vec<ParticipantRow>,
}

impl ParticipantsReport {
    pub fn new(rows: Vec<ParticipantRow>) -> Self {
        let workshop_enrollments = rows
            .iter()
            .filter(|r| r.kind == ActivityKind::Workshop)
            .count();
        Self {
            total: rows.len(),
            competition_enrollments: rows.len() - workshop_enrollments,
            workshop_enrollments,
            rows,
        }
    }
}
