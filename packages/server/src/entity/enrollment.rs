use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrollment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    // (user_id, activity_id) is unique; see `seed::ensure_indexes`.
    #[sea_orm(indexed)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    #[sea_orm(indexed)]
    pub activity_id: i32,
    #[sea_orm(belongs_to, from = "activity_id", to = "id")]
    pub activity: HasOne<super::activity::Entity>,

    pub enrolled_at: DateTimeUtc,

    #[sea_orm(default_value = false)]
    pub attended: bool,

    // Competition outcome. Always NULL for workshops.
    pub rank: Option<i32>,
    pub project_title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub project_description: Option<String>,
    pub photo_ref: Option<String>,

    /// Written once, the first time a certificate is requested after attendance.
    #[sea_orm(unique)]
    pub certificate_code: Option<Uuid>,
    pub certificate_issued_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
