use sea_orm::entity::prelude::*;
use sea_orm::prelude::StringLen;
use serde::{Deserialize, Serialize};

/// The two kinds of schedulable activity. Both share one table and every
/// query is scoped to a single kind.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    #[sea_orm(string_value = "workshop")]
    Workshop,
    #[sea_orm(string_value = "competition")]
    Competition,
}

impl ActivityKind {
    /// Order in which certificate lookups visit the kinds.
    pub const SCAN_ORDER: [ActivityKind; 2] = [ActivityKind::Workshop, ActivityKind::Competition];

    /// Human-readable label ("Workshop", "Competition").
    pub fn label(self) -> &'static str {
        match self {
            ActivityKind::Workshop => "Workshop",
            ActivityKind::Competition => "Competition",
        }
    }

    /// Type tag stored when the creator does not supply one.
    pub fn default_type_tag(self) -> &'static str {
        match self {
            ActivityKind::Workshop => "Workshop",
            ActivityKind::Competition => "General",
        }
    }
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub kind: ActivityKind,

    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub type_tag: String,

    pub start_time: DateTimeUtc,
    pub end_time: DateTimeUtc,

    /// Maximum number of enrollments; 0 means unlimited.
    #[sea_orm(default_value = 0)]
    pub capacity: i32,

    #[sea_orm(has_many)]
    pub enrollments: HasMany<super::enrollment::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
