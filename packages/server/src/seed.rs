use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::config::SeedConfig;
use crate::entity::{activity, enrollment, role, role_permission, user};
use crate::models::auth::normalize_email;
use crate::utils::hash;

/// Default roles seeded on startup.
const DEFAULT_ROLES: &[&str] = &[role::ADMIN_ROLE, role::DEFAULT_ROLE];

/// Default role-permission mappings seeded on startup.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    // Admin: all permissions
    ("admin", "activity:create"),
    ("admin", "activity:manage"),
    ("admin", "activity:delete"),
    ("admin", "enrollment:manage"),
    ("admin", "report:view"),
    ("admin", "enrollment:self"),
    // Visitor
    ("visitor", "enrollment:self"),
];

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut roles_inserted = 0u32;
    for &name in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(
                OnConflict::column(role::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) => roles_inserted += n as u32,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    let mut perms_inserted = 0u32;
    for &(role, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) => perms_inserted += n as u32,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

/// Ensure composite indexes that schema sync cannot declare.
///
/// The unique `(user_id, activity_id)` index backs enrollment uniqueness, so
/// failing to create it aborts startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name("uq_enrollment_user_activity")
        .table(enrollment::Entity)
        .col(enrollment::Column::UserId)
        .col(enrollment::Column::ActivityId)
        .to_string(PostgresQueryBuilder);
    db.execute_unprepared(&stmt).await?;
    info!("Ensured index uq_enrollment_user_activity exists");

    // Listing query: WHERE kind = ? ORDER BY start_time DESC, id DESC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_activity_kind_start")
        .table(activity::Entity)
        .col(activity::Column::Kind)
        .col(activity::Column::StartTime)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_activity_kind_start exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_activity_kind_start: {}", e);
        }
    }

    Ok(())
}

/// Create the configured bootstrap administrator if it does not exist yet.
pub async fn ensure_bootstrap_admin(db: &DatabaseConnection, seed: &SeedConfig) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&seed.admin_email, &seed.admin_password) else {
        return Ok(());
    };
    let email = normalize_email(email);

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let hash = hash::hash_password(password)
        .map_err(|e| anyhow::anyhow!("Password hash error: {e}"))?;
    let admin = user::ActiveModel {
        name: Set(seed
            .admin_name
            .clone()
            .unwrap_or_else(|| "Administrator".to_string())),
        email: Set(email.clone()),
        password: Set(hash),
        role: Set(role::ADMIN_ROLE.to_string()),
        identity_secret: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    admin.insert(db).await?;
    info!(email = %email, "Bootstrap administrator created");
    Ok(())
}
