//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use uuid::Uuid;

use super::{db_err, parse_id, violation, Violation};
use crate::domain::profile::normalize_email;
use crate::domain::{
    ApprovalStatus, DomainError, DomainResult, OwnerProfile, ProfileQuery, UserProfile,
    UserRepository, UserRole,
};
use crate::infrastructure::database::entities::{owner_profile, user};

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn role_to_entity(role: UserRole) -> user::Role {
    match role {
        UserRole::User => user::Role::User,
        UserRole::Owner => user::Role::Owner,
        UserRole::Admin => user::Role::Admin,
    }
}

fn role_to_domain(role: user::Role) -> UserRole {
    match role {
        user::Role::User => UserRole::User,
        user::Role::Owner => UserRole::Owner,
        user::Role::Admin => UserRole::Admin,
    }
}

fn approval_to_entity(status: ApprovalStatus) -> user::Approval {
    match status {
        ApprovalStatus::None => user::Approval::None,
        ApprovalStatus::Pending => user::Approval::Pending,
        ApprovalStatus::Approved => user::Approval::Approved,
        ApprovalStatus::Rejected => user::Approval::Rejected,
    }
}

fn approval_to_domain(status: user::Approval) -> ApprovalStatus {
    match status {
        user::Approval::None => ApprovalStatus::None,
        user::Approval::Pending => ApprovalStatus::Pending,
        user::Approval::Approved => ApprovalStatus::Approved,
        user::Approval::Rejected => ApprovalStatus::Rejected,
    }
}

fn model_to_domain(m: user::Model) -> DomainResult<UserProfile> {
    Ok(UserProfile {
        id: parse_id("User", &m.id)?,
        email: m.email,
        name: m.name,
        role: role_to_domain(m.role),
        approval_status: approval_to_domain(m.approval_status),
        password_hash: m.password_hash,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn owner_to_domain(m: owner_profile::Model) -> DomainResult<OwnerProfile> {
    Ok(OwnerProfile {
        id: parse_id("Owner profile", &m.id)?,
        company_name: m.company_name,
        city: m.city,
        created_at: m.created_at,
    })
}

fn email_conflict(e: sea_orm::DbErr) -> DomainError {
    match violation(&e) {
        Some(Violation::Unique) => DomainError::Conflict("Email already exists".into()),
        _ => db_err(e),
    }
}

fn filtered(query: &ProfileQuery) -> Select<user::Entity> {
    let mut select = user::Entity::find();
    if let Some(role) = query.role {
        select = select.filter(user::Column::Role.eq(role_to_entity(role)));
    }
    if let Some(status) = query.approval_status {
        select = select.filter(user::Column::ApprovalStatus.eq(approval_to_entity(status)));
    }
    select
}

// ── UserRepository impl ─────────────────────────────────────────

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn create(&self, p: UserProfile) -> DomainResult<()> {
        debug!("Creating user: {} ({})", p.id, p.role);
        user::ActiveModel {
            id: Set(p.id.to_string()),
            email: Set(normalize_email(&p.email)),
            name: Set(p.name),
            role: Set(role_to_entity(p.role)),
            approval_status: Set(approval_to_entity(p.approval_status)),
            password_hash: Set(p.password_hash),
            created_at: Set(p.created_at),
            updated_at: Set(p.updated_at),
        }
        .insert(&self.db)
        .await
        .map_err(email_conflict)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<UserProfile>> {
        user::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<UserProfile>> {
        user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn update(&self, p: UserProfile) -> DomainResult<()> {
        debug!("Updating user: {}", p.id);
        let result = user::Entity::update_many()
            .col_expr(user::Column::Email, Expr::value(normalize_email(&p.email)))
            .col_expr(user::Column::Name, Expr::value(p.name))
            .col_expr(user::Column::Role, Expr::value(role_to_entity(p.role)))
            .col_expr(
                user::Column::ApprovalStatus,
                Expr::value(approval_to_entity(p.approval_status)),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(p.id.to_string()))
            .exec(&self.db)
            .await
            .map_err(email_conflict)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("User", p.id));
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> DomainResult<()> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id.to_string()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("User", id));
        }
        Ok(())
    }

    async fn set_role(
        &self,
        id: Uuid,
        role: UserRole,
        approval_status: ApprovalStatus,
    ) -> DomainResult<()> {
        debug!("Setting role for {}: {} / {}", id, role, approval_status.as_str());
        let result = user::Entity::update_many()
            .col_expr(user::Column::Role, Expr::value(role_to_entity(role)))
            .col_expr(
                user::Column::ApprovalStatus,
                Expr::value(approval_to_entity(approval_status)),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id.to_string()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("User", id));
        }
        Ok(())
    }

    /// Bookings and the owner profile follow through `ON DELETE CASCADE`.
    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let result = user::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("User", id));
        }
        Ok(())
    }

    async fn list(&self, query: ProfileQuery) -> DomainResult<Vec<UserProfile>> {
        filtered(&query)
            .order_by_desc(user::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(model_to_domain)
            .collect()
    }

    async fn count(&self, query: ProfileQuery) -> DomainResult<u64> {
        filtered(&query).count(&self.db).await.map_err(db_err)
    }

    async fn create_owner_profile(&self, p: OwnerProfile) -> DomainResult<()> {
        let user_id = p.id;
        let model = owner_profile::ActiveModel {
            id: Set(p.id.to_string()),
            company_name: Set(p.company_name),
            city: Set(p.city),
            created_at: Set(p.created_at),
        };
        owner_profile::Entity::insert(model)
            .on_conflict(
                OnConflict::column(owner_profile::Column::Id)
                    .update_columns([owner_profile::Column::CompanyName, owner_profile::Column::City])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| match violation(&e) {
                Some(Violation::ForeignKey) => DomainError::MissingProfile { user_id },
                _ => db_err(e),
            })?;
        Ok(())
    }

    async fn find_owner_profile(&self, id: Uuid) -> DomainResult<Option<OwnerProfile>> {
        owner_profile::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(owner_to_domain)
            .transpose()
    }

    async fn delete_owner_profile(&self, id: Uuid) -> DomainResult<()> {
        owner_profile::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
