//! SeaORM implementation of LocationRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::{db_err, from_count, from_minor, parse_id, to_count, to_minor, violation, Violation};
use crate::domain::{
    DomainError, DomainResult, Location, LocationKind, LocationQuery, LocationRepository,
};
use crate::infrastructure::database::entities::location;

pub struct SeaOrmLocationRepository {
    db: DatabaseConnection,
}

impl SeaOrmLocationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn kind_to_entity(kind: LocationKind) -> location::Kind {
    match kind {
        LocationKind::Parking => location::Kind::Parking,
        LocationKind::Ev => location::Kind::Ev,
    }
}

fn kind_to_domain(kind: location::Kind) -> LocationKind {
    match kind {
        location::Kind::Parking => LocationKind::Parking,
        location::Kind::Ev => LocationKind::Ev,
    }
}

pub(crate) fn model_to_domain(m: location::Model) -> DomainResult<Location> {
    let total_slots = to_count(m.total_slots);
    Ok(Location {
        id: parse_id("Location", &m.id)?,
        owner_id: m
            .owner_id
            .as_deref()
            .map(|raw| parse_id("Location owner", raw))
            .transpose()?,
        name: m.name,
        address: m.address,
        city: m.city,
        kind: kind_to_domain(m.kind),
        price_per_hour: from_minor(m.price_per_hour),
        total_slots,
        available_slots: to_count(m.available_slots).min(total_slots),
        description: m.description,
        image_url: m.image_url,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn domain_to_active(l: Location) -> DomainResult<location::ActiveModel> {
    Ok(location::ActiveModel {
        id: Set(l.id.to_string()),
        owner_id: Set(l.owner_id.map(|id| id.to_string())),
        name: Set(l.name),
        address: Set(l.address),
        city: Set(l.city),
        kind: Set(kind_to_entity(l.kind)),
        price_per_hour: Set(to_minor(l.price_per_hour)?),
        total_slots: Set(from_count(l.total_slots)),
        available_slots: Set(from_count(l.available_slots)),
        description: Set(l.description),
        image_url: Set(l.image_url),
        created_at: Set(l.created_at),
        updated_at: Set(l.updated_at),
    })
}

// ── LocationRepository impl ─────────────────────────────────────

#[async_trait]
impl LocationRepository for SeaOrmLocationRepository {
    async fn insert(&self, l: Location) -> DomainResult<()> {
        debug!("Inserting location: {} ({})", l.id, l.name);
        let id = l.id;
        domain_to_active(l)?
            .insert(&self.db)
            .await
            .map_err(|e| match violation(&e) {
                Some(Violation::Unique) => {
                    DomainError::Conflict(format!("Location {id} already exists"))
                }
                Some(Violation::ForeignKey) => {
                    DomainError::Validation("Location owner does not exist".into())
                }
                None => db_err(e),
            })?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Location>> {
        location::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn update(&self, l: Location) -> DomainResult<()> {
        debug!("Updating location: {}", l.id);

        let existing = location::Entity::find_by_id(l.id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        if existing.is_none() {
            return Err(DomainError::not_found("Location", l.id));
        }

        domain_to_active(l)?.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn set_available_slots(&self, id: Uuid, available_slots: u32) -> DomainResult<()> {
        let result = location::Entity::update_many()
            .col_expr(
                location::Column::AvailableSlots,
                Expr::value(from_count(available_slots)),
            )
            .col_expr(location::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(location::Column::Id.eq(id.to_string()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Location", id));
        }
        Ok(())
    }

    async fn list(&self, query: LocationQuery) -> DomainResult<Vec<Location>> {
        let mut select = location::Entity::find();
        if let Some(kind) = query.kind {
            select = select.filter(location::Column::Kind.eq(kind_to_entity(kind)));
        }
        if let Some(owner_id) = query.owner_id {
            select = select.filter(location::Column::OwnerId.eq(owner_id.to_string()));
        }

        let models = select
            .order_by_desc(location::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        // City and free-text matching are case-insensitive; done here so
        // SQLite and PostgreSQL agree.
        let mut rows = Vec::with_capacity(models.len());
        for m in models {
            let l = model_to_domain(m)?;
            if l.matches(&query) {
                rows.push(l);
            }
        }
        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let result = location::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(|e| match violation(&e) {
                Some(Violation::ForeignKey) => {
                    DomainError::Conflict(format!("Location {id} still has bookings"))
                }
                _ => db_err(e),
            })?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Location", id));
        }
        Ok(())
    }

    async fn count(&self) -> DomainResult<u64> {
        location::Entity::find()
            .count(&self.db)
            .await
            .map_err(db_err)
    }
}
