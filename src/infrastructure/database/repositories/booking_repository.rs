//! SeaORM implementation of BookingRepository
//!
//! Provides the atomic `create_booking` procedure: the insert and the
//! availability recompute of its location commit together.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{db_err, from_count, from_minor, parse_id, to_count, to_minor, violation, Violation};
use crate::application::services::compute_available;
use crate::domain::{
    Booking, BookingDetails, BookingRepository, BookingStatus, CreatedBooking, DomainError,
    DomainResult, SlotId,
};
use crate::infrastructure::database::entities::{booking, location, user};

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn status_to_entity(status: BookingStatus) -> booking::Status {
    match status {
        BookingStatus::Scheduled => booking::Status::Scheduled,
        BookingStatus::Started => booking::Status::Started,
        BookingStatus::Completed => booking::Status::Completed,
        BookingStatus::Cancelled => booking::Status::Cancelled,
    }
}

fn status_to_domain(status: booking::Status) -> BookingStatus {
    match status {
        booking::Status::Scheduled => BookingStatus::Scheduled,
        booking::Status::Started => BookingStatus::Started,
        booking::Status::Completed => BookingStatus::Completed,
        booking::Status::Cancelled => BookingStatus::Cancelled,
    }
}

fn active_statuses() -> [booking::Status; 2] {
    BookingStatus::ACTIVE.map(status_to_entity)
}

fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    let selected_slot = SlotId::parse(&m.selected_slot).ok_or_else(|| {
        DomainError::Storage(format!("Booking {} has no slot", m.id))
    })?;
    Ok(Booking {
        id: parse_id("Booking", &m.id)?,
        location_id: parse_id("Booking location", &m.location_id)?,
        user_id: parse_id("Booking user", &m.user_id)?,
        selected_slot,
        start_time: m.start_time,
        end_time: m.end_time,
        duration_hours: to_count(m.duration_hours),
        amount: from_minor(m.amount),
        status: status_to_domain(m.status),
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn domain_to_active(b: &Booking) -> DomainResult<booking::ActiveModel> {
    Ok(booking::ActiveModel {
        id: Set(b.id.to_string()),
        location_id: Set(b.location_id.to_string()),
        user_id: Set(b.user_id.to_string()),
        selected_slot: Set(b.selected_slot.to_string()),
        start_time: Set(b.start_time),
        end_time: Set(b.end_time),
        duration_hours: Set(from_count(b.duration_hours)),
        amount: Set(to_minor(b.amount)?),
        status: Set(status_to_entity(b.status)),
        created_at: Set(b.created_at),
        updated_at: Set(b.updated_at),
    })
}

fn slot_taken(b: &Booking) -> DomainError {
    DomainError::SlotTaken {
        location_id: b.location_id,
        slot: b.selected_slot.to_string(),
    }
}

/// Reference checks and insert, on a plain connection or a transaction.
async fn insert_on<C: ConnectionTrait>(conn: &C, b: &Booking) -> DomainResult<()> {
    let has_user = user::Entity::find_by_id(b.user_id.to_string())
        .count(conn)
        .await
        .map_err(db_err)?
        > 0;
    if !has_user {
        return Err(DomainError::MissingProfile { user_id: b.user_id });
    }
    let has_location = location::Entity::find_by_id(b.location_id.to_string())
        .count(conn)
        .await
        .map_err(db_err)?
        > 0;
    if !has_location {
        return Err(DomainError::MissingLocation(b.location_id));
    }

    domain_to_active(b)?
        .insert(conn)
        .await
        .map_err(|e| match violation(&e) {
            Some(Violation::Unique) => slot_taken(b),
            Some(Violation::ForeignKey) => DomainError::MissingLocation(b.location_id),
            None => db_err(e),
        })?;
    Ok(())
}

async fn count_active_on<C: ConnectionTrait>(conn: &C, location_id: Uuid) -> DomainResult<u64> {
    booking::Entity::find()
        .filter(booking::Column::LocationId.eq(location_id.to_string()))
        .filter(booking::Column::Status.is_in(active_statuses()))
        .count(conn)
        .await
        .map_err(db_err)
}

impl SeaOrmBookingRepository {
    /// Attach location and user names for listings.
    async fn with_details(&self, models: Vec<booking::Model>) -> DomainResult<Vec<BookingDetails>> {
        let location_ids: BTreeSet<String> = models.iter().map(|m| m.location_id.clone()).collect();
        let user_ids: BTreeSet<String> = models.iter().map(|m| m.user_id.clone()).collect();

        let locations: HashMap<String, String> = if location_ids.is_empty() {
            HashMap::new()
        } else {
            location::Entity::find()
                .filter(location::Column::Id.is_in(location_ids))
                .all(&self.db)
                .await
                .map_err(db_err)?
                .into_iter()
                .map(|l| (l.id, l.name))
                .collect()
        };
        let users: HashMap<String, (String, String)> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            user::Entity::find()
                .filter(user::Column::Id.is_in(user_ids))
                .all(&self.db)
                .await
                .map_err(db_err)?
                .into_iter()
                .map(|u| (u.id, (u.name, u.email)))
                .collect()
        };

        models
            .into_iter()
            .map(|m| {
                let location_name = locations.get(&m.location_id).cloned();
                let (user_name, user_email) = match users.get(&m.user_id) {
                    Some((name, email)) => (Some(name.clone()), Some(email.clone())),
                    None => (None, None),
                };
                Ok(BookingDetails {
                    booking: model_to_domain(m)?,
                    location_name,
                    user_name,
                    user_email,
                })
            })
            .collect()
    }
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn insert(&self, b: Booking) -> DomainResult<()> {
        debug!("Inserting booking: {} slot={}", b.id, b.selected_slot);
        insert_on(&self.db, &b).await
    }

    async fn create_and_reconcile(&self, b: Booking) -> DomainResult<CreatedBooking> {
        debug!("create_booking: {} slot={}", b.id, b.selected_slot);
        let txn = self.db.begin().await.map_err(db_err)?;

        insert_on(&txn, &b).await?;

        let active = count_active_on(&txn, b.location_id).await?;
        let loc = location::Entity::find_by_id(b.location_id.to_string())
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::MissingLocation(b.location_id))?;
        let available_slots = compute_available(to_count(loc.total_slots), active);

        location::Entity::update_many()
            .col_expr(
                location::Column::AvailableSlots,
                Expr::value(from_count(available_slots)),
            )
            .col_expr(location::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(location::Column::Id.eq(loc.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        info!(
            "Booking {} stored; location {} now has {} available",
            b.id, b.location_id, available_slots
        );
        Ok(CreatedBooking {
            booking: b,
            available_slots,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>> {
        booking::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> DomainResult<()> {
        let existing = booking::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Booking", id))?;
        let current = model_to_domain(existing)?;

        let mut model = domain_to_active(&current)?;
        model.status = Set(status_to_entity(status));
        model.updated_at = Set(Utc::now());
        model
            .update(&self.db)
            .await
            .map_err(|e| match violation(&e) {
                Some(Violation::Unique) => slot_taken(&current),
                _ => db_err(e),
            })?;
        Ok(())
    }

    async fn occupied_slots(&self, location_id: Uuid) -> DomainResult<Vec<Option<String>>> {
        let slots: Vec<String> = booking::Entity::find()
            .select_only()
            .column(booking::Column::SelectedSlot)
            .filter(booking::Column::LocationId.eq(location_id.to_string()))
            .filter(booking::Column::Status.is_in(active_statuses()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(slots.into_iter().map(Some).collect())
    }

    async fn count_active(&self, location_id: Uuid) -> DomainResult<u64> {
        count_active_on(&self.db, location_id).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<BookingDetails>> {
        let models = booking::Entity::find()
            .filter(booking::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(booking::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        self.with_details(models).await
    }

    async fn list_for_locations(&self, location_ids: &[Uuid]) -> DomainResult<Vec<BookingDetails>> {
        if location_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = booking::Entity::find()
            .filter(
                booking::Column::LocationId
                    .is_in(location_ids.iter().map(Uuid::to_string)),
            )
            .order_by_desc(booking::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        self.with_details(models).await
    }

    async fn list_all(&self, status: Option<BookingStatus>) -> DomainResult<Vec<BookingDetails>> {
        let mut select = booking::Entity::find();
        if let Some(status) = status {
            select = select.filter(booking::Column::Status.eq(status_to_entity(status)));
        }
        let models = select
            .order_by_desc(booking::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        self.with_details(models).await
    }

    async fn delete_for_locations(&self, location_ids: &[Uuid]) -> DomainResult<u64> {
        if location_ids.is_empty() {
            return Ok(0);
        }
        let result = booking::Entity::delete_many()
            .filter(
                booking::Column::LocationId
                    .is_in(location_ids.iter().map(Uuid::to_string)),
            )
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    async fn count(&self) -> DomainResult<u64> {
        booking::Entity::find()
            .count(&self.db)
            .await
            .map_err(db_err)
    }
}
