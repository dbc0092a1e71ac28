//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::{BookingRepository, LocationRepository, RepositoryProvider, UserRepository};

use super::booking_repository::SeaOrmBookingRepository;
use super::location_repository::SeaOrmLocationRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let loc = repos.locations().find_by_id(id).await?;
/// let created = repos.bookings().create_and_reconcile(booking).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    locations: SeaOrmLocationRepository,
    bookings: SeaOrmBookingRepository,
    users: SeaOrmUserRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            locations: SeaOrmLocationRepository::new(db.clone()),
            bookings: SeaOrmBookingRepository::new(db.clone()),
            users: SeaOrmUserRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn locations(&self) -> &dyn LocationRepository {
        &self.locations
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, Database, Set};
    use sea_orm_migration::MigratorTrait;
    use uuid::Uuid;

    use super::*;
    use crate::application::events::create_change_bus;
    use crate::application::services::testing::{parking, profile};
    use crate::application::services::{
        AvailabilityReconciler, BookingLifecycle, BookingOutcome, BookingRequest, CreatePath,
    };
    use crate::domain::{
        ApprovalStatus, Booking, BookingStatus, DomainError, Location, OwnerProfile, ProfileQuery,
        SlotId, UserProfile, UserRole,
    };
    use crate::infrastructure::database::entities::location;
    use crate::infrastructure::database::migrator::Migrator;
    use crate::shared::retry::RetryConfig;

    async fn provider() -> (DatabaseConnection, SeaOrmRepositoryProvider) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        (db.clone(), SeaOrmRepositoryProvider::new(db))
    }

    async fn seeded(total: u32) -> (DatabaseConnection, SeaOrmRepositoryProvider, Location, UserProfile) {
        let (db, repos) = provider().await;
        let user = profile("driver@example.com", UserRole::User, ApprovalStatus::None);
        repos.users().create(user.clone()).await.unwrap();
        let loc = parking(total, None);
        repos.locations().insert(loc.clone()).await.unwrap();
        (db, repos, loc, user)
    }

    fn booking(loc: &Location, user: &UserProfile, slot: &str) -> Booking {
        Booking::schedule(loc, user.id, SlotId::parse(slot).unwrap(), Utc::now(), 2).unwrap()
    }

    #[tokio::test]
    async fn active_slot_is_unique_in_the_database() {
        let (_db, repos, loc, user) = seeded(5).await;
        repos.bookings().insert(booking(&loc, &user, "P1")).await.unwrap();

        let err = repos
            .bookings()
            .insert(booking(&loc, &user, "P1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SlotTaken { ref slot, .. } if slot == "P1"));
    }

    #[tokio::test]
    async fn money_reads_back_exactly() {
        let (_db, repos, mut loc, user) = seeded(3).await;
        loc.price_per_hour = rust_decimal::Decimal::new(1235, 2);
        repos.locations().update(loc.clone()).await.unwrap();

        let stored = repos.locations().find_by_id(loc.id).await.unwrap().unwrap();
        assert_eq!(stored.price_per_hour, loc.price_per_hour);

        let b = booking(&stored, &user, "P1");
        repos.bookings().insert(b.clone()).await.unwrap();
        let read = repos.bookings().find_by_id(b.id).await.unwrap().unwrap();
        assert_eq!(read.amount, rust_decimal::Decimal::new(2470, 2));
        assert_eq!(read.amount, b.amount);

        // A sub-paisa price is refused instead of being rounded on the way in.
        let mut odd = parking(2, None);
        odd.price_per_hour = rust_decimal::Decimal::new(12345, 3);
        assert!(matches!(
            repos.locations().insert(odd.clone()).await,
            Err(DomainError::Validation(_))
        ));
        assert!(repos.locations().find_by_id(odd.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn finished_bookings_release_their_slot() {
        let (_db, repos, loc, user) = seeded(5).await;
        let first = booking(&loc, &user, "P2");
        repos.bookings().insert(first.clone()).await.unwrap();
        repos
            .bookings()
            .update_status(first.id, BookingStatus::Completed)
            .await
            .unwrap();

        repos.bookings().insert(booking(&loc, &user, "P2")).await.unwrap();
        assert_eq!(repos.bookings().count_active(loc.id).await.unwrap(), 1);

        // Reopening the old booking would hold the slot twice.
        let err = repos
            .bookings()
            .update_status(first.id, BookingStatus::Scheduled)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SlotTaken { .. }));
    }

    #[tokio::test]
    async fn corrupted_counter_is_reconciled() {
        let (db, repos, loc, user) = seeded(10).await;
        for slot in ["P1", "P2", "P3"] {
            repos.bookings().insert(booking(&loc, &user, slot)).await.unwrap();
        }
        location::ActiveModel {
            id: Set(loc.id.to_string()),
            available_slots: Set(-5),
            ..Default::default()
        }
        .update(&db)
        .await
        .unwrap();

        let repos: Arc<dyn RepositoryProvider> = Arc::new(repos);
        let reconciler = AvailabilityReconciler::new(repos.clone(), create_change_bus())
            .with_retry(RetryConfig::none());
        let outcome = reconciler.reconcile(loc.id).await.unwrap();
        assert_eq!(outcome.active_bookings, 3);
        assert_eq!(outcome.available_slots, 7);
        assert!(outcome.persisted);

        let stored = repos.locations().find_by_id(loc.id).await.unwrap().unwrap();
        assert_eq!(stored.available_slots, 7);
    }

    #[tokio::test]
    async fn lifecycle_uses_the_atomic_procedure() {
        let (_db, repos, loc, user) = seeded(4).await;
        let repos: Arc<dyn RepositoryProvider> = Arc::new(repos);
        let events = create_change_bus();
        let reconciler = AvailabilityReconciler::new(repos.clone(), events.clone());
        let lifecycle = BookingLifecycle::new(repos.clone(), reconciler, events);

        let outcome = lifecycle
            .create(BookingRequest {
                location_id: loc.id,
                user_id: user.id,
                selected_slot: "p3".into(),
                start_time: Utc::now(),
                duration_hours: 3,
            })
            .await
            .unwrap();
        let BookingOutcome::Created(receipt) = outcome else {
            panic!("expected a stored booking");
        };
        assert_eq!(receipt.path, CreatePath::Atomic);
        assert_eq!(receipt.available_slots, Some(3));

        let stored = repos.locations().find_by_id(loc.id).await.unwrap().unwrap();
        assert_eq!(stored.available_slots, 3);
        let mine = repos.bookings().list_for_user(user.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].location_name.as_deref(), Some(loc.name.as_str()));
        assert_eq!(mine[0].user_email.as_deref(), Some("driver@example.com"));
        assert_eq!(mine[0].booking.amount, receipt.booking.amount);
    }

    #[tokio::test]
    async fn failed_procedure_leaves_no_booking_behind() {
        let (_db, repos, loc, user) = seeded(4).await;
        repos
            .bookings()
            .create_and_reconcile(booking(&loc, &user, "P1"))
            .await
            .unwrap();
        let err = repos
            .bookings()
            .create_and_reconcile(booking(&loc, &user, "P1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SlotTaken { .. }));
        assert_eq!(repos.bookings().count().await.unwrap(), 1);
        let stored = repos.locations().find_by_id(loc.id).await.unwrap().unwrap();
        assert_eq!(stored.available_slots, 3);
    }

    #[tokio::test]
    async fn broken_references_are_reported() {
        let (_db, repos, loc, user) = seeded(4).await;

        let mut orphan = booking(&loc, &user, "P1");
        orphan.user_id = Uuid::new_v4();
        let err = repos.bookings().insert(orphan.clone()).await.unwrap_err();
        assert!(matches!(err, DomainError::MissingProfile { user_id } if user_id == orphan.user_id));

        let mut lost = booking(&loc, &user, "P1");
        lost.location_id = Uuid::new_v4();
        let err = repos.bookings().create_and_reconcile(lost.clone()).await.unwrap_err();
        assert!(matches!(err, DomainError::MissingLocation(id) if id == lost.location_id));
    }

    #[tokio::test]
    async fn location_with_bookings_cannot_be_deleted() {
        let (_db, repos, loc, user) = seeded(4).await;
        repos.bookings().insert(booking(&loc, &user, "P1")).await.unwrap();

        let err = repos.locations().delete(loc.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        assert_eq!(repos.bookings().delete_for_locations(&[loc.id]).await.unwrap(), 1);
        repos.locations().delete(loc.id).await.unwrap();
        assert_eq!(repos.locations().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_a_user_cascades() {
        let (_db, repos, loc, user) = seeded(4).await;
        repos.bookings().insert(booking(&loc, &user, "P1")).await.unwrap();
        repos
            .users()
            .create_owner_profile(OwnerProfile {
                id: user.id,
                company_name: "Lakeside Parking Co".into(),
                city: "Mumbai".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        repos.users().delete(user.id).await.unwrap();
        assert_eq!(repos.bookings().count().await.unwrap(), 0);
        assert!(repos.users().find_owner_profile(user.id).await.unwrap().is_none());
        assert!(matches!(
            repos.users().delete(user.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn email_is_unique_and_case_insensitive() {
        let (_db, repos) = provider().await;
        let first = profile("asha@example.com", UserRole::Owner, ApprovalStatus::Pending);
        repos.users().create(first.clone()).await.unwrap();

        let dup = profile("ASHA@example.com", UserRole::User, ApprovalStatus::None);
        assert!(matches!(
            repos.users().create(dup).await,
            Err(DomainError::Conflict(_))
        ));

        let found = repos.users().find_by_email(" Asha@Example.com").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(first.id));

        repos
            .users()
            .set_role(first.id, UserRole::Owner, ApprovalStatus::Approved)
            .await
            .unwrap();
        let pending = ProfileQuery {
            role: Some(UserRole::Owner),
            approval_status: Some(ApprovalStatus::Pending),
        };
        assert_eq!(repos.users().count(pending).await.unwrap(), 0);
    }
}
