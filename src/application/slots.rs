//! Occupancy resolution
//!
//! Turns the active bookings of a location into the set of occupied slot
//! ids. A failed lookup is an error, never an empty set.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{slot_grid, Location, OccupiedSlots, RepositoryProvider, SlotCell, SlotId};
use crate::shared::errors::ResolutionError;

/// Slot grid of a location as shown to drivers and owners
#[derive(Debug, Clone, Serialize)]
pub struct SlotGridView {
    pub location_id: Uuid,
    pub cells: Vec<SlotCell>,
    pub occupied: Vec<SlotId>,
    /// `false` when occupancy could not be resolved; `cells` are then all
    /// reported free and must not be used to pick a slot.
    pub occupancy_known: bool,
}

#[derive(Clone)]
pub struct OccupancyResolver {
    repos: Arc<dyn RepositoryProvider>,
}

impl OccupancyResolver {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Slot ids held by Scheduled or Started bookings at `location_id`.
    pub async fn resolve_occupied(&self, location_id: Uuid) -> Result<OccupiedSlots, ResolutionError> {
        let raw = self
            .repos
            .bookings()
            .occupied_slots(location_id)
            .await
            .map_err(|e| ResolutionError {
                location_id,
                reason: e.to_string(),
            })?;

        Ok(OccupiedSlots::from_values(raw))
    }

    pub async fn grid(&self, location: &Location) -> SlotGridView {
        match self.resolve_occupied(location.id).await {
            Ok(occupied) => SlotGridView {
                location_id: location.id,
                cells: slot_grid(location.kind, location.total_slots, &occupied),
                occupied: occupied.sorted(),
                occupancy_known: true,
            },
            Err(e) => {
                warn!(location_id = %location.id, error = %e, "Occupancy unknown");
                SlotGridView {
                    location_id: location.id,
                    cells: slot_grid(location.kind, location.total_slots, &OccupiedSlots::default()),
                    occupied: Vec::new(),
                    occupancy_known: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::{fixture, FlakyRepos};
    use crate::domain::BookingStatus;

    #[tokio::test]
    async fn empty_location_has_verified_zero_occupancy() {
        let fx = fixture(4).await;
        let resolver = OccupancyResolver::new(fx.repos.clone());
        assert!(resolver.resolve_occupied(fx.location.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_active_bookings_occupy() {
        let fx = fixture(4).await;
        fx.book("P1").await;
        let done = fx.book("P2").await;
        fx.repos
            .bookings()
            .update_status(done.id, BookingStatus::Completed)
            .await
            .unwrap();

        let occupied = OccupancyResolver::new(fx.repos.clone())
            .resolve_occupied(fx.location.id)
            .await
            .unwrap();
        assert_eq!(occupied.len(), 1);
        assert!(occupied.contains_raw("p1"));
    }

    #[tokio::test]
    async fn duplicate_and_blank_rows_collapse() {
        let fx = fixture(5).await;
        let flaky = Arc::new(FlakyRepos::wrap(fx.repos.clone()));
        flaky.serve_legacy_rows(vec![
            Some("P1".into()),
            Some("P3".into()),
            Some("p3".into()),
            None,
            Some(" ".into()),
        ]);
        let occupied = OccupancyResolver::new(flaky)
            .resolve_occupied(fx.location.id)
            .await
            .unwrap();
        assert_eq!(occupied.len(), 2);
        let ids: Vec<String> = occupied.sorted().into_iter().map(String::from).collect();
        assert_eq!(ids, vec!["P1", "P3"]);
    }

    #[tokio::test]
    async fn failure_is_an_error_not_an_empty_set() {
        let fx = fixture(5).await;
        let flaky = Arc::new(FlakyRepos::wrap(fx.repos.clone()));
        flaky.fail_occupancy(true);
        let resolver = OccupancyResolver::new(flaky);

        let err = resolver.resolve_occupied(fx.location.id).await.unwrap_err();
        assert_eq!(err.location_id, fx.location.id);

        let grid = resolver.grid(&fx.location).await;
        assert!(!grid.occupancy_known);
        assert_eq!(grid.cells.len(), 5);
    }

    #[tokio::test]
    async fn grid_reflects_bookings() {
        let fx = fixture(3).await;
        fx.book("P2").await;
        let grid = OccupancyResolver::new(fx.repos.clone()).grid(&fx.location).await;
        assert!(grid.occupancy_known);
        let flags: Vec<bool> = grid.cells.iter().map(|c| c.occupied).collect();
        assert_eq!(flags, vec![false, true, false]);
    }
}
