//! Availability reconciliation
//!
//! `available_slots` on a location is a denormalised counter. It is only
//! ever recomputed from the number of active bookings, never incremented
//! or decremented, so any number of concurrent or repeated calls converge
//! on the same value.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::events::{ChangeEvent, SharedChangeBus};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};
use crate::shared::retry::{retry_with_backoff, RetryConfig};

/// Outcome of one reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub location_id: Uuid,
    pub total_slots: u32,
    pub active_bookings: u64,
    pub available_slots: u32,
    /// `false` when the counter could not be written; the stored value is
    /// stale until the next trigger.
    pub persisted: bool,
}

/// `max(0, total - active)`, never above `total`.
pub fn compute_available(total_slots: u32, active_bookings: u64) -> u32 {
    let active = u32::try_from(active_bookings).unwrap_or(u32::MAX);
    total_slots.saturating_sub(active)
}

/// Totals of a sweep over every location
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub reconciled: usize,
    pub corrected: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct AvailabilityReconciler {
    repos: Arc<dyn RepositoryProvider>,
    events: SharedChangeBus,
    retry: RetryConfig,
}

impl AvailabilityReconciler {
    pub fn new(repos: Arc<dyn RepositoryProvider>, events: SharedChangeBus) -> Self {
        Self {
            repos,
            events,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Recompute and persist a location's counter.
    ///
    /// Read failures are returned. A failed write is logged and reported
    /// as `persisted: false`, since booking rows remain the source of
    /// truth.
    pub async fn reconcile(&self, location_id: Uuid) -> DomainResult<Reconciliation> {
        match self.recompute(location_id).await? {
            (outcome, Ok(())) => Ok(outcome),
            (outcome, Err(e)) => {
                warn!(
                    %location_id,
                    available_slots = outcome.available_slots,
                    error = %e,
                    "Availability not persisted; counter left stale"
                );
                Ok(outcome)
            }
        }
    }

    /// Like [`reconcile`](Self::reconcile), but a failed write is an error.
    /// Backs the explicit owner "sync" operation.
    pub async fn sync(&self, location_id: Uuid) -> DomainResult<Reconciliation> {
        let (outcome, persisted) = self.recompute(location_id).await?;
        persisted?;
        Ok(outcome)
    }

    async fn recompute(
        &self,
        location_id: Uuid,
    ) -> DomainResult<(Reconciliation, DomainResult<()>)> {
        let active_bookings = self.repos.bookings().count_active(location_id).await?;
        let location = self
            .repos
            .locations()
            .find_by_id(location_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Location", location_id))?;

        let available_slots = compute_available(location.total_slots, active_bookings);

        let repos = self.repos.clone();
        let persisted = retry_with_backoff(
            self.retry.clone(),
            || {
                let repos = repos.clone();
                async move {
                    repos
                        .locations()
                        .set_available_slots(location_id, available_slots)
                        .await
                }
            },
            DomainError::is_transient,
            "persist_available_slots",
        )
        .await;

        let outcome = Reconciliation {
            location_id,
            total_slots: location.total_slots,
            active_bookings,
            available_slots,
            persisted: persisted.is_ok(),
        };

        if outcome.persisted {
            metrics::counter!("reconciliations_total", "outcome" => "persisted").increment(1);
            if location.available_slots != available_slots {
                debug!(
                    %location_id,
                    previous = location.available_slots,
                    available_slots,
                    "Availability corrected"
                );
            }
            self.events.publish(ChangeEvent::availability(
                location_id,
                location.owner_id,
                available_slots,
            ));
        } else {
            metrics::counter!("reconciliations_total", "outcome" => "degraded").increment(1);
        }

        Ok((outcome, persisted))
    }

    /// Reconcile every location. Failures are counted, not returned.
    pub async fn reconcile_all(&self) -> DomainResult<SweepSummary> {
        let locations = self.repos.locations().list(Default::default()).await?;
        let mut summary = SweepSummary::default();

        for location in locations {
            match self.reconcile(location.id).await {
                Ok(r) if r.persisted => {
                    summary.reconciled += 1;
                    if r.available_slots != location.available_slots {
                        summary.corrected += 1;
                    }
                }
                Ok(_) => summary.failed += 1,
                Err(e) => {
                    warn!(location_id = %location.id, error = %e, "Reconciliation failed");
                    summary.failed += 1;
                }
            }
        }

        if summary.corrected > 0 || summary.failed > 0 {
            info!(
                reconciled = summary.reconciled,
                corrected = summary.corrected,
                failed = summary.failed,
                "Availability sweep finished"
            );
        }
        Ok(summary)
    }
}
