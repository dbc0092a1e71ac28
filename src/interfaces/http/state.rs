//! Shared state of the REST API

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::FromRef;
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;

use crate::application::sync::DEFAULT_POLL_INTERVAL;
use crate::application::{
    AdminService, AuthService, BookingLifecycle, LocationService, SharedChangeBus,
};

/// Services behind the handlers. Cheap to clone.
#[derive(Clone)]
pub struct ApiState {
    pub auth: AuthService,
    pub locations: LocationService,
    pub bookings: BookingLifecycle,
    pub admin: AdminService,
    pub events: SharedChangeBus,
    /// Quiet period after which realtime clients are told to refetch
    pub poll_interval: Duration,
    /// `None` when running on the in-memory store
    pub db: Option<DatabaseConnection>,
    pub metrics: Option<PrometheusHandle>,
    pub started_at: Arc<Instant>,
}

impl ApiState {
    pub fn new(
        auth: AuthService,
        locations: LocationService,
        bookings: BookingLifecycle,
        admin: AdminService,
        events: SharedChangeBus,
    ) -> Self {
        Self {
            auth,
            locations,
            bookings,
            admin,
            events,
            poll_interval: DEFAULT_POLL_INTERVAL,
            db: None,
            metrics: None,
            started_at: Arc::new(Instant::now()),
        }
    }

    pub fn with_database(mut self, db: DatabaseConnection) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl FromRef<ApiState> for AuthService {
    fn from_ref(s: &ApiState) -> Self {
        s.auth.clone()
    }
}
