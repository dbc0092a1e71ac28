//! Reusable server runtime.
//!
//! [`ServerHandle`] owns the whole lifecycle: database init, migrations,
//! service wiring, REST API, availability sweep, metrics and graceful
//! shutdown. The CLI binary and the router tests both build on it.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::identity::SessionStore;
use crate::application::services::start_availability_sync_task;
use crate::application::{
    create_change_bus, AdminService, AuthService, AvailabilityReconciler, BookingLifecycle,
    LocationService, SharedChangeBus,
};
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::seed::seed_database;
use crate::infrastructure::{
    init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};
use crate::interfaces::http::{create_api_router, ApiState};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Create the configured admin account if no admin exists (default: true).
    pub create_default_admin: bool,
    /// Keep everything in memory instead of opening the database.
    pub in_memory: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            create_default_admin: true,
            in_memory: false,
        }
    }
}

// ── Wiring ─────────────────────────────────────────────────────────

/// Build every service over `repos` and bundle them as the API state.
/// The reconciler is returned separately for the background sweep.
pub fn build_api_state(
    repos: Arc<dyn RepositoryProvider>,
    events: SharedChangeBus,
    config: &AppConfig,
) -> (ApiState, AvailabilityReconciler) {
    let jwt = JwtConfig {
        secret: config.security.jwt_secret.clone(),
        expiration_hours: config.security.jwt_expiration_hours,
        issuer: "voltpark".to_string(),
    };

    let reconciler = AvailabilityReconciler::new(repos.clone(), events.clone());
    let lifecycle = BookingLifecycle::new(repos.clone(), reconciler.clone(), events.clone())
        .with_policy(config.booking.transition_policy)
        .with_demo_catalogue(config.demo.catalogue);
    let locations = LocationService::new(
        repos.clone(),
        reconciler.clone(),
        lifecycle.clone(),
        events.clone(),
    )
    .with_demo_catalogue(config.demo.catalogue);
    let admin = AdminService::new(
        repos.clone(),
        reconciler.clone(),
        lifecycle.clone(),
        events.clone(),
    );
    let auth = AuthService::new(repos, jwt, SessionStore::shared())
        .with_bcrypt_cost(config.security.bcrypt_cost);

    let state = ApiState::new(auth, locations, lifecycle, admin, events)
        .with_poll_interval(Duration::from_secs(config.sync.poll_interval_secs.max(1)));
    (state, reconciler)
}

/// The global recorder can only be installed once per process; a restart
/// in the same process reuses it.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static PROM_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();
    PROM_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!(error = %e, "Prometheus recorder unavailable; /metrics disabled");
                None
            }
        })
        .clone()
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running service.
///
/// ```rust,no_run
/// use voltpark::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub events: SharedChangeBus,
    pub repos: Arc<dyn RepositoryProvider>,
    pub config: AppConfig,
    pub api_port: u16,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
    sync_task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// 1. Install the Prometheus recorder
    /// 2. Open the store (database + migrations, or memory)
    /// 3. Seed sample locations and the admin account when configured
    /// 4. Start the REST API and the availability sweep
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        info!("Starting VoltPark service...");

        let metrics = prometheus_handle();

        // ── Store ──────────────────────────────────────────────
        let (repos, db): (Arc<dyn RepositoryProvider>, Option<DatabaseConnection>) =
            if opts.in_memory {
                warn!("Running on the in-memory store; nothing will be persisted");
                (Arc::new(InMemoryRepositoryProvider::new()), None)
            } else {
                let db_config = DatabaseConfig {
                    url: app_cfg.database.connection_url(),
                    pool: app_cfg.database.pool.clone(),
                };
                info!("Database: {}", db_config.url);
                let db = init_database(&db_config).await?;
                if opts.auto_migrate {
                    info!("Running database migrations...");
                    Migrator::up(&db, None).await?;
                    info!("Migrations completed");
                }
                (Arc::new(SeaOrmRepositoryProvider::new(db.clone())), Some(db))
            };

        if app_cfg.demo.seed_database {
            match seed_database(repos.as_ref()).await {
                Ok(0) => {}
                Ok(n) => info!(locations = n, "Seeded sample locations"),
                Err(e) => warn!(error = %e, "Seeding sample locations failed"),
            }
        }

        // ── Services ───────────────────────────────────────────
        let events = create_change_bus();
        let (mut state, reconciler) = build_api_state(repos.clone(), events.clone(), &app_cfg);
        if let Some(db) = &db {
            state = state.with_database(db.clone());
        }
        if let Some(handle) = metrics {
            state = state.with_metrics(handle);
        }

        if opts.create_default_admin {
            let admin = &app_cfg.admin;
            if let Err(e) = state
                .auth
                .ensure_admin(&admin.email, &admin.password, &admin.name)
                .await
            {
                error!(error = %e, "Failed to create default admin");
            }
        }

        // ── Background tasks ───────────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();
        let sync_task = start_availability_sync_task(
            reconciler,
            shutdown_signal.clone(),
            app_cfg.sync.interval_secs,
        );

        // ── REST API ───────────────────────────────────────────
        let router = create_api_router(state, &app_cfg.server.cors_origins);
        let api_port = app_cfg.server.api_port;
        let api_addr = format!("{}:{}", app_cfg.server.api_host, api_port);
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        info!("REST API listening on http://{}", api_addr);
        info!("Swagger UI available at http://{}/docs/", api_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API received shutdown signal");
        });
        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            events,
            repos,
            config: app_cfg,
            api_port,
            db,
            shutdown,
            api_task,
            sync_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install SIGTERM / SIGINT listeners that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the API server and the sweep to stop, bounded by the
    /// configured shutdown timeout, then close the database.
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            sync_task,
            ..
        } = self;

        shutdown
            .shutdown_with_cleanup(|| async move {
                if let Err(e) = api_task.await {
                    error!("REST API task panicked: {}", e);
                }
                if let Some(task) = sync_task {
                    if let Err(e) = task.await {
                        error!("Availability sweep panicked: {}", e);
                    }
                }
            })
            .await;

        if let Some(db) = db {
            match db.close().await {
                Ok(()) => info!("Database connection closed"),
                Err(e) => warn!("Error closing database connection: {}", e),
            }
        }
        info!("VoltPark service shutdown complete");
    }

    pub async fn shutdown(self) {
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Logging ────────────────────────────────────────────────────────

/// Initialize tracing from the logging config. `RUST_LOG` wins over the
/// configured level. Call once, before [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
    if let Err(e) = result {
        eprintln!("Tracing already initialized: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_server_starts_and_stops() {
        let mut config = AppConfig::default();
        config.server.api_host = "127.0.0.1".into();
        config.server.api_port = 0;
        config.security.bcrypt_cost = 4;
        config.sync.interval_secs = 0;

        let handle = ServerHandle::start(ServerOptions {
            config,
            in_memory: true,
            ..Default::default()
        })
        .await
        .unwrap();
        assert!(handle.is_running());

        let admins = handle
            .repos
            .users()
            .count(crate::domain::ProfileQuery {
                role: Some(crate::domain::UserRole::Admin),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(admins, 1);

        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .unwrap();
    }
}
