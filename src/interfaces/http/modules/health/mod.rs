//! Health check handler

use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{ConnectionTrait, Statement};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::interfaces::http::ApiState;

/// Service health response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: ComponentHealth,
    /// Open realtime subscriptions
    pub realtime_subscribers: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    /// `ok`, `error`, or `memory` when no database is configured
    pub status: String,
    pub latency_ms: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.db {
        None => ComponentHealth {
            status: "memory".to_string(),
            latency_ms: None,
        },
        Some(db) => {
            let start = Instant::now();
            let ping = db
                .execute(Statement::from_string(
                    db.get_database_backend(),
                    "SELECT 1".to_string(),
                ))
                .await;
            match ping {
                Ok(_) => ComponentHealth {
                    status: "ok".to_string(),
                    latency_ms: Some(start.elapsed().as_millis() as u64),
                },
                Err(e) => {
                    log::warn!("Health check database ping failed: {}", e);
                    ComponentHealth {
                        status: "error".to_string(),
                        latency_ms: None,
                    }
                }
            }
        }
    };

    let healthy = database.status != "error";
    (
        if healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        },
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            database,
            realtime_subscribers: state.events.subscriber_count(),
        }),
    )
}
