//! Prometheus scrape endpoint

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::interfaces::http::ApiState;

/// `GET /metrics`, Prometheus text format (no auth)
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [("content-type", "text/plain; charset=utf-8")],
            "metrics recorder not installed\n".to_string(),
        ),
    }
}
