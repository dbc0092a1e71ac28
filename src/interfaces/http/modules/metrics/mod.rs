//! Prometheus endpoint and request metrics

pub mod handlers;
pub mod middleware;

pub use handlers::prometheus_metrics;
pub use middleware::track_requests;
