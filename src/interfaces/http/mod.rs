//! HTTP REST API
//!
//! - `middleware`: bearer authentication and role-area guards
//! - `modules`: handlers and DTOs per area
//! - `router`: route table, OpenAPI document and Swagger UI

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;

pub use router::create_api_router;
pub use state::ApiState;
