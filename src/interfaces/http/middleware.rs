//! Authentication and role-area middleware for Axum
//!
//! `auth_middleware` turns the bearer token into an [`AuthContext`] request
//! extension. The area guards then ask [`decide`] whether the caller's role
//! may enter: a wrong role is redirected (`303`) to its own home area.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use super::common::{ApiError, ApiResponse};
use crate::application::{AuthContext, AuthService};
use crate::domain::access::{decide, AccessDecision, Area};

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_token)
}

/// JWT authentication middleware
pub async fn auth_middleware(
    State(auth): State<AuthService>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        return ApiError::unauthorized("Missing authentication token").into_response();
    };

    match auth.authenticate(token).await {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

async fn enforce(area: Area, request: Request<Body>, next: Next) -> Response {
    let session = request
        .extensions()
        .get::<AuthContext>()
        .map(AuthContext::session_role);

    match decide(area, session) {
        AccessDecision::Allow => next.run(request).await,
        AccessDecision::SignIn => {
            ApiError::unauthorized("Please sign in to continue").into_response()
        }
        AccessDecision::Redirect(home) => (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, home.path())],
            Json(ApiResponse::<()>::error(format!(
                "This area is not available for your account; continue at {}",
                home.path()
            ))),
        )
            .into_response(),
    }
}

pub async fn driver_area(request: Request<Body>, next: Next) -> Response {
    enforce(Area::Driver, request, next).await
}

pub async fn owner_area(request: Request<Body>, next: Next) -> Response {
    enforce(Area::Owner, request, next).await
}

pub async fn admin_area(request: Request<Body>, next: Next) -> Response {
    enforce(Area::Admin, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(extract_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_token("Bearer "), None);
        assert_eq!(extract_token("Basic abc"), None);
    }
}
