//! API Router with Swagger UI

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::{ApiResponse, EmptyData, FieldError, ValidationDetails};
use super::middleware::{admin_area, auth_middleware, driver_area, owner_area};
use super::modules::{admin, auth, bookings, health, locations, metrics, owner};
use super::ApiState;
use crate::interfaces::ws::realtime_ws_handler;

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token from /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        // Auth & profile
        auth::signup,
        auth::signup_owner,
        auth::login,
        auth::logout,
        auth::current_session,
        auth::update_profile,
        auth::change_password,
        // Catalogue
        locations::list_locations,
        locations::get_location,
        locations::get_slots,
        // Driver
        bookings::create_booking,
        bookings::my_bookings,
        bookings::booking_barcode,
        // Owner
        owner::dashboard,
        owner::list_locations,
        owner::create_location,
        owner::update_location,
        owner::sync_location,
        owner::list_bookings,
        owner::set_booking_status,
        // Admin
        admin::overview,
        admin::pending_owners,
        admin::list_owners,
        admin::approve_owner,
        admin::reject_owner,
        admin::demote_owner,
        admin::delete_owner,
        admin::list_bookings,
        admin::list_locations,
        admin::delete_location,
        admin::set_booking_status,
    ),
    components(
        schemas(
            ApiResponse<String>,
            EmptyData,
            FieldError,
            ValidationDetails,
            auth::ProfileDto,
            auth::SessionDto,
            auth::CurrentSessionDto,
            locations::LocationDto,
            locations::SlotGridDto,
            locations::ReconciliationDto,
            bookings::BookingDto,
            bookings::BookingDetailsDto,
            bookings::BookingCreatedDto,
            bookings::BarcodeDto,
            bookings::TransitionDto,
            owner::OwnerDashboardDto,
            owner::LocationUpdatedDto,
            admin::AdminOverviewDto,
            admin::OwnerSummaryDto,
            admin::DeleteSummaryDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Authentication", description = "Sign-up, portal login and sessions"),
        (name = "Profile", description = "Own profile and password"),
        (name = "Locations", description = "Public parking and EV-charging catalogue"),
        (name = "Bookings", description = "Driver bookings and access tickets"),
        (name = "Owner", description = "Owner console: properties, bookings, availability sync"),
        (name = "Admin", description = "Admin console: owner approval, moderation, oversight"),
    ),
    info(
        title = "VoltPark API",
        version = "1.0.0",
        description = "Parking and EV-charging bookings with slot-occupancy reconciliation",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(allowed)
    }
}

/// Build the full router. An empty `cors_origins` allows any origin.
pub fn create_api_router(state: ApiState, cors_origins: &[String]) -> Router {
    let authenticate = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/api/v1/auth/signup", post(auth::signup))
        .route("/api/v1/auth/signup/owner", post(auth::signup_owner))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/locations", get(locations::list_locations))
        .route("/api/v1/locations/{id}", get(locations::get_location))
        .route("/api/v1/locations/{id}/slots", get(locations::get_slots))
        // Authenticates itself: browsers pass the token as a query parameter.
        .route("/api/v1/realtime/ws", get(realtime_ws_handler));

    let signed_in = Router::new()
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/session", get(auth::current_session))
        .route("/api/v1/profile", put(auth::update_profile))
        .route("/api/v1/profile/password", post(auth::change_password))
        .route_layer(authenticate.clone());

    let driver = Router::new()
        .route("/api/v1/bookings", post(bookings::create_booking))
        .route("/api/v1/bookings/mine", get(bookings::my_bookings))
        .route("/api/v1/bookings/{id}/barcode", get(bookings::booking_barcode))
        .route_layer(middleware::from_fn(driver_area))
        .route_layer(authenticate.clone());

    let owner = Router::new()
        .route("/api/v1/owner/dashboard", get(owner::dashboard))
        .route(
            "/api/v1/owner/locations",
            get(owner::list_locations).post(owner::create_location),
        )
        .route("/api/v1/owner/locations/{id}", put(owner::update_location))
        .route("/api/v1/owner/locations/{id}/sync", post(owner::sync_location))
        .route("/api/v1/owner/bookings", get(owner::list_bookings))
        .route(
            "/api/v1/owner/bookings/{id}/status",
            put(owner::set_booking_status),
        )
        .route_layer(middleware::from_fn(owner_area))
        .route_layer(authenticate.clone());

    let admin = Router::new()
        .route("/api/v1/admin/overview", get(admin::overview))
        .route("/api/v1/admin/owners", get(admin::list_owners))
        .route("/api/v1/admin/owners/pending", get(admin::pending_owners))
        .route(
            "/api/v1/admin/owners/{id}",
            axum::routing::delete(admin::delete_owner),
        )
        .route("/api/v1/admin/owners/{id}/approve", post(admin::approve_owner))
        .route("/api/v1/admin/owners/{id}/reject", post(admin::reject_owner))
        .route("/api/v1/admin/owners/{id}/demote", post(admin::demote_owner))
        .route("/api/v1/admin/bookings", get(admin::list_bookings))
        .route(
            "/api/v1/admin/bookings/{id}/status",
            put(admin::set_booking_status),
        )
        .route("/api/v1/admin/locations", get(admin::list_locations))
        .route(
            "/api/v1/admin/locations/{id}",
            axum::routing::delete(admin::delete_location),
        )
        .route_layer(middleware::from_fn(admin_area))
        .route_layer(authenticate);

    let swagger = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(public)
        .merge(signed_in)
        .merge(driver)
        .merge(owner)
        .merge(admin)
        .route_layer(middleware::from_fn(metrics::track_requests))
        .with_state(state)
        .merge(swagger)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}
