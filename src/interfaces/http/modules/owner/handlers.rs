//! Owner console handlers
//!
//! All routes sit behind the owner-area guard; per-location ownership is
//! checked by [`LocationService`](crate::application::LocationService).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use uuid::Uuid;

use super::dto::*;
use crate::application::AuthContext;
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::modules::bookings::{BookingDetailsDto, StatusChangeRequest, TransitionDto};
use crate::interfaces::http::modules::locations::{LocationDto, ReconciliationDto};
use crate::interfaces::http::ApiState;

#[utoipa::path(
    get,
    path = "/api/v1/owner/dashboard",
    tag = "Owner",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard figures", body = ApiResponse<OwnerDashboardDto>),
        (status = 303, description = "Not an owner; redirected to the caller's home area")
    )
)]
pub async fn dashboard(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<OwnerDashboardDto> {
    let dashboard = state.locations.dashboard(ctx.profile.id).await?;
    Ok(Json(ApiResponse::success(dashboard.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/owner/locations",
    tag = "Owner",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's properties", body = ApiResponse<Vec<LocationDto>>)
    )
)]
pub async fn list_locations(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Vec<LocationDto>> {
    let locations = state.locations.owner_locations(ctx.profile.id).await?;
    Ok(Json(ApiResponse::success(
        locations.into_iter().map(LocationDto::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/owner/locations",
    tag = "Owner",
    security(("bearer_auth" = [])),
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location listed", body = ApiResponse<LocationDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Owner not approved yet")
    )
)]
pub async fn create_location(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    ValidatedJson(body): ValidatedJson<CreateLocationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LocationDto>>), ApiError> {
    let location = state.locations.create(ctx.actor(), body.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(location.into()))))
}

#[utoipa::path(
    put,
    path = "/api/v1/owner/locations/{id}",
    tag = "Owner",
    params(("id" = Uuid, Path, description = "Location id")),
    security(("bearer_auth" = [])),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location updated", body = ApiResponse<LocationUpdatedDto>),
        (status = 403, description = "Not the caller's property"),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn update_location(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateLocationRequest>,
) -> ApiResult<LocationUpdatedDto> {
    let (location, reconciliation) = state.locations.update(ctx.actor(), id, body.into()).await?;
    Ok(Json(ApiResponse::success(LocationUpdatedDto {
        location: location.into(),
        reconciliation: reconciliation.map(Into::into),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/owner/locations/{id}/sync",
    tag = "Owner",
    params(("id" = Uuid, Path, description = "Location id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Availability recomputed from active bookings", body = ApiResponse<ReconciliationDto>),
        (status = 403, description = "Not the caller's property"),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn sync_location(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<ReconciliationDto> {
    let reconciliation = state.locations.sync(ctx.actor(), id).await?;
    Ok(Json(ApiResponse::success(reconciliation.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/owner/bookings",
    tag = "Owner",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Bookings at the caller's properties", body = ApiResponse<Vec<BookingDetailsDto>>)
    )
)]
pub async fn list_bookings(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Vec<BookingDetailsDto>> {
    let bookings = state.locations.owner_bookings(ctx.profile.id).await?;
    Ok(Json(ApiResponse::success(
        bookings.into_iter().map(BookingDetailsDto::from).collect(),
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/owner/bookings/{id}/status",
    tag = "Owner",
    params(("id" = Uuid, Path, description = "Booking id")),
    security(("bearer_auth" = [])),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Status applied", body = ApiResponse<TransitionDto>),
        (status = 400, description = "Transition not allowed"),
        (status = 403, description = "Booking is not at the caller's property"),
        (status = 409, description = "Reopening would double-book the slot")
    )
)]
pub async fn set_booking_status(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusChangeRequest>,
) -> ApiResult<TransitionDto> {
    let outcome = state
        .locations
        .set_booking_status(ctx.actor(), id, body.status)
        .await?;
    Ok(Json(ApiResponse::success(outcome.into())))
}
