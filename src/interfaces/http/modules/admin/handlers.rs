//! Admin console handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use super::dto::*;
use crate::interfaces::http::common::{ApiResponse, ApiResult};
use crate::interfaces::http::modules::auth::ProfileDto;
use crate::interfaces::http::modules::bookings::{BookingDetailsDto, StatusChangeRequest, TransitionDto};
use crate::interfaces::http::modules::locations::LocationDto;
use crate::interfaces::http::ApiState;

#[utoipa::path(
    get,
    path = "/api/v1/admin/overview",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Platform totals", body = ApiResponse<AdminOverviewDto>),
        (status = 303, description = "Not an admin; redirected to the caller's home area")
    )
)]
pub async fn overview(State(state): State<ApiState>) -> ApiResult<AdminOverviewDto> {
    let overview = state.admin.overview().await?;
    Ok(Json(ApiResponse::success(overview.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/owners/pending",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Owners awaiting approval", body = ApiResponse<Vec<ProfileDto>>)
    )
)]
pub async fn pending_owners(State(state): State<ApiState>) -> ApiResult<Vec<ProfileDto>> {
    let owners = state.admin.pending_owners().await?;
    Ok(Json(ApiResponse::success(
        owners.into_iter().map(ProfileDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/owners",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All owners with property and booking counts", body = ApiResponse<Vec<OwnerSummaryDto>>)
    )
)]
pub async fn list_owners(State(state): State<ApiState>) -> ApiResult<Vec<OwnerSummaryDto>> {
    let owners = state.admin.owners().await?;
    Ok(Json(ApiResponse::success(
        owners.into_iter().map(OwnerSummaryDto::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/owners/{id}/approve",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Owner user id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Owner approved", body = ApiResponse<ProfileDto>),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn approve_owner(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProfileDto> {
    let profile = state.admin.approve_owner(id).await?;
    Ok(Json(ApiResponse::success(profile.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/owners/{id}/reject",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Owner user id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Owner rejected", body = ApiResponse<ProfileDto>),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn reject_owner(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProfileDto> {
    let profile = state.admin.reject_owner(id).await?;
    Ok(Json(ApiResponse::success(profile.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/owners/{id}/demote",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Owner user id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account is a driver again", body = ApiResponse<ProfileDto>),
        (status = 403, description = "Admin accounts cannot be demoted"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn demote_owner(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProfileDto> {
    let profile = state.admin.demote_owner(id).await?;
    Ok(Json(ApiResponse::success(profile.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/owners/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Owner user id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Owner, their locations and those locations' bookings removed", body = ApiResponse<DeleteSummaryDto>),
        (status = 403, description = "Admin accounts cannot be deleted"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn delete_owner(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> ApiResult<DeleteSummaryDto> {
    let summary = state.admin.delete_owner(id).await?;
    Ok(Json(ApiResponse::success(summary.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/bookings",
    operation_id = "admin_list_bookings",
    tag = "Admin",
    params(BookingFilterParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Bookings, newest first", body = ApiResponse<Vec<BookingDetailsDto>>),
        (status = 400, description = "Unknown status filter")
    )
)]
pub async fn list_bookings(
    State(state): State<ApiState>,
    Query(params): Query<BookingFilterParams>,
) -> ApiResult<Vec<BookingDetailsDto>> {
    let bookings = state.admin.bookings(params.status()?).await?;
    Ok(Json(ApiResponse::success(
        bookings.into_iter().map(BookingDetailsDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/locations",
    operation_id = "admin_list_locations",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All stored locations", body = ApiResponse<Vec<LocationDto>>)
    )
)]
pub async fn list_locations(State(state): State<ApiState>) -> ApiResult<Vec<LocationDto>> {
    let locations = state.admin.locations().await?;
    Ok(Json(ApiResponse::success(
        locations.into_iter().map(LocationDto::from).collect(),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/locations/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Location id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Location and its bookings removed", body = ApiResponse<DeleteSummaryDto>),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn delete_location(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> ApiResult<DeleteSummaryDto> {
    let summary = state.admin.delete_location(id).await?;
    Ok(Json(ApiResponse::success(summary.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/bookings/{id}/status",
    operation_id = "admin_set_booking_status",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Booking id")),
    security(("bearer_auth" = [])),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Status applied", body = ApiResponse<TransitionDto>),
        (status = 404, description = "Unknown booking"),
        (status = 409, description = "Reopening would double-book the slot")
    )
)]
pub async fn set_booking_status(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusChangeRequest>,
) -> ApiResult<TransitionDto> {
    let outcome = state.admin.set_booking_status(id, body.status).await?;
    Ok(Json(ApiResponse::success(outcome.into())))
}
