//! Location catalogue handlers (public)

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use super::dto::{LocationDto, LocationListParams, SlotGridDto};
use crate::interfaces::http::common::{ApiResponse, ApiResult};
use crate::interfaces::http::ApiState;

#[utoipa::path(
    get,
    path = "/api/v1/locations",
    tag = "Locations",
    params(LocationListParams),
    responses(
        (status = 200, description = "Matching locations, newest first", body = ApiResponse<Vec<LocationDto>>)
    )
)]
pub async fn list_locations(
    State(state): State<ApiState>,
    Query(params): Query<LocationListParams>,
) -> ApiResult<Vec<LocationDto>> {
    let locations = state.locations.list(params.into()).await?;
    Ok(Json(ApiResponse::success(
        locations.into_iter().map(LocationDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}",
    tag = "Locations",
    params(("id" = Uuid, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location", body = ApiResponse<LocationDto>),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn get_location(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> ApiResult<LocationDto> {
    let location = state.locations.get(id).await?;
    Ok(Json(ApiResponse::success(location.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}/slots",
    tag = "Locations",
    params(("id" = Uuid, Path, description = "Location id")),
    responses(
        (status = 200, description = "Slot grid with occupancy", body = ApiResponse<SlotGridDto>),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn get_slots(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SlotGridDto> {
    let grid = state.locations.slots(id).await?;
    Ok(Json(ApiResponse::success(grid.into())))
}
