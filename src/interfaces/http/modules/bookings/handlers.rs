//! Driver booking handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use uuid::Uuid;

use super::dto::{BarcodeDto, BookingCreatedDto, BookingDetailsDto, CreateBookingRequest};
use crate::application::services::BookingRequest;
use crate::application::AuthContext;
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};
use crate::interfaces::http::ApiState;

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    request_body = CreateBookingRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Booking created", body = ApiResponse<BookingCreatedDto>),
        (status = 400, description = "Invalid slot or duration"),
        (status = 404, description = "Unknown location"),
        (status = 409, description = "Slot already booked or location full"),
        (status = 422, description = "Profile missing, or a field broke a validation rule")
    )
)]
pub async fn create_booking(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    ValidatedJson(body): ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingCreatedDto>>), ApiError> {
    let outcome = state
        .bookings
        .create(BookingRequest {
            location_id: body.location_id,
            user_id: ctx.profile.id,
            selected_slot: body.selected_slot,
            start_time: body.start_time.unwrap_or_else(Utc::now),
            duration_hours: body.duration_hours,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(outcome.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/mine",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's bookings, newest first", body = ApiResponse<Vec<BookingDetailsDto>>)
    )
)]
pub async fn my_bookings(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<BookingDetailsDto>>>, ApiError> {
    let rows = state.bookings.mine(ctx.profile.id).await?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(BookingDetailsDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}/barcode",
    tag = "Bookings",
    params(("id" = Uuid, Path, description = "Booking id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ticket data", body = ApiResponse<BarcodeDto>),
        (status = 404, description = "Unknown booking")
    )
)]
pub async fn booking_barcode(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BarcodeDto>>, ApiError> {
    let ticket = state.bookings.ticket(ctx.actor(), id).await?;
    Ok(Json(ApiResponse::success(ticket.into())))
}
