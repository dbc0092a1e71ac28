//! Authentication and profile handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use super::dto::*;
use crate::application::AuthContext;
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult, EmptyData, ValidatedJson};
use crate::interfaces::http::ApiState;

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "Authentication",
    request_body = SignupBody,
    responses(
        (status = 201, description = "Driver account created and signed in", body = ApiResponse<SessionDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn signup(
    State(state): State<ApiState>,
    ValidatedJson(body): ValidatedJson<SignupBody>,
) -> Result<(StatusCode, Json<ApiResponse<SessionDto>>), ApiError> {
    let session = state.auth.signup(body.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(session.into()))))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup/owner",
    tag = "Authentication",
    request_body = OwnerSignupBody,
    responses(
        (status = 201, description = "Owner account created, pending approval", body = ApiResponse<SessionDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn signup_owner(
    State(state): State<ApiState>,
    ValidatedJson(body): ValidatedJson<OwnerSignupBody>,
) -> Result<(StatusCode, Json<ApiResponse<SessionDto>>), ApiError> {
    let session = state.auth.signup_owner(body.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(session.into()))))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<SessionDto>),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Wrong login portal for this account")
    )
)]
pub async fn login(
    State(state): State<ApiState>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> ApiResult<SessionDto> {
    let session = state
        .auth
        .login(&body.email, &body.password, body.portal)
        .await?;
    Ok(Json(ApiResponse::success(session.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Session revoked", body = ApiResponse<EmptyData>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<EmptyData> {
    state.auth.sign_out(&ctx);
    Ok(Json(ApiResponse::success(EmptyData {})))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current session", body = ApiResponse<CurrentSessionDto>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn current_session(Extension(ctx): Extension<AuthContext>) -> ApiResult<CurrentSessionDto> {
    Ok(Json(ApiResponse::success(ctx.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/profile",
    tag = "Profile",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<ProfileDto>),
        (status = 400, description = "Emails do not match or invalid"),
        (status = 409, description = "Email already exists")
    )
)]
pub async fn update_profile(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<ProfileDto> {
    let profile = state.auth.update_profile(ctx.profile.id, body.into()).await?;
    Ok(Json(ApiResponse::success(profile.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/profile/password",
    tag = "Profile",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<EmptyData>),
        (status = 400, description = "Passwords do not match or too short")
    )
)]
pub async fn change_password(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AuthContext>,
    ValidatedJson(body): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<EmptyData> {
    state
        .auth
        .change_password(ctx.profile.id, &body.password, &body.confirm_password)
        .await?;
    Ok(Json(ApiResponse::success(EmptyData {})))
}
