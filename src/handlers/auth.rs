use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::auth::{AuthRouterExt, AuthUser};
use crate::entities::booking;
use crate::errors::ServiceError;
use crate::services::users::{LoginRequest, SignupRequest, UpdateProfileRequest, UserResponse};
use crate::{ApiResponse, AppState};

/// Account plus the bearer token that authenticates it.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
}

/// Profile joined with the account's bookings, newest first.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub bookings: Vec<booking::Model>,
}

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login));

    let protected = Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/logout", post(logout))
        .with_auth();

    public.merge(protected)
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse),
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ServiceError> {
    let user = state.services.users.register(request).await?;
    let token = state.services.auth.generate_token(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthResponse {
            user: user.into(),
            token,
        })),
    ))
}

/// Authenticate and obtain a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ServiceError> {
    let user = state.services.users.authenticate(request).await?;
    let token = state.services.auth.generate_token(&user)?;

    Ok(Json(ApiResponse::success(AuthResponse {
        user: user.into(),
        token,
    })))
}

/// Current user's profile with booking history
#[utoipa::path(
    get,
    path = "/auth/profile",
    responses(
        (status = 200, description = "Profile", body = ApiResponse<ProfileResponse>),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<ProfileResponse>>, ServiceError> {
    let (user, bookings) = state.services.users.get_profile(auth_user.user_id).await?;

    Ok(Json(ApiResponse::success(ProfileResponse {
        user: user.into(),
        bookings,
    })))
}

/// Update the current user's profile
#[utoipa::path(
    put,
    path = "/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ServiceError> {
    let user = state
        .services
        .users
        .update_profile(auth_user.user_id, request)
        .await?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// Log out (bearer tokens are discarded client-side)
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out"),
    ),
    security(("Bearer" = []))
)]
pub async fn logout(_auth_user: AuthUser) -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("User logged out successfully"))
}
