use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};

use crate::auth::{AuthRouterExt, AuthUser};
use crate::errors::ServiceError;
use crate::handlers::parse_id;
use crate::services::bookings::{
    BookingResponse, CreateBookingRequest, ListBookingsQuery, MyBookingsQuery,
};
use crate::{ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_all_bookings))
        .route("/my-bookings", get(my_bookings))
        .route("/:id", get(get_booking))
        .route("/:id/cancel", put(cancel_booking))
        .route("/:id/checkin", put(check_in_booking))
        .route("/:id/checkout", put(check_out_booking))
        .with_auth()
}

/// Reserve a slot: validates, charges payment, then atomically claims the
/// slot and persists the booking
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = ApiResponse<BookingResponse>),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 402, description = "Payment declined", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown location or slot", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slot unavailable or vehicle-type mismatch", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_booking(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingResponse>>), ServiceError> {
    let booking = state
        .services
        .bookings
        .create(auth_user.user_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Booking created successfully",
            booking,
        )),
    ))
}

/// The caller's bookings, newest first
#[utoipa::path(
    get,
    path = "/bookings/my-bookings",
    params(("status" = Option<String>, Query, description = "active, completed or cancelled")),
    responses(
        (status = 200, description = "Bookings", body = ApiResponse<Vec<BookingResponse>>),
    ),
    security(("Bearer" = []))
)]
pub async fn my_bookings(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<MyBookingsQuery>,
) -> Result<Json<ApiResponse<Vec<BookingResponse>>>, ServiceError> {
    let bookings = state
        .services
        .bookings
        .list_mine(auth_user.user_id, query)
        .await?;
    Ok(Json(ApiResponse::with_count(bookings)))
}

/// All bookings, filterable; intended for administrative use
#[utoipa::path(
    get,
    path = "/bookings",
    params(
        ("status" = Option<String>, Query, description = "active, completed or cancelled"),
        ("location_id" = Option<String>, Query, description = "Filter by location"),
        ("start_date" = Option<String>, Query, description = "Creation-time lower bound (RFC 3339)"),
        ("end_date" = Option<String>, Query, description = "Creation-time upper bound (RFC 3339)"),
    ),
    responses(
        (status = 200, description = "Bookings", body = ApiResponse<Vec<BookingResponse>>),
    ),
    security(("Bearer" = []))
)]
pub async fn list_all_bookings(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<ApiResponse<Vec<BookingResponse>>>, ServiceError> {
    let bookings = state.services.bookings.list_all(query).await?;
    Ok(Json(ApiResponse::with_count(bookings)))
}

/// A single booking, owner only
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking", body = ApiResponse<BookingResponse>),
        (status = 403, description = "Not the booking's owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown booking", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_booking(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BookingResponse>>, ServiceError> {
    let id = parse_id(&id)?;
    let booking = state.services.bookings.get(auth_user.user_id, id).await?;
    Ok(Json(ApiResponse::success(booking)))
}

/// Cancel an active booking and release its slot
#[utoipa::path(
    put,
    path = "/bookings/{id}/cancel",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Cancelled booking", body = ApiResponse<BookingResponse>),
        (status = 403, description = "Not the booking's owner", body = crate::errors::ErrorResponse),
        (status = 409, description = "Already cancelled or completed", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BookingResponse>>, ServiceError> {
    let id = parse_id(&id)?;
    let booking = state
        .services
        .bookings
        .cancel(auth_user.user_id, id)
        .await?;
    Ok(Json(ApiResponse::with_message(
        "Booking cancelled successfully",
        booking,
    )))
}

/// Check in to an active booking
#[utoipa::path(
    put,
    path = "/bookings/{id}/checkin",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Checked in", body = ApiResponse<BookingResponse>),
        (status = 409, description = "Not active or already checked in", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn check_in_booking(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BookingResponse>>, ServiceError> {
    let id = parse_id(&id)?;
    let booking = state
        .services
        .bookings
        .check_in(auth_user.user_id, id)
        .await?;
    Ok(Json(ApiResponse::with_message(
        "Checked in successfully",
        booking,
    )))
}

/// Check out, completing the booking and releasing its slot
#[utoipa::path(
    put,
    path = "/bookings/{id}/checkout",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Checked out", body = ApiResponse<BookingResponse>),
        (status = 409, description = "No prior check-in or already checked out", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn check_out_booking(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BookingResponse>>, ServiceError> {
    let id = parse_id(&id)?;
    let booking = state
        .services
        .bookings
        .check_out(auth_user.user_id, id)
        .await?;
    Ok(Json(ApiResponse::with_message(
        "Checked out successfully",
        booking,
    )))
}
