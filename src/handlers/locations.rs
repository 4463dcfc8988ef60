use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use crate::auth::AuthRouterExt;
use crate::entities::location;
use crate::errors::ServiceError;
use crate::handlers::parse_id;
use crate::services::locations::{
    CreateLocationRequest, ListLocationsQuery, LocationDetailResponse, NearbyLocationResponse,
    NearbyQuery, UpdateLocationRequest,
};
use crate::{ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_locations))
        .route("/nearby", get(nearby_locations))
        .route("/:id", get(get_location));

    let protected = Router::new()
        .route("/", axum::routing::post(create_location))
        .route(
            "/:id",
            axum::routing::put(update_location).delete(delete_location),
        )
        .with_auth();

    public.merge(protected)
}

/// List parking locations
#[utoipa::path(
    get,
    path = "/locations",
    params(
        ("type" = Option<String>, Query, description = "Filter by category"),
        ("search" = Option<String>, Query, description = "Substring match over name and address"),
    ),
    responses(
        (status = 200, description = "Locations sorted by name", body = ApiResponse<Vec<location::Model>>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<ListLocationsQuery>,
) -> Result<Json<ApiResponse<Vec<location::Model>>>, ServiceError> {
    let locations = state.services.locations.list(query).await?;
    Ok(Json(ApiResponse::with_count(locations)))
}

/// Locations within a radius of a point
#[utoipa::path(
    get,
    path = "/locations/nearby",
    params(
        ("lat" = f64, Query, description = "Latitude in degrees"),
        ("long" = f64, Query, description = "Longitude in degrees"),
        ("radius" = Option<f64>, Query, description = "Radius in km (default 10)"),
    ),
    responses(
        (status = 200, description = "Locations within the radius, nearest first", body = ApiResponse<Vec<NearbyLocationResponse>>),
        (status = 400, description = "Missing coordinates", body = crate::errors::ErrorResponse),
    )
)]
pub async fn nearby_locations(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<ApiResponse<Vec<NearbyLocationResponse>>>, ServiceError> {
    let nearby = state.services.locations.nearby(query).await?;
    Ok(Json(ApiResponse::with_count(nearby)))
}

/// Location detail with its slot inventory
#[utoipa::path(
    get,
    path = "/locations/{id}",
    params(("id" = String, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location with slots", body = ApiResponse<LocationDetailResponse>),
        (status = 404, description = "Unknown location", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<LocationDetailResponse>>, ServiceError> {
    let id = parse_id(&id)?;
    let detail = state.services.locations.get(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Create a parking location
#[utoipa::path(
    post,
    path = "/locations",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = ApiResponse<location::Model>),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(request): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<location::Model>>), ServiceError> {
    let created = state.services.locations.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// Update a parking location
#[utoipa::path(
    put,
    path = "/locations/{id}",
    params(("id" = String, Path, description = "Location id")),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Updated location", body = ApiResponse<location::Model>),
        (status = 404, description = "Unknown location", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<Json<ApiResponse<location::Model>>, ServiceError> {
    let id = parse_id(&id)?;
    let updated = state.services.locations.update(id, request).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Delete a location and every slot it owns
#[utoipa::path(
    delete,
    path = "/locations/{id}",
    params(("id" = String, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location deleted"),
        (status = 404, description = "Unknown location", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    let id = parse_id(&id)?;
    state.services.locations.delete(id).await?;
    Ok(Json(ApiResponse::message("Location deleted successfully")))
}
