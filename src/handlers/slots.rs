use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};

use crate::auth::AuthRouterExt;
use crate::entities::slot;
use crate::errors::ServiceError;
use crate::handlers::parse_id;
use crate::services::slots::{
    BulkCreateSlotsRequest, CreateSlotRequest, FloorLayoutResponse, SetSlotStatusRequest,
    SlotFilterQuery, UpdateSlotRequest,
};
use crate::{ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/location/:location_id", get(list_slots))
        .route("/location/:location_id/available", get(list_available_slots))
        .route("/location/:location_id/floors", get(list_floors))
        .route("/location/:location_id/floor/:floor_name", get(floor_layout))
        .route("/:id", get(get_slot));

    let protected = Router::new()
        .route("/", axum::routing::post(create_slot))
        .route("/bulk", axum::routing::post(bulk_create_slots))
        .route("/:id/status", axum::routing::put(set_slot_status))
        .route("/:id", axum::routing::put(update_slot).delete(delete_slot))
        .with_auth();

    public.merge(protected)
}

/// Slots at a location, ascending slot-number order
#[utoipa::path(
    get,
    path = "/slots/location/{location_id}",
    params(
        ("location_id" = String, Path, description = "Location id"),
        ("vehicle_type" = Option<String>, Query, description = "car or bike"),
        ("available" = Option<bool>, Query, description = "Filter by availability"),
        ("floor" = Option<String>, Query, description = "Filter by floor label"),
    ),
    responses(
        (status = 200, description = "Matching slots", body = ApiResponse<Vec<slot::Model>>),
    )
)]
pub async fn list_slots(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
    Query(query): Query<SlotFilterQuery>,
) -> Result<Json<ApiResponse<Vec<slot::Model>>>, ServiceError> {
    let location_id = parse_id(&location_id)?;
    let slots = state
        .services
        .slots
        .list_by_location(location_id, query)
        .await?;
    Ok(Json(ApiResponse::with_count(slots)))
}

/// Available slots at a location
#[utoipa::path(
    get,
    path = "/slots/location/{location_id}/available",
    params(
        ("location_id" = String, Path, description = "Location id"),
        ("vehicle_type" = Option<String>, Query, description = "car or bike"),
        ("floor" = Option<String>, Query, description = "Filter by floor label"),
    ),
    responses(
        (status = 200, description = "Available slots", body = ApiResponse<Vec<slot::Model>>),
    )
)]
pub async fn list_available_slots(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
    Query(query): Query<SlotFilterQuery>,
) -> Result<Json<ApiResponse<Vec<slot::Model>>>, ServiceError> {
    let location_id = parse_id(&location_id)?;
    let slots = state
        .services
        .slots
        .list_available(location_id, query)
        .await?;
    Ok(Json(ApiResponse::with_count(slots)))
}

/// Floor labels in use at a location
#[utoipa::path(
    get,
    path = "/slots/location/{location_id}/floors",
    params(("location_id" = String, Path, description = "Location id")),
    responses(
        (status = 200, description = "Sorted floor labels", body = ApiResponse<Vec<String>>),
    )
)]
pub async fn list_floors(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<String>>>, ServiceError> {
    let location_id = parse_id(&location_id)?;
    let floors = state.services.slots.floors(location_id).await?;
    Ok(Json(ApiResponse::with_count(floors)))
}

/// Row/position grid of one floor with aggregate stats
#[utoipa::path(
    get,
    path = "/slots/location/{location_id}/floor/{floor_name}",
    params(
        ("location_id" = String, Path, description = "Location id"),
        ("floor_name" = String, Path, description = "Floor label"),
    ),
    responses(
        (status = 200, description = "Floor layout", body = ApiResponse<FloorLayoutResponse>),
        (status = 404, description = "No slots on this floor", body = crate::errors::ErrorResponse),
    )
)]
pub async fn floor_layout(
    State(state): State<AppState>,
    Path((location_id, floor_name)): Path<(String, String)>,
) -> Result<Json<ApiResponse<FloorLayoutResponse>>, ServiceError> {
    let location_id = parse_id(&location_id)?;
    let layout = state
        .services
        .slots
        .floor_layout(location_id, &floor_name)
        .await?;
    Ok(Json(ApiResponse::success(layout)))
}

/// A single slot
#[utoipa::path(
    get,
    path = "/slots/{id}",
    params(("id" = String, Path, description = "Slot id")),
    responses(
        (status = 200, description = "Slot", body = ApiResponse<slot::Model>),
        (status = 404, description = "Unknown slot", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_slot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<slot::Model>>, ServiceError> {
    let id = parse_id(&id)?;
    let slot = state.services.slots.get(id).await?;
    Ok(Json(ApiResponse::success(slot)))
}

/// Create a slot
#[utoipa::path(
    post,
    path = "/slots",
    request_body = CreateSlotRequest,
    responses(
        (status = 201, description = "Slot created", body = ApiResponse<slot::Model>),
        (status = 404, description = "Unknown location", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate slot number", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_slot(
    State(state): State<AppState>,
    Json(request): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<slot::Model>>), ServiceError> {
    let created = state.services.slots.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// Provision a numeric range of slots in one call
#[utoipa::path(
    post,
    path = "/slots/bulk",
    request_body = BulkCreateSlotsRequest,
    responses(
        (status = 201, description = "Slots created", body = ApiResponse<Vec<slot::Model>>),
        (status = 409, description = "Range collides with existing numbers", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn bulk_create_slots(
    State(state): State<AppState>,
    Json(request): Json<BulkCreateSlotsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<slot::Model>>>), ServiceError> {
    let created = state.services.slots.bulk_create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::with_count(created))))
}

/// Toggle a slot's availability
#[utoipa::path(
    put,
    path = "/slots/{id}/status",
    params(("id" = String, Path, description = "Slot id")),
    request_body = SetSlotStatusRequest,
    responses(
        (status = 200, description = "Updated slot", body = ApiResponse<slot::Model>),
        (status = 404, description = "Unknown slot", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn set_slot_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetSlotStatusRequest>,
) -> Result<Json<ApiResponse<slot::Model>>, ServiceError> {
    let id = parse_id(&id)?;
    let updated = state.services.slots.set_availability(id, request).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Update slot fields
#[utoipa::path(
    put,
    path = "/slots/{id}",
    params(("id" = String, Path, description = "Slot id")),
    request_body = UpdateSlotRequest,
    responses(
        (status = 200, description = "Updated slot", body = ApiResponse<slot::Model>),
        (status = 404, description = "Unknown slot", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_slot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSlotRequest>,
) -> Result<Json<ApiResponse<slot::Model>>, ServiceError> {
    let id = parse_id(&id)?;
    let updated = state.services.slots.update(id, request).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Delete a slot
#[utoipa::path(
    delete,
    path = "/slots/{id}",
    params(("id" = String, Path, description = "Slot id")),
    responses(
        (status = 200, description = "Slot deleted"),
        (status = 404, description = "Unknown slot", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_slot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    let id = parse_id(&id)?;
    state.services.slots.delete(id).await?;
    Ok(Json(ApiResponse::message("Slot deleted successfully")))
}
