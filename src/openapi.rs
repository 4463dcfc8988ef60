use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Parkwise API",
        version = "0.1.0",
        description = "Parking-space discovery, floor-layout browsing, slot reservation, and QR-coded bookings.\n\nAuthenticate with `Authorization: Bearer <token>` obtained from `/auth/signup` or `/auth/login`."
    ),
    paths(
        crate::handlers::auth::signup,
        crate::handlers::auth::login,
        crate::handlers::auth::get_profile,
        crate::handlers::auth::update_profile,
        crate::handlers::auth::logout,
        crate::handlers::locations::list_locations,
        crate::handlers::locations::nearby_locations,
        crate::handlers::locations::get_location,
        crate::handlers::locations::create_location,
        crate::handlers::locations::update_location,
        crate::handlers::locations::delete_location,
        crate::handlers::slots::list_slots,
        crate::handlers::slots::list_available_slots,
        crate::handlers::slots::list_floors,
        crate::handlers::slots::floor_layout,
        crate::handlers::slots::get_slot,
        crate::handlers::slots::create_slot,
        crate::handlers::slots::bulk_create_slots,
        crate::handlers::slots::set_slot_status,
        crate::handlers::slots::update_slot,
        crate::handlers::slots::delete_slot,
        crate::handlers::bookings::create_booking,
        crate::handlers::bookings::my_bookings,
        crate::handlers::bookings::list_all_bookings,
        crate::handlers::bookings::get_booking,
        crate::handlers::bookings::cancel_booking,
        crate::handlers::bookings::check_in_booking,
        crate::handlers::bookings::check_out_booking,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        entities::location::Model,
        entities::slot::Model,
        entities::booking::Model,
        entities::LocationCategory,
        entities::VehicleType,
        entities::BookingStatus,
        entities::PaymentStatus,
        entities::PaymentMethod,
        services::geo::Coordinates,
        services::qr::QrPayload,
        services::users::SignupRequest,
        services::users::LoginRequest,
        services::users::UpdateProfileRequest,
        services::users::UserResponse,
        services::locations::PriceSchedule,
        services::locations::CreateLocationRequest,
        services::locations::UpdateLocationRequest,
        services::locations::LocationDetailResponse,
        services::locations::NearbyLocationResponse,
        services::slots::CreateSlotRequest,
        services::slots::BulkCreateSlotsRequest,
        services::slots::UpdateSlotRequest,
        services::slots::SetSlotStatusRequest,
        services::slots::FloorStats,
        services::slots::FloorLayoutResponse,
        services::bookings::CreateBookingRequest,
        services::bookings::BookingResponse,
        services::bookings::LocationSummary,
        services::bookings::SlotSummary,
        services::bookings::UserSummary,
        crate::handlers::auth::AuthResponse,
        crate::handlers::auth::ProfileResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Accounts and sessions"),
        (name = "locations", description = "Parking sites"),
        (name = "slots", description = "Physical parking spaces"),
        (name = "bookings", description = "Reservations"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI mounted at /docs, serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
