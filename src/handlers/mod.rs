pub mod auth;
pub mod bookings;
pub mod locations;
pub mod slots;

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::services::bookings::BookingService;
use crate::services::locations::LocationService;
use crate::services::payment::PaymentGateway;
use crate::services::slots::SlotService;
use crate::services::users::UserService;

/// Aggregated service instances shared by all HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub users: UserService,
    pub locations: LocationService,
    pub slots: SlotService,
    pub bookings: BookingService,
    pub auth: Arc<AuthService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        auth: Arc<AuthService>,
        payment_gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            users: UserService::new(db.clone(), Some(event_sender.clone())),
            locations: LocationService::new(db.clone(), Some(event_sender.clone())),
            slots: SlotService::new(db.clone(), Some(event_sender.clone())),
            bookings: BookingService::new(db, payment_gateway, Some(event_sender)),
            auth,
        }
    }
}

/// Parse a path identifier, failing in the uniform error shape rather than
/// with the extractor's plain-text rejection.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw)
        .map_err(|_| ServiceError::ValidationError(format!("Invalid identifier '{}'", raw)))
}
