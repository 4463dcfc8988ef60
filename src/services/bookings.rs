use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{
    booking, location, slot, user, BookingStatus, PaymentMethod, PaymentStatus, VehicleType,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::geo::Coordinates;
use crate::services::locations::refresh_available_count;
use crate::services::payment::PaymentGateway;
use crate::services::qr::{self, QrPayload};

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateBookingRequest {
    pub location_id: Option<Uuid>,
    pub slot_id: Option<Uuid>,
    /// One of: car, bike — must match the slot
    pub vehicle_type: Option<String>,
    pub vehicle_number: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    /// Whole hours, at least 1
    #[validate(range(min = 1, message = "Duration must be at least 1 hour"))]
    pub duration: Option<i32>,
    /// Defaults to upi
    pub payment_method: Option<String>,
    /// Client-supplied replay token; retrying with the same key returns the
    /// original booking instead of charging again
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct MyBookingsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ListBookingsQuery {
    pub status: Option<String>,
    pub location_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LocationSummary {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    pub category: String,
}

impl From<&location::Model> for LocationSummary {
    fn from(model: &location::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            address: model.address.clone(),
            coordinates: Coordinates {
                latitude: model.latitude,
                longitude: model.longitude,
            },
            category: model.category.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SlotSummary {
    pub id: Uuid,
    pub slot_number: String,
    pub floor: String,
    pub vehicle_type: String,
}

impl From<&slot::Model> for SlotSummary {
    fn from(model: &slot::Model) -> Self {
        Self {
            id: model.id,
            slot_number: model.slot_number.clone(),
            floor: model.floor.clone(),
            vehicle_type: model.vehicle_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<&user::Model> for UserSummary {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            email: model.email.clone(),
            phone: model.phone.clone(),
        }
    }
}

/// Booking joined with summaries of the entities it references.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BookingResponse {
    pub id: Uuid,
    pub status: String,
    pub vehicle_type: String,
    pub vehicle_number: String,
    pub booking_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_hours: i32,
    pub total_amount: Decimal,
    pub payment_status: String,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub qr_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl BookingResponse {
    fn from_model(
        model: &booking::Model,
        location: Option<LocationSummary>,
        slot: Option<SlotSummary>,
        user: Option<UserSummary>,
    ) -> Self {
        Self {
            id: model.id,
            status: model.status.clone(),
            vehicle_type: model.vehicle_type.clone(),
            vehicle_number: model.vehicle_number.clone(),
            booking_time: model.booking_time,
            start_time: model.start_time,
            end_time: model.end_time,
            duration_hours: model.duration_hours,
            total_amount: model.total_amount,
            payment_status: model.payment_status.clone(),
            payment_method: model.payment_method.clone(),
            transaction_id: model.transaction_id.clone(),
            qr_code: model.qr_code.clone(),
            check_in_time: model.check_in_time,
            check_out_time: model.check_out_time,
            location,
            slot,
            user,
        }
    }
}

fn parse_status_filter(raw: &str) -> Result<BookingStatus, ServiceError> {
    BookingStatus::parse(raw).ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "Invalid booking status '{}'; expected active, completed or cancelled",
            raw
        ))
    })
}

/// Put a slot back in the pool and refresh the owning location's counter.
async fn release_slot<C: ConnectionTrait>(
    db: &C,
    slot_id: Uuid,
    location_id: Uuid,
) -> Result<(), ServiceError> {
    slot::Entity::update_many()
        .col_expr(slot::Column::IsAvailable, Expr::value(true))
        .filter(slot::Column::Id.eq(slot_id))
        .exec(db)
        .await?;
    refresh_available_count(db, location_id).await?;
    Ok(())
}

/// Orchestrates the reservation workflow across the slot and location
/// registries, the payment gateway, and the booking store.
#[derive(Clone)]
pub struct BookingService {
    db_pool: Arc<DbPool>,
    payment_gateway: Arc<dyn PaymentGateway>,
    event_sender: Option<Arc<EventSender>>,
}

impl BookingService {
    pub fn new(
        db_pool: Arc<DbPool>,
        payment_gateway: Arc<dyn PaymentGateway>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db_pool,
            payment_gateway,
            event_sender,
        }
    }

    /// Create a booking.
    ///
    /// Validation order: required fields, location exists, slot exists, slot
    /// available, vehicle type matches. Payment runs next, before anything is
    /// written. The durable step then claims the slot with a conditional
    /// update, inserts the booking, and refreshes the location counter in one
    /// transaction — under concurrency exactly one caller wins the slot and
    /// the rest fail with Conflict.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateBookingRequest,
    ) -> Result<BookingResponse, ServiceError> {
        request.validate()?;

        let (location_id, slot_id, raw_vehicle_type, vehicle_number, start_time, duration) =
            match (
                request.location_id,
                request.slot_id,
                request.vehicle_type.clone(),
                request.vehicle_number.clone(),
                request.start_time,
                request.duration,
            ) {
                (
                    Some(location_id),
                    Some(slot_id),
                    Some(vehicle_type),
                    Some(vehicle_number),
                    Some(start_time),
                    Some(duration),
                ) => (
                    location_id,
                    slot_id,
                    vehicle_type,
                    vehicle_number,
                    start_time,
                    duration,
                ),
                _ => {
                    return Err(ServiceError::ValidationError(
                        "Please provide all required fields: location_id, slot_id, vehicle_type, vehicle_number, start_time, duration"
                            .to_string(),
                    ))
                }
            };

        let vehicle_type = VehicleType::from_str(&raw_vehicle_type).map_err(|_| {
            ServiceError::ValidationError(format!(
                "Invalid vehicle type '{}'; expected car or bike",
                raw_vehicle_type
            ))
        })?;
        let payment_method = match request.payment_method.as_deref() {
            Some(raw) => PaymentMethod::parse(raw).ok_or_else(|| {
                ServiceError::ValidationError(format!("Invalid payment method '{}'", raw))
            })?,
            None => PaymentMethod::Upi,
        };

        let db = &*self.db_pool;

        // A replayed idempotency key resolves to the original booking with no
        // second charge
        if let Some(key) = request.idempotency_key.as_deref() {
            let existing = booking::Entity::find()
                .filter(booking::Column::UserId.eq(user_id))
                .filter(booking::Column::IdempotencyKey.eq(key))
                .one(db)
                .await?;
            if let Some(existing) = existing {
                info!(booking_id = %existing.id, "idempotency key replay; returning existing booking");
                return self.joined_view(&existing, true).await;
            }
        }

        let location = location::Entity::find_by_id(location_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Location not found".to_string()))?;

        let slot = slot::Entity::find_by_id(slot_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Slot not found".to_string()))?;

        if !slot.is_available {
            return Err(ServiceError::Conflict("Slot is not available".to_string()));
        }

        if slot.vehicle_type != vehicle_type.as_str() {
            return Err(ServiceError::Conflict(format!(
                "This slot is only available for {}",
                slot.vehicle_type
            )));
        }

        let total_amount = slot.price_per_hour * Decimal::from(duration);
        let end_time = start_time + ChronoDuration::hours(i64::from(duration));
        let vehicle_number = vehicle_number.trim().to_uppercase();

        // Payment sits on the critical path before any durable write; a
        // decline aborts with nothing persisted
        let receipt = self
            .payment_gateway
            .charge(total_amount, payment_method)
            .await?;

        let booking_id = Uuid::new_v4();
        let qr_code = qr::encode(&QrPayload {
            booking_id,
            user_id,
            location_id,
            slot_number: slot.slot_number.clone(),
            vehicle_number: vehicle_number.clone(),
            start_time,
            end_time,
            amount: total_amount,
        })?;

        let txn = db.begin().await?;

        // Conditional claim: only the caller that observes is_available=true
        // inside the transaction gets the slot
        let reserved = slot::Entity::update_many()
            .col_expr(slot::Column::IsAvailable, Expr::value(false))
            .filter(slot::Column::Id.eq(slot_id))
            .filter(slot::Column::IsAvailable.eq(true))
            .exec(&txn)
            .await?;
        if reserved.rows_affected == 0 {
            txn.rollback().await?;
            warn!(slot_id = %slot_id, "slot claimed by a concurrent booking");
            return Err(ServiceError::Conflict("Slot is not available".to_string()));
        }

        let now = Utc::now();
        let created = booking::ActiveModel {
            id: Set(booking_id),
            user_id: Set(user_id),
            location_id: Set(location_id),
            slot_id: Set(slot_id),
            vehicle_type: Set(vehicle_type.as_str().to_string()),
            vehicle_number: Set(vehicle_number),
            booking_time: Set(now),
            start_time: Set(start_time),
            end_time: Set(end_time),
            duration_hours: Set(duration),
            total_amount: Set(total_amount),
            payment_status: Set(PaymentStatus::Success.as_str().to_string()),
            payment_method: Set(payment_method.as_str().to_string()),
            transaction_id: Set(Some(receipt.transaction_id)),
            qr_code: Set(qr_code),
            status: Set(BookingStatus::Active.as_str().to_string()),
            check_in_time: Set(None),
            check_out_time: Set(None),
            idempotency_key: Set(request.idempotency_key),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        refresh_available_count(&txn, location_id).await?;
        txn.commit().await?;

        info!(booking_id = %created.id, slot_id = %slot_id, "booking created");

        if let Some(events) = &self.event_sender {
            let _ = events
                .send(Event::BookingCreated {
                    booking_id: created.id,
                    slot_id,
                    location_id,
                })
                .await;
        }

        let slot_summary = SlotSummary::from(&slot);
        let location_summary = LocationSummary::from(&location);
        let user_summary = user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .as_ref()
            .map(UserSummary::from);

        Ok(BookingResponse::from_model(
            &created,
            Some(location_summary),
            Some(slot_summary),
            user_summary,
        ))
    }

    /// Cancel an active booking, refund its payment record, and release the
    /// slot.
    #[instrument(skip(self), fields(user_id = %user_id, booking_id = %booking_id))]
    pub async fn cancel(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<BookingResponse, ServiceError> {
        let db = &*self.db_pool;

        let booking = self.find_owned(user_id, booking_id, "cancel").await?;

        match BookingStatus::parse(&booking.status) {
            Some(BookingStatus::Cancelled) => {
                return Err(ServiceError::Conflict(
                    "Booking is already cancelled".to_string(),
                ))
            }
            Some(BookingStatus::Completed) => {
                return Err(ServiceError::Conflict(
                    "Cannot cancel completed booking".to_string(),
                ))
            }
            _ => {}
        }

        let slot_id = booking.slot_id;
        let location_id = booking.location_id;

        let txn = db.begin().await?;
        let mut active: booking::ActiveModel = booking.into();
        active.status = Set(BookingStatus::Cancelled.as_str().to_string());
        active.payment_status = Set(PaymentStatus::Refunded.as_str().to_string());
        let updated = active.update(&txn).await?;
        release_slot(&txn, slot_id, location_id).await?;
        txn.commit().await?;

        info!(booking_id = %booking_id, "booking cancelled");

        if let Some(events) = &self.event_sender {
            let _ = events.send(Event::BookingCancelled(booking_id)).await;
        }

        self.joined_view(&updated, false).await
    }

    /// Record arrival. Only an active, not-yet-checked-in booking qualifies.
    #[instrument(skip(self), fields(user_id = %user_id, booking_id = %booking_id))]
    pub async fn check_in(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<BookingResponse, ServiceError> {
        let db = &*self.db_pool;

        let booking = self.find_owned(user_id, booking_id, "check-in to").await?;

        if BookingStatus::parse(&booking.status) != Some(BookingStatus::Active) {
            return Err(ServiceError::Conflict("Booking is not active".to_string()));
        }
        if booking.check_in_time.is_some() {
            return Err(ServiceError::Conflict("Already checked in".to_string()));
        }

        let mut active: booking::ActiveModel = booking.into();
        active.check_in_time = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        if let Some(events) = &self.event_sender {
            let _ = events.send(Event::BookingCheckedIn(booking_id)).await;
        }

        self.joined_view(&updated, false).await
    }

    /// Record departure: requires a prior check-in, completes the booking,
    /// and releases the slot.
    #[instrument(skip(self), fields(user_id = %user_id, booking_id = %booking_id))]
    pub async fn check_out(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<BookingResponse, ServiceError> {
        let db = &*self.db_pool;

        let booking = self.find_owned(user_id, booking_id, "check-out from").await?;

        if BookingStatus::parse(&booking.status) != Some(BookingStatus::Active) {
            return Err(ServiceError::Conflict("Booking is not active".to_string()));
        }
        if booking.check_in_time.is_none() {
            return Err(ServiceError::Conflict("Please check-in first".to_string()));
        }
        if booking.check_out_time.is_some() {
            return Err(ServiceError::Conflict("Already checked out".to_string()));
        }

        let slot_id = booking.slot_id;
        let location_id = booking.location_id;

        let txn = db.begin().await?;
        let mut active: booking::ActiveModel = booking.into();
        active.check_out_time = Set(Some(Utc::now()));
        active.status = Set(BookingStatus::Completed.as_str().to_string());
        let updated = active.update(&txn).await?;
        release_slot(&txn, slot_id, location_id).await?;
        txn.commit().await?;

        info!(booking_id = %booking_id, "booking checked out");

        if let Some(events) = &self.event_sender {
            let _ = events.send(Event::BookingCheckedOut(booking_id)).await;
        }

        self.joined_view(&updated, false).await
    }

    /// The caller's bookings, newest first, optionally filtered by status.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_mine(
        &self,
        user_id: Uuid,
        query: MyBookingsQuery,
    ) -> Result<Vec<BookingResponse>, ServiceError> {
        let db = &*self.db_pool;

        let mut finder = booking::Entity::find().filter(booking::Column::UserId.eq(user_id));
        if let Some(raw) = query.status.as_deref() {
            let status = parse_status_filter(raw)?;
            finder = finder.filter(booking::Column::Status.eq(status.as_str()));
        }

        let bookings = finder
            .order_by_desc(booking::Column::CreatedAt)
            .all(db)
            .await?;

        self.joined_views(bookings, false).await
    }

    /// Every booking in the system, filterable by status, location, and
    /// creation-date range. Intended for administrative use.
    #[instrument(skip(self))]
    pub async fn list_all(
        &self,
        query: ListBookingsQuery,
    ) -> Result<Vec<BookingResponse>, ServiceError> {
        let db = &*self.db_pool;

        let mut finder = booking::Entity::find();
        if let Some(raw) = query.status.as_deref() {
            let status = parse_status_filter(raw)?;
            finder = finder.filter(booking::Column::Status.eq(status.as_str()));
        }
        if let Some(location_id) = query.location_id {
            finder = finder.filter(booking::Column::LocationId.eq(location_id));
        }
        if let Some(start_date) = query.start_date {
            finder = finder.filter(booking::Column::BookingTime.gte(start_date));
        }
        if let Some(end_date) = query.end_date {
            finder = finder.filter(booking::Column::BookingTime.lte(end_date));
        }

        let bookings = finder
            .order_by_desc(booking::Column::CreatedAt)
            .all(db)
            .await?;

        self.joined_views(bookings, true).await
    }

    /// A single booking, visible only to its owner.
    #[instrument(skip(self), fields(user_id = %user_id, booking_id = %booking_id))]
    pub async fn get(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<BookingResponse, ServiceError> {
        let booking = self.find_owned(user_id, booking_id, "access").await?;
        self.joined_view(&booking, true).await
    }

    /// Complete active bookings whose end time has passed without a checkout
    /// and release their slots. Run periodically from a background task.
    #[instrument(skip(self))]
    pub async fn expire_overdue(&self) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let overdue = booking::Entity::find()
            .filter(booking::Column::Status.eq(BookingStatus::Active.as_str()))
            .filter(booking::Column::EndTime.lt(now))
            .all(db)
            .await?;

        let mut expired = 0u64;
        for booking in overdue {
            let booking_id = booking.id;
            let slot_id = booking.slot_id;
            let location_id = booking.location_id;

            let txn = db.begin().await?;
            let mut active: booking::ActiveModel = booking.into();
            active.status = Set(BookingStatus::Completed.as_str().to_string());
            active.update(&txn).await?;
            release_slot(&txn, slot_id, location_id).await?;
            txn.commit().await?;

            expired += 1;
            info!(booking_id = %booking_id, "overdue booking completed by sweep");

            if let Some(events) = &self.event_sender {
                let _ = events.send(Event::BookingExpired(booking_id)).await;
            }
        }

        Ok(expired)
    }

    async fn find_owned(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        action: &str,
    ) -> Result<booking::Model, ServiceError> {
        let db = &*self.db_pool;
        let booking = booking::Entity::find_by_id(booking_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))?;

        if booking.user_id != user_id {
            return Err(ServiceError::Forbidden(format!(
                "Not authorized to {} this booking",
                action
            )));
        }

        Ok(booking)
    }

    async fn joined_view(
        &self,
        booking: &booking::Model,
        include_user: bool,
    ) -> Result<BookingResponse, ServiceError> {
        let db = &*self.db_pool;

        let location = location::Entity::find_by_id(booking.location_id)
            .one(db)
            .await?;
        let slot = slot::Entity::find_by_id(booking.slot_id).one(db).await?;
        let user = if include_user {
            user::Entity::find_by_id(booking.user_id).one(db).await?
        } else {
            None
        };

        Ok(BookingResponse::from_model(
            booking,
            location.as_ref().map(LocationSummary::from),
            slot.as_ref().map(SlotSummary::from),
            user.as_ref().map(UserSummary::from),
        ))
    }

    async fn joined_views(
        &self,
        bookings: Vec<booking::Model>,
        include_user: bool,
    ) -> Result<Vec<BookingResponse>, ServiceError> {
        let db = &*self.db_pool;

        let location_ids: Vec<Uuid> = bookings.iter().map(|b| b.location_id).collect();
        let slot_ids: Vec<Uuid> = bookings.iter().map(|b| b.slot_id).collect();
        let user_ids: Vec<Uuid> = bookings.iter().map(|b| b.user_id).collect();

        let locations: HashMap<Uuid, location::Model> = location::Entity::find()
            .filter(location::Column::Id.is_in(location_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let slots: HashMap<Uuid, slot::Model> = slot::Entity::find()
            .filter(slot::Column::Id.is_in(slot_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let users: HashMap<Uuid, user::Model> = if include_user {
            user::Entity::find()
                .filter(user::Column::Id.is_in(user_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|m| (m.id, m))
                .collect()
        } else {
            HashMap::new()
        };

        Ok(bookings
            .iter()
            .map(|b| {
                BookingResponse::from_model(
                    b,
                    locations.get(&b.location_id).map(LocationSummary::from),
                    slots.get(&b.slot_id).map(SlotSummary::from),
                    users.get(&b.user_id).map(UserSummary::from),
                )
            })
            .collect())
    }
}
