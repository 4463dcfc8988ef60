use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{location, slot, VehicleType};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::locations::refresh_available_count;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SlotFilterQuery {
    pub vehicle_type: Option<String>,
    pub available: Option<bool>,
    pub floor: Option<String>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateSlotRequest {
    pub location_id: Option<Uuid>,
    pub slot_number: Option<String>,
    /// One of: car, bike
    pub vehicle_type: Option<String>,
    pub price_per_hour: Option<Decimal>,
    pub floor: Option<String>,
    pub row: Option<String>,
    pub position: Option<i32>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_handicapped: bool,
    #[serde(default)]
    pub is_near_entrance: bool,
    #[serde(default)]
    pub is_near_exit: bool,
    #[serde(default)]
    pub is_near_lift: bool,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct BulkCreateSlotsRequest {
    pub location_id: Option<Uuid>,
    pub slot_prefix: Option<String>,
    pub start_number: Option<i32>,
    pub end_number: Option<i32>,
    pub vehicle_type: Option<String>,
    pub price_per_hour: Option<Decimal>,
    pub floor: Option<String>,
    pub row: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_handicapped: bool,
    #[serde(default)]
    pub is_near_entrance: bool,
    #[serde(default)]
    pub is_near_exit: bool,
    #[serde(default)]
    pub is_near_lift: bool,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateSlotRequest {
    pub slot_number: Option<String>,
    pub vehicle_type: Option<String>,
    pub price_per_hour: Option<Decimal>,
    pub floor: Option<String>,
    pub row: Option<String>,
    pub position: Option<i32>,
    pub is_premium: Option<bool>,
    pub is_handicapped: Option<bool>,
    pub is_near_entrance: Option<bool>,
    pub is_near_exit: Option<bool>,
    pub is_near_lift: Option<bool>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SetSlotStatusRequest {
    pub is_available: Option<bool>,
}

/// Aggregate counts for one floor of a location.
#[derive(Debug, Serialize, PartialEq, Eq, utoipa::ToSchema)]
pub struct FloorStats {
    pub total: usize,
    pub available: usize,
    pub booked: usize,
    pub handicapped: usize,
    pub near_entrance: usize,
    pub near_exit: usize,
    pub car_slots: usize,
    pub bike_slots: usize,
}

/// Row/position grid of a floor. Rows sort lexicographically; slots within a
/// row sort by position.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FloorLayoutResponse {
    pub floor: String,
    pub rows: Vec<String>,
    pub slots_by_row: BTreeMap<String, Vec<slot::Model>>,
    pub stats: FloorStats,
}

fn parse_vehicle_type(raw: &str) -> Result<VehicleType, ServiceError> {
    VehicleType::from_str(raw).map_err(|_| {
        ServiceError::ValidationError(format!(
            "Invalid vehicle type '{}'; expected car or bike",
            raw
        ))
    })
}

/// Registry of physical parking spaces.
#[derive(Clone)]
pub struct SlotService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl SlotService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Slots for a location in ascending slot-number order, with optional
    /// vehicle-type / availability / floor filters.
    #[instrument(skip(self))]
    pub async fn list_by_location(
        &self,
        location_id: Uuid,
        query: SlotFilterQuery,
    ) -> Result<Vec<slot::Model>, ServiceError> {
        let db = &*self.db_pool;

        let mut finder = slot::Entity::find().filter(slot::Column::LocationId.eq(location_id));

        if let Some(raw) = query.vehicle_type.as_deref() {
            let vehicle_type = parse_vehicle_type(raw)?;
            finder = finder.filter(slot::Column::VehicleType.eq(vehicle_type.as_str()));
        }
        if let Some(available) = query.available {
            finder = finder.filter(slot::Column::IsAvailable.eq(available));
        }
        if let Some(floor) = query.floor.as_deref() {
            finder = finder.filter(slot::Column::Floor.eq(floor));
        }

        let slots = finder
            .order_by_asc(slot::Column::SlotNumber)
            .all(db)
            .await?;
        Ok(slots)
    }

    /// Same as [`list_by_location`] with availability forced true.
    #[instrument(skip(self))]
    pub async fn list_available(
        &self,
        location_id: Uuid,
        mut query: SlotFilterQuery,
    ) -> Result<Vec<slot::Model>, ServiceError> {
        query.available = Some(true);
        self.list_by_location(location_id, query).await
    }

    /// Distinct floor labels in use at a location, sorted.
    #[instrument(skip(self))]
    pub async fn floors(&self, location_id: Uuid) -> Result<Vec<String>, ServiceError> {
        let db = &*self.db_pool;

        let mut floors: Vec<String> = slot::Entity::find()
            .filter(slot::Column::LocationId.eq(location_id))
            .select_only()
            .column(slot::Column::Floor)
            .distinct()
            .into_tuple()
            .all(db)
            .await?;

        floors.sort();
        Ok(floors)
    }

    /// Grid view of one floor. Fails with NotFound when the floor has no
    /// slots — no partial rows are returned.
    #[instrument(skip(self))]
    pub async fn floor_layout(
        &self,
        location_id: Uuid,
        floor: &str,
    ) -> Result<FloorLayoutResponse, ServiceError> {
        let db = &*self.db_pool;

        let slots = slot::Entity::find()
            .filter(slot::Column::LocationId.eq(location_id))
            .filter(slot::Column::Floor.eq(floor))
            .order_by_asc(slot::Column::Row)
            .order_by_asc(slot::Column::Position)
            .all(db)
            .await?;

        if slots.is_empty() {
            return Err(ServiceError::NotFound(
                "No slots found for this floor".to_string(),
            ));
        }

        let stats = FloorStats {
            total: slots.len(),
            available: slots.iter().filter(|s| s.is_available).count(),
            booked: slots.iter().filter(|s| !s.is_available).count(),
            handicapped: slots.iter().filter(|s| s.is_handicapped).count(),
            near_entrance: slots.iter().filter(|s| s.is_near_entrance).count(),
            near_exit: slots.iter().filter(|s| s.is_near_exit).count(),
            car_slots: slots
                .iter()
                .filter(|s| s.vehicle_type == VehicleType::Car.as_str())
                .count(),
            bike_slots: slots
                .iter()
                .filter(|s| s.vehicle_type == VehicleType::Bike.as_str())
                .count(),
        };

        // BTreeMap keeps rows lexicographically ordered; slots arrive sorted
        // by (row, position) so per-row order is position ascending
        let mut slots_by_row: BTreeMap<String, Vec<slot::Model>> = BTreeMap::new();
        for slot in slots {
            slots_by_row.entry(slot.row.clone()).or_default().push(slot);
        }
        let rows: Vec<String> = slots_by_row.keys().cloned().collect();

        Ok(FloorLayoutResponse {
            floor: floor.to_string(),
            rows,
            slots_by_row,
            stats,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<slot::Model, ServiceError> {
        let db = &*self.db_pool;
        slot::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Slot not found".to_string()))
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: CreateSlotRequest) -> Result<slot::Model, ServiceError> {
        request.validate()?;

        let (location_id, slot_number, raw_vehicle_type, price_per_hour, row, position) = match (
            request.location_id,
            request.slot_number,
            request.vehicle_type,
            request.price_per_hour,
            request.row,
            request.position,
        ) {
            (
                Some(location_id),
                Some(slot_number),
                Some(vehicle_type),
                Some(price_per_hour),
                Some(row),
                Some(position),
            ) => (
                location_id,
                slot_number,
                vehicle_type,
                price_per_hour,
                row,
                position,
            ),
            _ => {
                return Err(ServiceError::ValidationError(
                    "Please provide all required fields: location_id, slot_number, vehicle_type, price_per_hour, row, position"
                        .to_string(),
                ))
            }
        };

        let vehicle_type = parse_vehicle_type(&raw_vehicle_type)?;
        let db = &*self.db_pool;

        location::Entity::find_by_id(location_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Location not found".to_string()))?;

        let existing = slot::Entity::find()
            .filter(slot::Column::LocationId.eq(location_id))
            .filter(slot::Column::SlotNumber.eq(slot_number.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "Slot number already exists for this location".to_string(),
            ));
        }

        let txn = db.begin().await?;
        let created = slot::ActiveModel {
            location_id: Set(location_id),
            slot_number: Set(slot_number),
            floor: Set(request.floor.unwrap_or_else(|| "Ground".to_string())),
            row: Set(row),
            position: Set(position),
            vehicle_type: Set(vehicle_type.as_str().to_string()),
            price_per_hour: Set(price_per_hour),
            is_available: Set(true),
            is_premium: Set(request.is_premium),
            is_handicapped: Set(request.is_handicapped),
            is_near_entrance: Set(request.is_near_entrance),
            is_near_exit: Set(request.is_near_exit),
            is_near_lift: Set(request.is_near_lift),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        refresh_available_count(&txn, location_id).await?;
        txn.commit().await?;

        info!(slot_id = %created.id, location_id = %location_id, "slot created");

        if let Some(events) = &self.event_sender {
            let _ = events.send(Event::SlotCreated(created.id)).await;
        }

        Ok(created)
    }

    /// Provision one slot per integer in the inclusive range, all sharing
    /// vehicle type, price, floor, row, and feature flags. The whole request
    /// fails with Conflict if any generated number already exists.
    #[instrument(skip(self, request))]
    pub async fn bulk_create(
        &self,
        request: BulkCreateSlotsRequest,
    ) -> Result<Vec<slot::Model>, ServiceError> {
        request.validate()?;

        let (location_id, slot_prefix, start_number, end_number, raw_vehicle_type, price, row) =
            match (
                request.location_id,
                request.slot_prefix,
                request.start_number,
                request.end_number,
                request.vehicle_type,
                request.price_per_hour,
                request.row,
            ) {
                (
                    Some(location_id),
                    Some(slot_prefix),
                    Some(start_number),
                    Some(end_number),
                    Some(vehicle_type),
                    Some(price),
                    Some(row),
                ) => (
                    location_id,
                    slot_prefix,
                    start_number,
                    end_number,
                    vehicle_type,
                    price,
                    row,
                ),
                _ => {
                    return Err(ServiceError::ValidationError(
                        "Please provide all required fields: location_id, slot_prefix, start_number, end_number, vehicle_type, price_per_hour, row"
                            .to_string(),
                    ))
                }
            };

        if start_number > end_number {
            return Err(ServiceError::ValidationError(
                "start_number must not exceed end_number".to_string(),
            ));
        }

        let vehicle_type = parse_vehicle_type(&raw_vehicle_type)?;
        let db = &*self.db_pool;

        location::Entity::find_by_id(location_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Location not found".to_string()))?;

        let numbers: Vec<String> = (start_number..=end_number)
            .map(|i| format!("{}{}", slot_prefix, i))
            .collect();

        let clashes = slot::Entity::find()
            .filter(slot::Column::LocationId.eq(location_id))
            .filter(slot::Column::SlotNumber.is_in(numbers.clone()))
            .all(db)
            .await?;
        if !clashes.is_empty() {
            return Err(ServiceError::Conflict(format!(
                "Slot numbers already exist for this location: {}",
                clashes
                    .iter()
                    .map(|s| s.slot_number.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let floor = request.floor.unwrap_or_else(|| "Ground".to_string());
        let now = Utc::now();

        // insert_many bypasses ActiveModelBehavior, so ids and timestamps are
        // assigned here
        let rows_to_insert: Vec<slot::ActiveModel> = (start_number..=end_number)
            .map(|i| slot::ActiveModel {
                id: Set(Uuid::new_v4()),
                location_id: Set(location_id),
                slot_number: Set(format!("{}{}", slot_prefix, i)),
                floor: Set(floor.clone()),
                row: Set(row.clone()),
                position: Set(i),
                vehicle_type: Set(vehicle_type.as_str().to_string()),
                price_per_hour: Set(price),
                is_available: Set(true),
                is_premium: Set(request.is_premium),
                is_handicapped: Set(request.is_handicapped),
                is_near_entrance: Set(request.is_near_entrance),
                is_near_exit: Set(request.is_near_exit),
                is_near_lift: Set(request.is_near_lift),
                created_at: Set(now),
                updated_at: Set(None),
            })
            .collect();
        let count = rows_to_insert.len();

        let txn = db.begin().await?;
        slot::Entity::insert_many(rows_to_insert).exec(&txn).await?;
        refresh_available_count(&txn, location_id).await?;
        txn.commit().await?;

        info!(location_id = %location_id, count, "bulk slots created");

        if let Some(events) = &self.event_sender {
            let _ = events
                .send(Event::SlotsBulkCreated { location_id, count })
                .await;
        }

        let created = slot::Entity::find()
            .filter(slot::Column::LocationId.eq(location_id))
            .filter(slot::Column::SlotNumber.is_in(numbers))
            .order_by_asc(slot::Column::Position)
            .all(db)
            .await?;

        Ok(created)
    }

    /// Flip a slot's availability and refresh the owning location's counter
    /// in the same transaction.
    #[instrument(skip(self))]
    pub async fn set_availability(
        &self,
        id: Uuid,
        request: SetSlotStatusRequest,
    ) -> Result<slot::Model, ServiceError> {
        let is_available = request.is_available.ok_or_else(|| {
            ServiceError::ValidationError("Please provide is_available".to_string())
        })?;

        let db = &*self.db_pool;
        let slot = slot::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Slot not found".to_string()))?;
        let location_id = slot.location_id;

        let txn = db.begin().await?;
        let mut active: slot::ActiveModel = slot.into();
        active.is_available = Set(is_available);
        let updated = active.update(&txn).await?;
        refresh_available_count(&txn, location_id).await?;
        txn.commit().await?;

        if let Some(events) = &self.event_sender {
            let _ = events
                .send(Event::SlotAvailabilityChanged {
                    slot_id: id,
                    is_available,
                })
                .await;
        }

        Ok(updated)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateSlotRequest,
    ) -> Result<slot::Model, ServiceError> {
        let db = &*self.db_pool;

        let slot = slot::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Slot not found".to_string()))?;

        if let Some(new_number) = request.slot_number.as_deref() {
            if new_number != slot.slot_number {
                let clash = slot::Entity::find()
                    .filter(slot::Column::LocationId.eq(slot.location_id))
                    .filter(slot::Column::SlotNumber.eq(new_number))
                    .one(db)
                    .await?;
                if clash.is_some() {
                    return Err(ServiceError::Conflict(
                        "Slot number already exists for this location".to_string(),
                    ));
                }
            }
        }

        let mut active: slot::ActiveModel = slot.into();
        if let Some(slot_number) = request.slot_number {
            active.slot_number = Set(slot_number);
        }
        if let Some(raw) = request.vehicle_type {
            active.vehicle_type = Set(parse_vehicle_type(&raw)?.as_str().to_string());
        }
        if let Some(price) = request.price_per_hour {
            active.price_per_hour = Set(price);
        }
        if let Some(floor) = request.floor {
            active.floor = Set(floor);
        }
        if let Some(row) = request.row {
            active.row = Set(row);
        }
        if let Some(position) = request.position {
            active.position = Set(position);
        }
        if let Some(flag) = request.is_premium {
            active.is_premium = Set(flag);
        }
        if let Some(flag) = request.is_handicapped {
            active.is_handicapped = Set(flag);
        }
        if let Some(flag) = request.is_near_entrance {
            active.is_near_entrance = Set(flag);
        }
        if let Some(flag) = request.is_near_exit {
            active.is_near_exit = Set(flag);
        }
        if let Some(flag) = request.is_near_lift {
            active.is_near_lift = Set(flag);
        }

        let updated = active.update(db).await?;
        Ok(updated)
    }

    /// Remove a slot. Permitted regardless of booking state; the location
    /// counter is refreshed so it keeps mirroring the remaining slots.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let slot = slot::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Slot not found".to_string()))?;
        let location_id = slot.location_id;

        let txn = db.begin().await?;
        slot::Entity::delete_by_id(slot.id).exec(&txn).await?;
        refresh_available_count(&txn, location_id).await?;
        txn.commit().await?;

        info!(slot_id = %id, "slot deleted");
        Ok(())
    }
}
