use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{location, slot, LocationCategory};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::geo::{self, Coordinates};

const DEFAULT_NEARBY_RADIUS_KM: f64 = 10.0;

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct PriceSchedule {
    pub car: Decimal,
    pub bike: Decimal,
}

impl Default for PriceSchedule {
    fn default() -> Self {
        Self {
            car: dec!(50),
            bike: dec!(20),
        }
    }
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateLocationRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
    #[validate(range(min = 0, message = "Total slots must not be negative"))]
    pub total_slots: Option<i32>,
    #[validate(range(min = 1, message = "Floors must be at least 1"))]
    pub floors: Option<i32>,
    /// One of: mall, hospital, theatre, airport, stadium, other
    #[serde(rename = "type", alias = "category")]
    pub category: Option<String>,
    pub price_per_hour: Option<PriceSchedule>,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub total_slots: Option<i32>,
    pub floors: Option<i32>,
    #[serde(rename = "type", alias = "category")]
    pub category: Option<String>,
    pub price_per_hour: Option<PriceSchedule>,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ListLocationsQuery {
    /// Filter by category
    #[serde(rename = "type")]
    pub category: Option<String>,
    /// Case-insensitive substring match over name and address
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub radius: Option<f64>,
}

/// Location detail joined with its live slot inventory. The recomputed
/// available count is reported alongside the stored counter, not persisted.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LocationDetailResponse {
    #[serde(flatten)]
    pub location: location::Model,
    pub slots: Vec<slot::Model>,
    pub actual_available_slots: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct NearbyLocationResponse {
    #[serde(flatten)]
    pub location: location::Model,
    pub distance_km: f64,
}

/// Recompute a location's `available_slots` from the slot table. Callers run
/// this inside the same transaction as the slot mutation so the counter can
/// never be observed drifting.
pub(crate) async fn refresh_available_count<C: ConnectionTrait>(
    db: &C,
    location_id: Uuid,
) -> Result<i32, ServiceError> {
    let available = slot::Entity::find()
        .filter(slot::Column::LocationId.eq(location_id))
        .filter(slot::Column::IsAvailable.eq(true))
        .count(db)
        .await? as i32;

    location::Entity::update_many()
        .col_expr(location::Column::AvailableSlots, Expr::value(available))
        .filter(location::Column::Id.eq(location_id))
        .exec(db)
        .await?;

    Ok(available)
}

/// Recount every location's availability counter. Used by provisioning
/// tooling after bulk inserts.
pub async fn refresh_seeded_counts<C: ConnectionTrait>(db: &C) -> Result<(), ServiceError> {
    let ids: Vec<Uuid> = location::Entity::find()
        .select_only()
        .column(location::Column::Id)
        .into_tuple()
        .all(db)
        .await?;
    for id in ids {
        refresh_available_count(db, id).await?;
    }
    Ok(())
}

fn parse_category(raw: &str) -> Result<LocationCategory, ServiceError> {
    LocationCategory::from_str(raw).map_err(|_| {
        ServiceError::ValidationError(format!(
            "Invalid location type '{}'; expected one of mall, hospital, theatre, airport, stadium, other",
            raw
        ))
    })
}

/// Registry of parking sites.
#[derive(Clone)]
pub struct LocationService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl LocationService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// List locations sorted by name, with optional category filter and
    /// case-insensitive name/address search.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        query: ListLocationsQuery,
    ) -> Result<Vec<location::Model>, ServiceError> {
        let db = &*self.db_pool;

        let mut finder = location::Entity::find();

        if let Some(raw) = query.category.as_deref() {
            let category = parse_category(raw)?;
            finder = finder.filter(location::Column::Category.eq(category.as_str()));
        }

        if let Some(term) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", term.trim().to_lowercase());
            finder = finder.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            location::Entity,
                            location::Column::Name,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            location::Entity,
                            location::Column::Address,
                        ))))
                        .like(pattern),
                    ),
            );
        }

        let locations = finder
            .order_by_asc(location::Column::Name)
            .all(db)
            .await?;

        Ok(locations)
    }

    /// Location detail with its slots and a live availability recount.
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<LocationDetailResponse, ServiceError> {
        let db = &*self.db_pool;

        let location = location::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Location not found".to_string()))?;

        let slots = slot::Entity::find()
            .filter(slot::Column::LocationId.eq(id))
            .order_by_asc(slot::Column::SlotNumber)
            .all(db)
            .await?;

        let actual_available_slots = slots.iter().filter(|s| s.is_available).count() as i64;

        Ok(LocationDetailResponse {
            location,
            slots,
            actual_available_slots,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        request: CreateLocationRequest,
    ) -> Result<location::Model, ServiceError> {
        request.validate()?;

        let (name, address, coordinates, total_slots, floors, raw_category) = match (
            request.name,
            request.address,
            request.coordinates,
            request.total_slots,
            request.floors,
            request.category,
        ) {
            (
                Some(name),
                Some(address),
                Some(coordinates),
                Some(total_slots),
                Some(floors),
                Some(category),
            ) => (name, address, coordinates, total_slots, floors, category),
            _ => {
                return Err(ServiceError::ValidationError(
                    "Please provide all required fields: name, address, coordinates, total_slots, floors, type"
                        .to_string(),
                ))
            }
        };

        let category = parse_category(&raw_category)?;
        let prices = request.price_per_hour.unwrap_or_default();

        let model = location::ActiveModel {
            name: Set(name),
            address: Set(address),
            latitude: Set(coordinates.latitude),
            longitude: Set(coordinates.longitude),
            total_slots: Set(total_slots),
            available_slots: Set(total_slots),
            floors: Set(floors),
            category: Set(category.as_str().to_string()),
            price_per_hour_car: Set(prices.car),
            price_per_hour_bike: Set(prices.bike),
            open_time: Set(request.open_time.unwrap_or_else(|| "00:00".to_string())),
            close_time: Set(request.close_time.unwrap_or_else(|| "23:59".to_string())),
            ..Default::default()
        };

        let created = model.insert(&*self.db_pool).await?;
        info!(location_id = %created.id, "location created");

        if let Some(events) = &self.event_sender {
            let _ = events.send(Event::LocationCreated(created.id)).await;
        }

        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateLocationRequest,
    ) -> Result<location::Model, ServiceError> {
        let db = &*self.db_pool;

        let location = location::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Location not found".to_string()))?;

        let mut active: location::ActiveModel = location.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(address) = request.address {
            active.address = Set(address);
        }
        if let Some(coordinates) = request.coordinates {
            active.latitude = Set(coordinates.latitude);
            active.longitude = Set(coordinates.longitude);
        }
        if let Some(total_slots) = request.total_slots {
            active.total_slots = Set(total_slots);
        }
        if let Some(floors) = request.floors {
            active.floors = Set(floors);
        }
        if let Some(raw) = request.category {
            active.category = Set(parse_category(&raw)?.as_str().to_string());
        }
        if let Some(prices) = request.price_per_hour {
            active.price_per_hour_car = Set(prices.car);
            active.price_per_hour_bike = Set(prices.bike);
        }
        if let Some(open_time) = request.open_time {
            active.open_time = Set(open_time);
        }
        if let Some(close_time) = request.close_time {
            active.close_time = Set(close_time);
        }

        let updated = active.update(db).await?;
        Ok(updated)
    }

    /// Delete a location and, first, every slot it owns.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let location = location::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Location not found".to_string()))?;

        let txn = db.begin().await?;
        slot::Entity::delete_many()
            .filter(slot::Column::LocationId.eq(id))
            .exec(&txn)
            .await?;
        location::Entity::delete_by_id(location.id).exec(&txn).await?;
        txn.commit().await?;

        info!(location_id = %id, "location deleted with its slots");

        if let Some(events) = &self.event_sender {
            let _ = events.send(Event::LocationDeleted(id)).await;
        }

        Ok(())
    }

    /// Locations within `radius` km of the query point (haversine, boundary
    /// inclusive), nearest first.
    #[instrument(skip(self))]
    pub async fn nearby(
        &self,
        query: NearbyQuery,
    ) -> Result<Vec<NearbyLocationResponse>, ServiceError> {
        let (lat, long) = match (query.lat, query.long) {
            (Some(lat), Some(long)) => (lat, long),
            _ => {
                return Err(ServiceError::ValidationError(
                    "Please provide latitude and longitude".to_string(),
                ))
            }
        };
        let radius = query.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);

        let db = &*self.db_pool;
        let locations = location::Entity::find().all(db).await?;

        let mut nearby: Vec<NearbyLocationResponse> = locations
            .into_iter()
            .filter_map(|location| {
                let distance_km =
                    geo::haversine_km(lat, long, location.latitude, location.longitude);
                (distance_km <= radius).then_some(NearbyLocationResponse {
                    location,
                    distance_km,
                })
            })
            .collect();

        nearby.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(nearby)
    }
}
