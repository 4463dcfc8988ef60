//! Shared harness: in-memory SQLite, migrations, and service wiring with a
//! deterministic payment gateway.

#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use parkwise_api::auth::{AuthConfig, AuthService};
use parkwise_api::db::{self, DbPool};
use parkwise_api::entities::{location, slot, user, PaymentMethod, VehicleType};
use parkwise_api::errors::ServiceError;
use parkwise_api::events::{process_events, EventSender};
use parkwise_api::handlers::AppServices;
use parkwise_api::services::payment::{PaymentGateway, PaymentReceipt};

/// Test double for the gateway: fixed verdict, counts attempts.
pub struct RecordingGateway {
    approve: bool,
    charges: AtomicUsize,
}

impl RecordingGateway {
    pub fn approving() -> Arc<Self> {
        Arc::new(Self {
            approve: true,
            charges: AtomicUsize::new(0),
        })
    }

    pub fn declining() -> Arc<Self> {
        Arc::new(Self {
            approve: false,
            charges: AtomicUsize::new(0),
        })
    }

    pub fn charge_attempts(&self) -> usize {
        self.charges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn charge(
        &self,
        _amount: Decimal,
        _method: PaymentMethod,
    ) -> Result<PaymentReceipt, ServiceError> {
        let attempt = self.charges.fetch_add(1, Ordering::SeqCst);
        if self.approve {
            Ok(PaymentReceipt {
                transaction_id: format!("TXN-TEST-{}", attempt),
            })
        } else {
            Err(ServiceError::PaymentFailed("Payment failed".to_string()))
        }
    }
}

pub struct TestApp {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    pub gateway: Arc<RecordingGateway>,
}

/// Fresh in-memory database with migrations applied and services wired to
/// the given gateway verdict.
pub async fn setup(approve_payments: bool) -> TestApp {
    let pool = db::establish_connection("sqlite::memory:")
        .await
        .expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    let db = Arc::new(pool);

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(process_events(rx));
    let event_sender = Arc::new(EventSender::new(tx));

    let auth = Arc::new(AuthService::new(AuthConfig::new(
        "test_secret_key_for_integration_tests_0123456789".to_string(),
        Duration::from_secs(3600),
    )));

    let gateway = if approve_payments {
        RecordingGateway::approving()
    } else {
        RecordingGateway::declining()
    };

    let services = AppServices::new(db.clone(), event_sender, auth, gateway.clone());

    TestApp {
        db,
        services,
        gateway,
    }
}

pub async fn seed_user(app: &TestApp, email: &str) -> user::Model {
    user::ActiveModel {
        name: Set("Test User".to_string()),
        email: Set(email.to_string()),
        password_hash: Set("unused".to_string()),
        phone: Set("9876543210".to_string()),
        current_latitude: Set(None),
        current_longitude: Set(None),
        vehicle: Set(None),
        ..Default::default()
    }
    .insert(&*app.db)
    .await
    .expect("seed user")
}

pub async fn seed_location(app: &TestApp, name: &str) -> location::Model {
    location::ActiveModel {
        name: Set(name.to_string()),
        address: Set("123 Main Street, Downtown".to_string()),
        latitude: Set(12.9716),
        longitude: Set(77.5946),
        total_slots: Set(10),
        available_slots: Set(0),
        floors: Set(2),
        category: Set("mall".to_string()),
        price_per_hour_car: Set(Decimal::from(50)),
        price_per_hour_bike: Set(Decimal::from(20)),
        open_time: Set("00:00".to_string()),
        close_time: Set("23:59".to_string()),
        ..Default::default()
    }
    .insert(&*app.db)
    .await
    .expect("seed location")
}

pub struct SlotSpec {
    pub number: String,
    pub floor: String,
    pub row: String,
    pub position: i32,
    pub vehicle_type: VehicleType,
    pub available: bool,
}

impl SlotSpec {
    pub fn car(number: &str, row: &str, position: i32) -> Self {
        Self {
            number: number.to_string(),
            floor: "Ground".to_string(),
            row: row.to_string(),
            position,
            vehicle_type: VehicleType::Car,
            available: true,
        }
    }

    pub fn on_floor(mut self, floor: &str) -> Self {
        self.floor = floor.to_string();
        self
    }

    pub fn bike(mut self) -> Self {
        self.vehicle_type = VehicleType::Bike;
        self
    }
}

pub async fn seed_slot(app: &TestApp, location_id: Uuid, spec: SlotSpec) -> slot::Model {
    let price = match spec.vehicle_type {
        VehicleType::Car => Decimal::from(50),
        VehicleType::Bike => Decimal::from(20),
    };
    let created = slot::ActiveModel {
        location_id: Set(location_id),
        slot_number: Set(spec.number),
        floor: Set(spec.floor),
        row: Set(spec.row),
        position: Set(spec.position),
        vehicle_type: Set(spec.vehicle_type.as_str().to_string()),
        price_per_hour: Set(price),
        is_available: Set(spec.available),
        is_premium: Set(false),
        is_handicapped: Set(false),
        is_near_entrance: Set(false),
        is_near_exit: Set(false),
        is_near_lift: Set(false),
        ..Default::default()
    }
    .insert(&*app.db)
    .await
    .expect("seed slot");

    refresh_counts(app, location_id).await;
    created
}

/// Re-derive a location's availability counter after direct seeding.
pub async fn refresh_counts(app: &TestApp, location_id: Uuid) {
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
    use sea_orm::sea_query::Expr;

    let available = slot::Entity::find()
        .filter(slot::Column::LocationId.eq(location_id))
        .filter(slot::Column::IsAvailable.eq(true))
        .count(&*app.db)
        .await
        .expect("count slots") as i32;

    location::Entity::update_many()
        .col_expr(location::Column::AvailableSlots, Expr::value(available))
        .filter(location::Column::Id.eq(location_id))
        .exec(&*app.db)
        .await
        .expect("update counter");
}

pub async fn location_available_count(app: &TestApp, location_id: Uuid) -> i32 {
    use sea_orm::EntityTrait;

    location::Entity::find_by_id(location_id)
        .one(&*app.db)
        .await
        .expect("load location")
        .expect("location exists")
        .available_slots
}

pub async fn slot_by_id(app: &TestApp, slot_id: Uuid) -> slot::Model {
    use sea_orm::EntityTrait;

    slot::Entity::find_by_id(slot_id)
        .one(&*app.db)
        .await
        .expect("load slot")
        .expect("slot exists")
}
