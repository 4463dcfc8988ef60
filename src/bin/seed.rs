//! Provision demo locations and slot layouts.
//!
//! ```text
//! cargo run --bin seed -- --database-url sqlite://parkwise.db?mode=rwc --wipe
//! ```

use clap::Parser;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use parkwise_api::db;
use parkwise_api::entities::{location, slot, VehicleType};
use parkwise_api::services::locations::refresh_seeded_counts;

#[derive(Parser, Debug)]
#[command(name = "seed", about = "Seed demo parking locations and slots")]
struct Args {
    /// Database to seed
    #[arg(long, default_value = "sqlite://parkwise.db?mode=rwc")]
    database_url: String,

    /// Delete existing locations and slots first
    #[arg(long)]
    wipe: bool,

    /// Slots per row in the generated layouts
    #[arg(long, default_value_t = 10)]
    slots_per_row: i32,
}

struct SeedLocation {
    name: &'static str,
    address: &'static str,
    latitude: f64,
    longitude: f64,
    total_slots: i32,
    floors: i32,
    category: &'static str,
    car_price: u32,
    bike_price: u32,
}

const SEED_LOCATIONS: &[SeedLocation] = &[
    SeedLocation {
        name: "City Mall Parking",
        address: "123 Main Street, Downtown",
        latitude: 12.9716,
        longitude: 77.5946,
        total_slots: 100,
        floors: 3,
        category: "mall",
        car_price: 60,
        bike_price: 25,
    },
    SeedLocation {
        name: "Central Hospital Parking",
        address: "456 Health Avenue, Medical District",
        latitude: 12.9655,
        longitude: 77.5928,
        total_slots: 80,
        floors: 2,
        category: "hospital",
        car_price: 40,
        bike_price: 15,
    },
    SeedLocation {
        name: "Grand Cinema Complex",
        address: "789 Entertainment Road, Cinema District",
        latitude: 12.9756,
        longitude: 77.59,
        total_slots: 120,
        floors: 4,
        category: "theatre",
        car_price: 70,
        bike_price: 30,
    },
    SeedLocation {
        name: "Airport Premium Parking",
        address: "1000 Airport Road, Aviation Area",
        latitude: 12.98,
        longitude: 77.585,
        total_slots: 200,
        floors: 5,
        category: "airport",
        car_price: 100,
        bike_price: 50,
    },
    SeedLocation {
        name: "Sports Stadium Parking",
        address: "2000 Sports Boulevard, Recreation Zone",
        latitude: 12.96,
        longitude: 77.6,
        total_slots: 150,
        floors: 3,
        category: "stadium",
        car_price: 80,
        bike_price: 35,
    },
];

const ROW_LABELS: &[&str] = &["A", "B", "C", "D", "E", "F", "G", "H"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    parkwise_api::config::init_tracing("info", false);
    let args = Args::parse();

    let pool = db::establish_connection(&args.database_url).await?;
    db::run_migrations(&pool).await?;
    let pool = Arc::new(pool);

    if args.wipe {
        slot::Entity::delete_many().exec(&*pool).await?;
        location::Entity::delete_many().exec(&*pool).await?;
        info!("cleared existing locations and slots");
    }

    for seed in SEED_LOCATIONS {
        let created = location::ActiveModel {
            name: Set(seed.name.to_string()),
            address: Set(seed.address.to_string()),
            latitude: Set(seed.latitude),
            longitude: Set(seed.longitude),
            total_slots: Set(seed.total_slots),
            available_slots: Set(seed.total_slots),
            floors: Set(seed.floors),
            category: Set(seed.category.to_string()),
            price_per_hour_car: Set(Decimal::from(seed.car_price)),
            price_per_hour_bike: Set(Decimal::from(seed.bike_price)),
            open_time: Set("00:00".to_string()),
            close_time: Set("23:59".to_string()),
            ..Default::default()
        }
        .insert(&*pool)
        .await?;

        let slots = layout_slots(&created, seed, args.slots_per_row);
        let count = slots.len();
        if !slots.is_empty() {
            slot::Entity::insert_many(slots).exec(&*pool).await?;
        }
        info!(location = seed.name, slots = count, "seeded location");
    }

    refresh_seeded_counts(&*pool).await?;
    info!("seeding complete");
    Ok(())
}

/// Lay out a location's slots across floors and rows: bikes fill the first
/// row of each floor, handicapped spaces sit at row starts, and the last row
/// is flagged near the lift.
fn layout_slots(
    created: &location::Model,
    seed: &SeedLocation,
    slots_per_row: i32,
) -> Vec<slot::ActiveModel> {
    let per_floor = seed.total_slots / seed.floors;
    let rows_per_floor =
        ((per_floor + slots_per_row - 1) / slots_per_row).min(ROW_LABELS.len() as i32);

    let mut slots = Vec::new();
    let now = chrono::Utc::now();

    for floor_num in 1..=seed.floors {
        let floor = format!("Floor {}", floor_num);
        let mut remaining = per_floor;

        for row_index in 0..rows_per_floor {
            let row = ROW_LABELS[row_index as usize];
            let in_this_row = remaining.min(slots_per_row);

            for position in 1..=in_this_row {
                let is_bike_row = row_index == 0;
                let vehicle_type = if is_bike_row {
                    VehicleType::Bike
                } else {
                    VehicleType::Car
                };
                let price = if is_bike_row {
                    Decimal::from(seed.bike_price)
                } else {
                    Decimal::from(seed.car_price)
                };

                slots.push(slot::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    location_id: Set(created.id),
                    slot_number: Set(format!("F{}-{}{}", floor_num, row, position)),
                    floor: Set(floor.clone()),
                    row: Set(row.to_string()),
                    position: Set(position),
                    vehicle_type: Set(vehicle_type.as_str().to_string()),
                    price_per_hour: Set(price),
                    is_available: Set(true),
                    is_premium: Set(floor_num == 1 && row_index == 1),
                    is_handicapped: Set(position == 1 && row_index == 1),
                    is_near_entrance: Set(row_index == 0),
                    is_near_exit: Set(row_index == rows_per_floor - 1),
                    is_near_lift: Set(row_index == rows_per_floor - 1),
                    created_at: Set(now),
                    updated_at: Set(None),
                });
            }
            remaining -= in_this_row;
        }
    }

    slots
}
