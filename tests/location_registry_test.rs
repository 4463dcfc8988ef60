mod common;

use rust_decimal::Decimal;
use uuid::Uuid;

use common::{seed_location, seed_slot, setup, SlotSpec};
use parkwise_api::errors::ServiceError;
use parkwise_api::services::geo::Coordinates;
use parkwise_api::services::locations::{
    CreateLocationRequest, ListLocationsQuery, NearbyQuery, PriceSchedule, UpdateLocationRequest,
};

fn create_request(name: &str, category: &str, lat: f64, long: f64) -> CreateLocationRequest {
    CreateLocationRequest {
        name: Some(name.to_string()),
        address: Some("123 Main Street, Downtown".to_string()),
        coordinates: Some(Coordinates {
            latitude: lat,
            longitude: long,
        }),
        total_slots: Some(50),
        floors: Some(2),
        category: Some(category.to_string()),
        price_per_hour: None,
        open_time: None,
        close_time: None,
    }
}

#[tokio::test]
async fn create_applies_defaults() {
    let app = setup(true).await;

    let created = app
        .services
        .locations
        .create(create_request("City Mall Parking", "mall", 12.9716, 77.5946))
        .await
        .unwrap();

    assert_eq!(created.available_slots, created.total_slots);
    assert_eq!(created.price_per_hour_car, Decimal::from(50));
    assert_eq!(created.price_per_hour_bike, Decimal::from(20));
    assert_eq!(created.open_time, "00:00");
    assert_eq!(created.close_time, "23:59");

    // Explicit prices are kept
    let mut priced = create_request("Airport Premium Parking", "airport", 12.98, 77.585);
    priced.price_per_hour = Some(PriceSchedule {
        car: Decimal::from(100),
        bike: Decimal::from(50),
    });
    let created = app.services.locations.create(priced).await.unwrap();
    assert_eq!(created.price_per_hour_car, Decimal::from(100));
}

#[tokio::test]
async fn create_rejects_missing_fields_and_bad_category() {
    let app = setup(true).await;

    let mut missing = create_request("City Mall Parking", "mall", 12.9716, 77.5946);
    missing.coordinates = None;
    let err = app.services.locations.create(missing).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = app
        .services
        .locations
        .create(create_request("Side Street Garage", "garage", 12.9716, 77.5946))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn list_filters_by_category_and_search_is_case_insensitive() {
    let app = setup(true).await;
    for (name, category) in [
        ("City Mall Parking", "mall"),
        ("Central Hospital Parking", "hospital"),
        ("Grand Cinema Complex", "theatre"),
    ] {
        app.services
            .locations
            .create(create_request(name, category, 12.9716, 77.5946))
            .await
            .unwrap();
    }

    let all = app
        .services
        .locations
        .list(ListLocationsQuery {
            category: None,
            search: None,
        })
        .await
        .unwrap();
    let names: Vec<&str> = all.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Central Hospital Parking",
            "City Mall Parking",
            "Grand Cinema Complex"
        ],
        "sorted by name"
    );

    let malls = app
        .services
        .locations
        .list(ListLocationsQuery {
            category: Some("mall".to_string()),
            search: None,
        })
        .await
        .unwrap();
    assert_eq!(malls.len(), 1);
    assert_eq!(malls[0].name, "City Mall Parking");

    let found = app
        .services
        .locations
        .list(ListLocationsQuery {
            category: None,
            search: Some("HOSPITAL".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Central Hospital Parking");

    // Address text matches too
    let by_address = app
        .services
        .locations
        .list(ListLocationsQuery {
            category: None,
            search: Some("main street".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(by_address.len(), 3);
}

#[tokio::test]
async fn get_returns_live_slot_inventory() {
    let app = setup(true).await;
    let location = seed_location(&app, "City Mall Parking").await;
    seed_slot(&app, location.id, SlotSpec::car("A1", "A", 1)).await;
    let mut booked = SlotSpec::car("A2", "A", 2);
    booked.available = false;
    seed_slot(&app, location.id, booked).await;

    let detail = app.services.locations.get(location.id).await.unwrap();
    assert_eq!(detail.slots.len(), 2);
    assert_eq!(detail.actual_available_slots, 1);

    let err = app.services.locations.get(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn update_patches_fields() {
    let app = setup(true).await;
    let location = seed_location(&app, "City Mall Parking").await;

    let updated = app
        .services
        .locations
        .update(
            location.id,
            UpdateLocationRequest {
                name: Some("City Mall Parking Deck".to_string()),
                address: None,
                coordinates: None,
                total_slots: None,
                floors: Some(4),
                category: Some("other".to_string()),
                price_per_hour: None,
                open_time: Some("06:00".to_string()),
                close_time: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "City Mall Parking Deck");
    assert_eq!(updated.floors, 4);
    assert_eq!(updated.category, "other");
    assert_eq!(updated.open_time, "06:00");
    // Untouched fields survive
    assert_eq!(updated.address, location.address);
}

#[tokio::test]
async fn delete_cascades_to_slots() {
    let app = setup(true).await;
    let location = seed_location(&app, "City Mall Parking").await;
    let slot = seed_slot(&app, location.id, SlotSpec::car("A1", "A", 1)).await;

    app.services.locations.delete(location.id).await.unwrap();

    assert!(matches!(
        app.services.locations.get(location.id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        app.services.slots.get(slot.id).await,
        Err(ServiceError::NotFound(_))
    ));

    let err = app.services.locations.delete(location.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn nearby_includes_boundary_and_excludes_beyond_radius() {
    let app = setup(true).await;
    // Bengaluru and a site ~9.6 km away, plus Chennai ~290 km away
    app.services
        .locations
        .create(create_request("City Mall Parking", "mall", 12.9716, 77.5946))
        .await
        .unwrap();
    app.services
        .locations
        .create(create_request("North Mall Parking", "mall", 13.0580, 77.5946))
        .await
        .unwrap();
    app.services
        .locations
        .create(create_request("Chennai Central Parking", "other", 13.0827, 80.2707))
        .await
        .unwrap();

    // Radius 0 at the exact coordinates includes the location (distance 0 <= 0)
    let exact = app
        .services
        .locations
        .nearby(NearbyQuery {
            lat: Some(12.9716),
            long: Some(77.5946),
            radius: Some(0.0),
        })
        .await
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].location.name, "City Mall Parking");
    assert_eq!(exact[0].distance_km, 0.0);

    // Default 10 km radius picks up the northern site, nearest first
    let nearby = app
        .services
        .locations
        .nearby(NearbyQuery {
            lat: Some(12.9716),
            long: Some(77.5946),
            radius: None,
        })
        .await
        .unwrap();
    let names: Vec<&str> = nearby.iter().map(|n| n.location.name.as_str()).collect();
    assert_eq!(names, vec!["City Mall Parking", "North Mall Parking"]);

    // A radius smaller than the true distance excludes it
    let tight = app
        .services
        .locations
        .nearby(NearbyQuery {
            lat: Some(12.9716),
            long: Some(77.5946),
            radius: Some(5.0),
        })
        .await
        .unwrap();
    assert_eq!(tight.len(), 1);

    // Coordinates are required
    let err = app
        .services
        .locations
        .nearby(NearbyQuery {
            lat: Some(12.9716),
            long: None,
            radius: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
