mod common;

use rust_decimal::Decimal;
use uuid::Uuid;

use common::{location_available_count, seed_location, seed_slot, setup, SlotSpec};
use parkwise_api::errors::ServiceError;
use parkwise_api::services::slots::{
    BulkCreateSlotsRequest, CreateSlotRequest, SetSlotStatusRequest, SlotFilterQuery,
};

fn no_filters() -> SlotFilterQuery {
    SlotFilterQuery {
        vehicle_type: None,
        available: None,
        floor: None,
    }
}

#[tokio::test]
async fn listing_sorts_by_slot_number_and_honors_filters() {
    let app = setup(true).await;
    let location = seed_location(&app, "City Mall Parking").await;
    seed_slot(&app, location.id, SlotSpec::car("A3", "A", 3)).await;
    seed_slot(&app, location.id, SlotSpec::car("A1", "A", 1)).await;
    let mut booked = SlotSpec::car("A2", "A", 2);
    booked.available = false;
    seed_slot(&app, location.id, booked).await;
    seed_slot(&app, location.id, SlotSpec::car("B1", "B", 1).bike()).await;

    let all = app
        .services
        .slots
        .list_by_location(location.id, no_filters())
        .await
        .unwrap();
    let numbers: Vec<&str> = all.iter().map(|s| s.slot_number.as_str()).collect();
    assert_eq!(numbers, vec!["A1", "A2", "A3", "B1"]);

    let available = app
        .services
        .slots
        .list_available(location.id, no_filters())
        .await
        .unwrap();
    assert!(available.iter().all(|s| s.is_available));
    assert_eq!(available.len(), 3);

    let bikes = app
        .services
        .slots
        .list_by_location(
            location.id,
            SlotFilterQuery {
                vehicle_type: Some("bike".to_string()),
                available: None,
                floor: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(bikes.len(), 1);
    assert_eq!(bikes[0].slot_number, "B1");

    let err = app
        .services
        .slots
        .list_by_location(
            location.id,
            SlotFilterQuery {
                vehicle_type: Some("truck".to_string()),
                available: None,
                floor: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn floors_are_distinct_and_sorted() {
    let app = setup(true).await;
    let location = seed_location(&app, "City Mall Parking").await;
    seed_slot(&app, location.id, SlotSpec::car("G1", "A", 1).on_floor("Ground")).await;
    seed_slot(&app, location.id, SlotSpec::car("F1-1", "A", 1).on_floor("Floor 1")).await;
    seed_slot(&app, location.id, SlotSpec::car("F1-2", "A", 2).on_floor("Floor 1")).await;

    let floors = app.services.slots.floors(location.id).await.unwrap();
    assert_eq!(floors, vec!["Floor 1".to_string(), "Ground".to_string()]);
}

#[tokio::test]
async fn floor_layout_groups_rows_and_computes_stats() {
    let app = setup(true).await;
    let location = seed_location(&app, "City Mall Parking").await;

    // Deliberately out of order; layout must sort rows lexicographically and
    // positions ascending within a row
    seed_slot(&app, location.id, SlotSpec::car("B2", "B", 2).on_floor("Ground")).await;
    seed_slot(&app, location.id, SlotSpec::car("B1", "B", 1).on_floor("Ground")).await;
    let first_slot = seed_slot(&app, location.id, SlotSpec::car("A1", "A", 1)).await;
    seed_slot(&app, location.id, SlotSpec::car("A2", "A", 2).on_floor("Ground").bike()).await;
    // Different floor stays out of the layout
    seed_slot(&app, location.id, SlotSpec::car("F1-1", "A", 1).on_floor("Floor 1")).await;

    // Book one slot through the service so the stats see it
    app.services
        .slots
        .set_availability(
            first_slot.id,
            SetSlotStatusRequest {
                is_available: Some(false),
            },
        )
        .await
        .unwrap();

    let layout = app
        .services
        .slots
        .floor_layout(location.id, "Ground")
        .await
        .unwrap();

    assert_eq!(layout.floor, "Ground");
    assert_eq!(layout.rows, vec!["A".to_string(), "B".to_string()]);

    let row_a: Vec<&str> = layout.slots_by_row["A"]
        .iter()
        .map(|s| s.slot_number.as_str())
        .collect();
    assert_eq!(row_a, vec!["A1", "A2"]);
    let row_b: Vec<&str> = layout.slots_by_row["B"]
        .iter()
        .map(|s| s.slot_number.as_str())
        .collect();
    assert_eq!(row_b, vec!["B1", "B2"]);

    assert_eq!(layout.stats.total, 4);
    assert_eq!(layout.stats.available, 3);
    assert_eq!(layout.stats.booked, 1);
    assert_eq!(layout.stats.car_slots, 3);
    assert_eq!(layout.stats.bike_slots, 1);
}

#[tokio::test]
async fn empty_floor_layout_is_not_found() {
    let app = setup(true).await;
    let location = seed_location(&app, "City Mall Parking").await;
    seed_slot(&app, location.id, SlotSpec::car("G1", "A", 1).on_floor("Ground")).await;

    let err = app
        .services
        .slots
        .floor_layout(location.id, "Roof")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn create_slot_validates_location_and_uniqueness() {
    let app = setup(true).await;
    let location = seed_location(&app, "City Mall Parking").await;

    let request = |number: &str| CreateSlotRequest {
        location_id: Some(location.id),
        slot_number: Some(number.to_string()),
        vehicle_type: Some("car".to_string()),
        price_per_hour: Some(Decimal::from(50)),
        floor: None,
        row: Some("A".to_string()),
        position: Some(1),
        is_premium: false,
        is_handicapped: false,
        is_near_entrance: false,
        is_near_exit: false,
        is_near_lift: false,
    };

    let created = app.services.slots.create(request("A1")).await.unwrap();
    assert_eq!(created.floor, "Ground", "floor defaults to Ground");
    assert!(created.is_available);
    assert_eq!(location_available_count(&app, location.id).await, 1);

    // Duplicate number at the same location conflicts
    let err = app.services.slots.create(request("A1")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // Unknown location is NotFound
    let mut orphan = request("Z1");
    orphan.location_id = Some(Uuid::new_v4());
    let err = app.services.slots.create(orphan).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    // Missing required fields fail validation
    let mut incomplete = request("Z2");
    incomplete.row = None;
    let err = app.services.slots.create(incomplete).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn bulk_create_generates_range_and_rejects_collisions() {
    let app = setup(true).await;
    let location = seed_location(&app, "City Mall Parking").await;

    let request = BulkCreateSlotsRequest {
        location_id: Some(location.id),
        slot_prefix: Some("A".to_string()),
        start_number: Some(1),
        end_number: Some(5),
        vehicle_type: Some("car".to_string()),
        price_per_hour: Some(Decimal::from(50)),
        floor: Some("Ground".to_string()),
        row: Some("A".to_string()),
        is_premium: false,
        is_handicapped: false,
        is_near_entrance: true,
        is_near_exit: false,
        is_near_lift: false,
    };

    let created = app.services.slots.bulk_create(request).await.unwrap();
    assert_eq!(created.len(), 5);
    assert_eq!(created[0].slot_number, "A1");
    assert_eq!(created[4].slot_number, "A5");
    // Position carries the range integer
    assert_eq!(created[2].position, 3);
    assert!(created.iter().all(|s| s.is_near_entrance));
    assert_eq!(location_available_count(&app, location.id).await, 5);

    // Overlapping range is rejected whole; nothing inserted
    let overlap = BulkCreateSlotsRequest {
        location_id: Some(location.id),
        slot_prefix: Some("A".to_string()),
        start_number: Some(4),
        end_number: Some(8),
        vehicle_type: Some("car".to_string()),
        price_per_hour: Some(Decimal::from(50)),
        floor: Some("Ground".to_string()),
        row: Some("A".to_string()),
        is_premium: false,
        is_handicapped: false,
        is_near_entrance: false,
        is_near_exit: false,
        is_near_lift: false,
    };
    let err = app.services.slots.bulk_create(overlap).await.unwrap_err();
    match err {
        ServiceError::Conflict(message) => {
            assert!(message.contains("A4"), "{}", message);
            assert!(message.contains("A5"), "{}", message);
        }
        other => panic!("expected Conflict, got {:?}", other),
    }
    assert_eq!(location_available_count(&app, location.id).await, 5);

    // Inverted range fails validation
    let inverted = BulkCreateSlotsRequest {
        location_id: Some(location.id),
        slot_prefix: Some("B".to_string()),
        start_number: Some(9),
        end_number: Some(3),
        vehicle_type: Some("car".to_string()),
        price_per_hour: Some(Decimal::from(50)),
        floor: None,
        row: Some("B".to_string()),
        is_premium: false,
        is_handicapped: false,
        is_near_entrance: false,
        is_near_exit: false,
        is_near_lift: false,
    };
    let err = app.services.slots.bulk_create(inverted).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn availability_toggle_recounts_location() {
    let app = setup(true).await;
    let location = seed_location(&app, "City Mall Parking").await;
    let slot = seed_slot(&app, location.id, SlotSpec::car("A1", "A", 1)).await;
    seed_slot(&app, location.id, SlotSpec::car("A2", "A", 2)).await;
    assert_eq!(location_available_count(&app, location.id).await, 2);

    app.services
        .slots
        .set_availability(
            slot.id,
            SetSlotStatusRequest {
                is_available: Some(false),
            },
        )
        .await
        .unwrap();
    assert_eq!(location_available_count(&app, location.id).await, 1);

    app.services
        .slots
        .set_availability(
            slot.id,
            SetSlotStatusRequest {
                is_available: Some(true),
            },
        )
        .await
        .unwrap();
    assert_eq!(location_available_count(&app, location.id).await, 2);
}

#[tokio::test]
async fn delete_slot_keeps_counter_consistent() {
    let app = setup(true).await;
    let location = seed_location(&app, "City Mall Parking").await;
    let slot = seed_slot(&app, location.id, SlotSpec::car("A1", "A", 1)).await;
    seed_slot(&app, location.id, SlotSpec::car("A2", "A", 2)).await;

    app.services.slots.delete(slot.id).await.unwrap();
    assert_eq!(location_available_count(&app, location.id).await, 1);

    let err = app.services.slots.delete(slot.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
