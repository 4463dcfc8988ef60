mod common;

use chrono::{Duration, Utc};

use common::{location_available_count, seed_location, seed_slot, seed_user, setup, slot_by_id, SlotSpec};
use parkwise_api::services::bookings::CreateBookingRequest;

// The background sweep completes active bookings whose end time has passed
// without a checkout, and returns their slots to the pool.
#[tokio::test]
async fn sweep_completes_overdue_bookings_and_releases_slots() {
    let app = setup(true).await;
    let user = seed_user(&app, "driver@example.com").await;
    let location = seed_location(&app, "City Mall Parking").await;
    let overdue_slot = seed_slot(&app, location.id, SlotSpec::car("A1", "A", 1)).await;
    let current_slot = seed_slot(&app, location.id, SlotSpec::car("A2", "A", 2)).await;

    // One booking whose window is already over, one still running
    let overdue = app
        .services
        .bookings
        .create(
            user.id,
            CreateBookingRequest {
                location_id: Some(location.id),
                slot_id: Some(overdue_slot.id),
                vehicle_type: Some("car".to_string()),
                vehicle_number: Some("KA01AB1234".to_string()),
                start_time: Some(Utc::now() - Duration::hours(3)),
                duration: Some(1),
                payment_method: None,
                idempotency_key: None,
            },
        )
        .await
        .unwrap();
    let current = app
        .services
        .bookings
        .create(
            user.id,
            CreateBookingRequest {
                location_id: Some(location.id),
                slot_id: Some(current_slot.id),
                vehicle_type: Some("car".to_string()),
                vehicle_number: Some("KA01AB1234".to_string()),
                start_time: Some(Utc::now()),
                duration: Some(4),
                payment_method: None,
                idempotency_key: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(location_available_count(&app, location.id).await, 0);

    let expired = app.services.bookings.expire_overdue().await.unwrap();
    assert_eq!(expired, 1);

    let swept = app.services.bookings.get(user.id, overdue.id).await.unwrap();
    assert_eq!(swept.status, "completed");
    assert!(swept.check_out_time.is_none(), "no synthetic checkout time");
    assert!(slot_by_id(&app, overdue_slot.id).await.is_available);

    let running = app.services.bookings.get(user.id, current.id).await.unwrap();
    assert_eq!(running.status, "active");
    assert!(!slot_by_id(&app, current_slot.id).await.is_available);

    assert_eq!(location_available_count(&app, location.id).await, 1);

    // A second sweep finds nothing new
    assert_eq!(app.services.bookings.expire_overdue().await.unwrap(), 0);
}
