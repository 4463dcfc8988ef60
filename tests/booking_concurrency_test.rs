mod common;

use chrono::{Duration, Utc};

use common::{location_available_count, seed_location, seed_slot, seed_user, setup, slot_by_id, SlotSpec};
use parkwise_api::errors::ServiceError;
use parkwise_api::services::bookings::CreateBookingRequest;

// N concurrent creation attempts on one slot: exactly one wins, the rest
// fail with Conflict, and the location counter drops by exactly 1.
#[tokio::test]
async fn concurrent_bookings_for_one_slot_yield_a_single_winner() {
    let app = setup(true).await;
    let location = seed_location(&app, "City Mall Parking").await;
    let slot = seed_slot(&app, location.id, SlotSpec::car("A1", "A", 1)).await;
    // A second slot keeps the expected counter value nonzero
    seed_slot(&app, location.id, SlotSpec::car("A2", "A", 2)).await;
    assert_eq!(location_available_count(&app, location.id).await, 2);

    const RACERS: usize = 8;
    let mut users = Vec::with_capacity(RACERS);
    for i in 0..RACERS {
        users.push(seed_user(&app, &format!("racer{}@example.com", i)).await);
    }

    let mut tasks = Vec::with_capacity(RACERS);
    for user in users {
        let bookings = app.services.bookings.clone();
        let location_id = location.id;
        let slot_id = slot.id;
        tasks.push(tokio::spawn(async move {
            bookings
                .create(
                    user.id,
                    CreateBookingRequest {
                        location_id: Some(location_id),
                        slot_id: Some(slot_id),
                        vehicle_type: Some("car".to_string()),
                        vehicle_number: Some("KA01AB1234".to_string()),
                        start_time: Some(Utc::now() + Duration::hours(1)),
                        duration: Some(1),
                        payment_method: None,
                        idempotency_key: None,
                    },
                )
                .await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.expect("task join") {
            Ok(_) => successes += 1,
            Err(ServiceError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(successes, 1, "exactly one booking may hold the slot");
    assert_eq!(conflicts, RACERS - 1);

    assert!(!slot_by_id(&app, slot.id).await.is_available);
    assert_eq!(
        location_available_count(&app, location.id).await,
        1,
        "counter decremented exactly once"
    );
}
