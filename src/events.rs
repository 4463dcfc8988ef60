use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Domain events emitted after state changes commit. Consumers are
/// best-effort; a full channel never blocks the request path outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    UserRegistered(Uuid),

    LocationCreated(Uuid),
    LocationDeleted(Uuid),

    SlotCreated(Uuid),
    SlotsBulkCreated {
        location_id: Uuid,
        count: usize,
    },
    SlotAvailabilityChanged {
        slot_id: Uuid,
        is_available: bool,
    },

    BookingCreated {
        booking_id: Uuid,
        slot_id: Uuid,
        location_id: Uuid,
    },
    BookingCancelled(Uuid),
    BookingCheckedIn(Uuid),
    BookingCheckedOut(Uuid),
    BookingExpired(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. Integrations (webhooks,
/// notifications) hook in here.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        debug!(?event, "processing event");
        match &event {
            Event::BookingCreated {
                booking_id,
                slot_id,
                location_id,
            } => {
                info!(%booking_id, %slot_id, %location_id, "booking created");
            }
            Event::BookingCancelled(id) => info!(booking_id = %id, "booking cancelled"),
            Event::BookingCheckedIn(id) => info!(booking_id = %id, "booking checked in"),
            Event::BookingCheckedOut(id) => info!(booking_id = %id, "booking checked out"),
            Event::BookingExpired(id) => info!(booking_id = %id, "booking expired"),
            other => debug!(?other, "event observed"),
        }
    }
    info!("Event processor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        let id = Uuid::new_v4();
        sender.send(Event::BookingCancelled(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::BookingCancelled(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender
            .send(Event::BookingExpired(Uuid::new_v4()))
            .await
            .is_err());
    }
}
