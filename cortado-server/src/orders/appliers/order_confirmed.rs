//! OrderConfirmed event applier

use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

use crate::orders::traits::EventApplier;

pub struct OrderConfirmedApplier;

impl EventApplier for OrderConfirmedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderConfirmed {} = &event.payload {
            snapshot.status = OrderStatus::Confirmed;
            snapshot.confirmed_at = Some(event.timestamp);

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
