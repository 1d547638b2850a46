//! OrderReady event applier

use shared::order::{EventPayload, OrderEvent, OrderSnapshot, OrderStatus};

use crate::orders::traits::EventApplier;

pub struct OrderReadyApplier;

impl EventApplier for OrderReadyApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &OrderEvent) {
        if let EventPayload::OrderReady {} = &event.payload {
            snapshot.status = OrderStatus::Ready;
            snapshot.ready_at = Some(event.timestamp);

            snapshot.last_sequence = event.sequence;
            snapshot.updated_at = event.timestamp;
            snapshot.update_checksum();
        }
    }
}
